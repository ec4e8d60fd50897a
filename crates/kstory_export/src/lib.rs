//! JSON and `MessagePack` export for story scripts.
//!
//! Parses a `.ks` source with [`kstory_syntax`] and writes the result in one
//! of two shapes (see [`document`]). The `kstory-export` binary wraps
//! [`export_file`] with a command-line interface.
//!
//! # Modules
//!
//! - [`options`] - Export format, encoding and strictness
//! - [`document`] - Full and simple document shapes
//! - [`export`] - Encoding to bytes and files
//! - [`error`] - Export errors

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod document;
pub mod error;
pub mod export;
pub mod options;

pub use document::{ExportDocument, FORMAT_VERSION, to_document};
pub use error::{ExportError, Result};
pub use export::{
    ExportSummary, build_document, default_output_path, encode, export_file, export_source,
};
pub use options::{Encoding, ExportFormat, ExportOptions};
