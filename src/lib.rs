//! kstory - Story script language front-end
//!
//! This crate re-exports all layers of the kstory system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: kstory_export  — JSON / MessagePack export, `kstory-export` CLI
//! Layer 0: kstory_syntax  — Lexer, recovering parser, validator, issues
//! ```

pub use kstory_export as export;
pub use kstory_syntax as syntax;
