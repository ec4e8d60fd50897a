//! Error types for exporting.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while exporting a story.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Reading the input or writing the output failed.
    #[error("failed to {action} '{}': {source}", .path.display())]
    Io {
        /// What was being attempted ("read", "write").
        action: &'static str,
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding failed.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// `MessagePack` encoding failed.
    #[error("MessagePack encoding failed: {0}")]
    MessagePack(#[from] rmp_serde::encode::Error),

    /// Strict mode rejected a story with error-level issues.
    #[error(transparent)]
    Invalid(#[from] kstory_syntax::Error),
}

impl ExportError {
    /// Creates an I/O error for the given action and path.
    #[must_use]
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
