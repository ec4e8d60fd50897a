//! Error types for the strict parsing API.
//!
//! The front-end itself never fails: it returns a best-effort program plus
//! [`Issue`]s. Callers that want a hard failure on invalid input go through
//! [`ParseResult::into_result`](crate::ParseResult::into_result), which turns
//! error-level issues into an [`Error`].

use thiserror::Error;

use crate::issue::{Issue, count_issues};

/// The main error type for story parsing.
#[derive(Debug, Error)]
pub enum Error {
    /// The source produced error-level issues.
    #[error("invalid story: {errors} error(s), {warnings} warning(s); first: {first}")]
    Invalid {
        /// Number of error-level issues.
        errors: usize,
        /// Number of warning-level issues.
        warnings: usize,
        /// The first error-level issue.
        first: Issue,
    },
}

impl Error {
    /// Builds an [`Error::Invalid`] from a list of issues.
    ///
    /// Returns `None` when the list has no error-level issue.
    #[must_use]
    pub fn from_issues(issues: &[Issue]) -> Option<Self> {
        let first = issues.iter().find(|i| i.is_error())?.clone();
        let (errors, warnings) = count_issues(issues);
        Some(Self::Invalid {
            errors,
            warnings,
            first,
        })
    }

    /// Returns the first error-level issue.
    #[must_use]
    pub const fn first_issue(&self) -> &Issue {
        match self {
            Self::Invalid { first, .. } => first,
        }
    }
}

/// Result type for strict story operations.
pub type Result<T> = std::result::Result<T, Error>;
