//! Diagnostics shared by the parser and validator.

use std::fmt;

use crate::span::Span;

/// Severity of an [`Issue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IssueKind {
    /// The source is wrong; strict consumers reject it.
    Error,
    /// The source is suspicious but usable.
    Warning,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A non-fatal diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Issue {
    /// Severity.
    pub kind: IssueKind,
    /// Human-readable message.
    pub message: String,
    /// Where the problem is, when known.
    pub span: Option<Span>,
}

impl Issue {
    /// Creates an error-level issue.
    #[must_use]
    pub fn error(message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            kind: IssueKind::Error,
            message: message.into(),
            span,
        }
    }

    /// Creates a warning-level issue.
    #[must_use]
    pub fn warning(message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            kind: IssueKind::Warning,
            message: message.into(),
            span,
        }
    }

    /// Returns true for error-level issues.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == IssueKind::Error
    }

    /// Returns true for warning-level issues.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.kind == IssueKind::Warning
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(
                f,
                "{}:{}: {}: {}",
                span.start.line, span.start.column, self.kind, self.message
            ),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Counts `(errors, warnings)` in a list of issues.
#[must_use]
pub fn count_issues(issues: &[Issue]) -> (usize, usize) {
    count_kinds(issues.iter().map(|issue| issue.kind))
}

/// Counts `(errors, warnings)` over a sequence of severities.
#[must_use]
pub fn count_kinds(kinds: impl IntoIterator<Item = IssueKind>) -> (usize, usize) {
    kinds.into_iter().fold((0, 0), |(e, w), kind| match kind {
        IssueKind::Error => (e + 1, w),
        IssueKind::Warning => (e, w + 1),
    })
}
