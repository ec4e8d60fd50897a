//! The exported document model.
//!
//! Two shapes exist. The full shape serializes the syntax tree as-is, spans
//! included, for tools that map back into the source. The simple shape drops
//! every position and folds choice text into a single `choice_text` field,
//! which is what game runtimes consume.

use chrono::{SecondsFormat, Utc};
use kstory_syntax::issue::{count_issues, count_kinds};
use kstory_syntax::{Issue, IssueKind, ParseResult, Section, Segment, Statement, Tag, validate};
use serde::Serialize;

use crate::options::{ExportFormat, ExportOptions};

/// Version of the exported document layout.
pub const FORMAT_VERSION: &str = "1.0.0";

/// An exported story in either shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExportDocument {
    /// Positions kept.
    Full(FullDocument),
    /// Positions stripped.
    Simple(SimpleDocument),
}

impl ExportDocument {
    /// Number of exported sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        match self {
            Self::Full(doc) => doc.sections.len(),
            Self::Simple(doc) => doc.sections.len(),
        }
    }

    /// Counts `(errors, warnings)` in the exported issues.
    #[must_use]
    pub fn issue_counts(&self) -> (usize, usize) {
        match self {
            Self::Full(doc) => count_issues(&doc.metadata.issues),
            Self::Simple(doc) => count_kinds(doc.metadata.issues.iter().map(|i| i.kind)),
        }
    }
}

/// Document header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Metadata<I> {
    /// Layout version, [`FORMAT_VERSION`].
    pub version: String,
    /// Export time, RFC 3339 in UTC.
    pub exported_at: String,
    /// Which shape follows.
    pub format: ExportFormat,
    /// Issues found while parsing (and validating, if requested).
    pub issues: Vec<I>,
}

impl<I> Metadata<I> {
    fn now(format: ExportFormat, issues: Vec<I>) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            format,
            issues,
        }
    }
}

/// The full shape: the syntax tree with spans.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FullDocument {
    /// Header.
    pub metadata: Metadata<Issue>,
    /// Sections as parsed.
    pub sections: Vec<Section>,
}

/// The simple shape: no positions anywhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimpleDocument {
    /// Header.
    pub metadata: Metadata<SimpleIssue>,
    /// Sections without positions.
    pub sections: Vec<SimpleSection>,
}

/// An issue without its span.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimpleIssue {
    /// Severity.
    pub kind: IssueKind,
    /// Message.
    pub message: String,
}

/// A section without positions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimpleSection {
    /// Section name.
    pub name: String,
    /// Leading tags.
    pub tags: Vec<SimpleTag>,
    /// Statements.
    pub statements: Vec<SimpleStatement>,
}

/// A tag without its span.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimpleTag {
    /// Tag name.
    pub name: String,
    /// Verbatim value.
    pub value: Option<String>,
}

/// A text segment without its span.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimpleSegment {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// An inline call.
    InlineCall {
        /// Called function.
        name: String,
        /// Arguments.
        args: Vec<String>,
    },
}

/// A statement without positions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimpleStatement {
    /// `-> target`
    Goto {
        /// Target section.
        target: String,
        /// Attached tags.
        tags: Vec<SimpleTag>,
    },
    /// `@call:name(args)`
    Call {
        /// Called function.
        name: String,
        /// Arguments.
        args: Vec<String>,
        /// Attached tags.
        tags: Vec<SimpleTag>,
    },
    /// Dialogue.
    Replica {
        /// Text without inline-call markup.
        text: String,
        /// Text and inline calls.
        segments: Vec<SimpleSegment>,
        /// Attached tags.
        tags: Vec<SimpleTag>,
    },
    /// A player choice.
    Choice {
        /// Inline text, else block text, else empty.
        choice_text: String,
        /// The choice text split into text and inline calls.
        segments: Vec<SimpleSegment>,
        /// Attached tags.
        tags: Vec<SimpleTag>,
        /// Attached choice tags.
        choice_tags: Vec<SimpleTag>,
        /// Nested statements.
        body: Option<Vec<SimpleStatement>>,
    },
}

impl From<&Issue> for SimpleIssue {
    fn from(issue: &Issue) -> Self {
        Self {
            kind: issue.kind,
            message: issue.message.clone(),
        }
    }
}

impl From<&Tag> for SimpleTag {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.name.clone(),
            value: tag.value.clone(),
        }
    }
}

impl From<&Segment> for SimpleSegment {
    fn from(segment: &Segment) -> Self {
        match segment {
            Segment::Text { text, .. } => Self::Text { text: text.clone() },
            Segment::InlineCall { name, args, .. } => Self::InlineCall {
                name: name.clone(),
                args: args.clone(),
            },
        }
    }
}

impl From<&Statement> for SimpleStatement {
    fn from(statement: &Statement) -> Self {
        match statement {
            Statement::Goto(goto) => Self::Goto {
                target: goto.target.clone(),
                tags: simple_tags(&goto.tags),
            },
            Statement::Call(call) => Self::Call {
                name: call.name.clone(),
                args: call.args.clone(),
                tags: simple_tags(&call.tags),
            },
            Statement::Replica(replica) => Self::Replica {
                text: replica.text.clone(),
                segments: replica.segments.iter().map(SimpleSegment::from).collect(),
                tags: simple_tags(&replica.tags),
            },
            Statement::Choice(choice) => Self::Choice {
                choice_text: choice.text().unwrap_or_default().to_string(),
                segments: choice.segments.iter().map(SimpleSegment::from).collect(),
                tags: simple_tags(&choice.tags),
                choice_tags: simple_tags(&choice.choice_tags),
                body: choice
                    .body
                    .as_ref()
                    .map(|body| body.iter().map(Self::from).collect()),
            },
        }
    }
}

impl From<&Section> for SimpleSection {
    fn from(section: &Section) -> Self {
        Self {
            name: section.name.clone(),
            tags: simple_tags(&section.tags),
            statements: section.statements.iter().map(SimpleStatement::from).collect(),
        }
    }
}

fn simple_tags(tags: &[Tag]) -> Vec<SimpleTag> {
    tags.iter().map(SimpleTag::from).collect()
}

/// Builds the export document for a parse result.
///
/// With `include_validation`, validator issues follow the parse issues.
#[must_use]
pub fn to_document(result: &ParseResult, options: &ExportOptions) -> ExportDocument {
    let mut issues = result.issues.clone();
    if options.include_validation {
        issues.extend(validate(&result.program));
    }

    match options.format {
        ExportFormat::Full => ExportDocument::Full(FullDocument {
            metadata: Metadata::now(ExportFormat::Full, issues),
            sections: result.program.sections.clone(),
        }),
        ExportFormat::Simple => ExportDocument::Simple(SimpleDocument {
            metadata: Metadata::now(
                ExportFormat::Simple,
                issues.iter().map(SimpleIssue::from).collect(),
            ),
            sections: result
                .program
                .sections
                .iter()
                .map(SimpleSection::from)
                .collect(),
        }),
    }
}
