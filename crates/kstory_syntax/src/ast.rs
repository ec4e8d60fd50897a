//! Abstract Syntax Tree for story scripts.
//!
//! A [`Program`] is an ordered list of [`Section`]s; sections hold
//! [`Statement`]s, and choices nest further statements in their body.

use crate::span::Span;

/// Name of the implicit section that holds content outside any `==` header.
pub const MAIN_SECTION: &str = "main";

/// A parsed story script.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    /// Sections in source order. Never empty after parsing.
    pub sections: Vec<Section>,
}

impl Program {
    /// Finds the first section whose name matches case-insensitively.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        let name = name.to_lowercase();
        self.sections
            .iter()
            .find(|s| s.name.to_lowercase() == name)
    }

    /// Returns section names in source order.
    #[must_use]
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns the innermost statement whose span contains the cursor.
    #[must_use]
    pub fn statement_at(&self, line: u32, column: u32) -> Option<&Statement> {
        self.sections
            .iter()
            .filter(|s| s.span.contains(line, column))
            .find_map(|s| find_statement(&s.statements, line, column))
    }
}

fn find_statement(statements: &[Statement], line: u32, column: u32) -> Option<&Statement> {
    let statement = statements
        .iter()
        .find(|s| s.span().contains(line, column))?;
    if let Statement::Choice(choice) = statement {
        if let Some(inner) = choice
            .body
            .as_deref()
            .and_then(|body| find_statement(body, line, column))
        {
            return Some(inner);
        }
    }
    Some(statement)
}

/// A named block of statements.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Section {
    /// Section name, as written after `==` (or `main`).
    pub name: String,
    /// Tags written directly before the section header.
    pub tags: Vec<Tag>,
    /// Statements in source order.
    pub statements: Vec<Statement>,
    /// From the header (or first statement) to the last token of the section.
    pub span: Span,
}

impl Section {
    /// Returns true if this is the implicit `main` section or one named `main`.
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.name.eq_ignore_ascii_case(MAIN_SECTION)
    }
}

/// A `@name value` or `@@name value` annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    /// Tag name; choice tags keep their leading `@`.
    pub name: String,
    /// Verbatim value, if any (leading whitespace is kept).
    pub value: Option<String>,
    /// Source location.
    pub span: Span,
}

/// A piece of replica or choice text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Segment {
    /// Plain text.
    Text {
        /// The text.
        text: String,
        /// Source location.
        span: Span,
    },
    /// `{call:name(args)}` embedded in text.
    InlineCall {
        /// Called function name.
        name: String,
        /// Trimmed arguments.
        args: Vec<String>,
        /// Source location of the whole `{call:...}`.
        span: Span,
    },
}

impl Segment {
    /// Returns the source span of this segment.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Text { span, .. } | Self::InlineCall { span, .. } => *span,
        }
    }

    /// Returns the text if this is a plain text segment.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::InlineCall { .. } => None,
        }
    }
}

/// A `->` jump to another section.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Goto {
    /// Target section name.
    pub target: String,
    /// Attached tags.
    pub tags: Vec<Tag>,
    /// Source location.
    pub span: Span,
}

/// A `@call:name(args)` statement.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Call {
    /// Called function name.
    pub name: String,
    /// Trimmed arguments.
    pub args: Vec<String>,
    /// Attached tags.
    pub tags: Vec<Tag>,
    /// Source location.
    pub span: Span,
}

/// A line of dialogue or narration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Replica {
    /// Dialogue text with inline-call markup removed.
    ///
    /// Always equals the concatenation of the `Text` segments.
    pub text: String,
    /// The dialogue split into plain text and inline calls.
    pub segments: Vec<Segment>,
    /// Attached tags.
    pub tags: Vec<Tag>,
    /// Source location.
    pub span: Span,
}

/// A player choice.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Choice {
    /// Text on the `+` line, verbatim.
    pub inline_text: Option<String>,
    /// Text of a ```` ``` ```` block, verbatim.
    pub block_text: Option<String>,
    /// The choice text split into plain text and inline calls.
    pub segments: Vec<Segment>,
    /// Attached `@tags`.
    pub tags: Vec<Tag>,
    /// Attached `@@tags`.
    pub choice_tags: Vec<Tag>,
    /// Indented statements under the choice.
    pub body: Option<Vec<Statement>>,
    /// Source location, including the body.
    pub span: Span,
}

impl Choice {
    /// Returns the inline text, else the block text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.inline_text.as_deref().or(self.block_text.as_deref())
    }
}

/// A statement inside a section or choice body.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Statement {
    /// `-> target`
    Goto(Goto),
    /// `@call:name(args)`
    Call(Call),
    /// `" text`
    Replica(Replica),
    /// `+ text`
    Choice(Choice),
}

impl Statement {
    /// Returns the source span of this statement.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Goto(g) => g.span,
            Self::Call(c) => c.span,
            Self::Replica(r) => r.span,
            Self::Choice(c) => c.span,
        }
    }

    /// Returns the tags attached to this statement.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        match self {
            Self::Goto(g) => &g.tags,
            Self::Call(c) => &c.tags,
            Self::Replica(r) => &r.tags,
            Self::Choice(c) => &c.tags,
        }
    }

    /// Returns a short lowercase name for this statement kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Goto(_) => "goto",
            Self::Call(_) => "call",
            Self::Replica(_) => "replica",
            Self::Choice(_) => "choice",
        }
    }

    /// Returns the goto if this is one.
    #[must_use]
    pub const fn as_goto(&self) -> Option<&Goto> {
        match self {
            Self::Goto(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the call if this is one.
    #[must_use]
    pub const fn as_call(&self) -> Option<&Call> {
        match self {
            Self::Call(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the replica if this is one.
    #[must_use]
    pub const fn as_replica(&self) -> Option<&Replica> {
        match self {
            Self::Replica(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the choice if this is one.
    #[must_use]
    pub const fn as_choice(&self) -> Option<&Choice> {
        match self {
            Self::Choice(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn tags_mut(&mut self) -> &mut Vec<Tag> {
        match self {
            Self::Goto(g) => &mut g.tags,
            Self::Call(c) => &mut c.tags,
            Self::Replica(r) => &mut r.tags,
            Self::Choice(c) => &mut c.tags,
        }
    }
}
