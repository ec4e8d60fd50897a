//! Token types for story scripts.
//!
//! Tokens are the output of the lexer and input to the parser.

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the text this token covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }

    /// Returns the value carried by this token, if its kind has one.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.kind.value()
    }
}

/// Token types for story scripts.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    // Layout
    /// End of input
    Eof,
    /// One indentation level entered
    Indent,
    /// One indentation level left
    Dedent,
    /// `\n`
    Newline,

    // Comments
    /// `# comment` (text includes the `#`)
    Comment(String),
    /// One line of text inside a block comment
    CommentContent(String),
    /// `/*`
    BlockCommentBegin,
    /// `*/`
    BlockCommentEnd,

    // Dialogue
    /// `" ` opening a replica
    ReplicaBegin,
    /// End of a replica (has no source delimiter)
    ReplicaEnd,
    /// A chunk of replica text
    String(String),

    // Structure
    /// `->` or `=>`
    Goto(String),
    /// `@name` (name stored without the `@`)
    Tag(String),
    /// Value following a tag or choice tag, verbatim
    TagValue(String),
    /// `==` section header
    Section,
    /// Section name or goto target
    Identifier(String),

    // Choices
    /// `+` at the start of a line
    Choice,
    /// `@@name` (name stored with the second `@`)
    ChoiceTag(String),
    /// A chunk of choice text
    ChoiceText(String),
    /// Choice text delimiter; silent bounds wrap same-line text
    ChoiceTextBound {
        /// True when the bound has no source text (inline choice text).
        silent: bool,
    },

    // Calls
    /// `@call:name`
    Call(String),
    /// One argument of a `@call:`
    CallArgument(String),

    /// Lexer error carrying the offending text
    Error(String),
}

impl TokenKind {
    /// Returns true if this token kind carries no meaning for statement parsing.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(
            self,
            Self::Newline
                | Self::Comment(_)
                | Self::CommentContent(_)
                | Self::BlockCommentBegin
                | Self::BlockCommentEnd
        )
    }

    /// Returns the value carried by this kind, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Comment(v)
            | Self::CommentContent(v)
            | Self::String(v)
            | Self::Goto(v)
            | Self::Tag(v)
            | Self::TagValue(v)
            | Self::Identifier(v)
            | Self::ChoiceTag(v)
            | Self::ChoiceText(v)
            | Self::Call(v)
            | Self::CallArgument(v)
            | Self::Error(v) => Some(v),
            Self::ChoiceTextBound { silent: false } => Some("```"),
            Self::ChoiceTextBound { silent: true } => Some(""),
            Self::Newline => Some("\n"),
            Self::BlockCommentBegin => Some("/*"),
            Self::BlockCommentEnd => Some("*/"),
            Self::Eof
            | Self::Indent
            | Self::Dedent
            | Self::ReplicaBegin
            | Self::ReplicaEnd
            | Self::Section
            | Self::Choice => None,
        }
    }

    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Eof => "end of input",
            Self::Indent => "indent",
            Self::Dedent => "dedent",
            Self::Newline => "newline",
            Self::Comment(_) => "comment",
            Self::CommentContent(_) => "comment content",
            Self::BlockCommentBegin => "'/*'",
            Self::BlockCommentEnd => "'*/'",
            Self::ReplicaBegin => "replica",
            Self::ReplicaEnd => "end of replica",
            Self::String(_) => "text",
            Self::Goto(_) => "goto",
            Self::Tag(_) => "tag",
            Self::TagValue(_) => "tag value",
            Self::Section => "'=='",
            Self::Identifier(_) => "identifier",
            Self::Choice => "'+'",
            Self::ChoiceTag(_) => "choice tag",
            Self::ChoiceText(_) => "choice text",
            Self::ChoiceTextBound { .. } => "'```'",
            Self::Call(_) => "call",
            Self::CallArgument(_) => "call argument",
            Self::Error(_) => "error",
        }
    }
}
