//! Lexer, parser and validator for story scripts (`.ks` files).
//!
//! Story scripts are flat text files of named sections holding dialogue lines,
//! jumps, tags, function calls and branching choices.
//!
//! # Architecture
//!
//! ```text
//! == Intro
//! " Hello {call:name()}
//! + Leave
//!   -> End
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   LEXER         │  → [Section, Identifier("Intro"), Newline, ReplicaBegin, ...]
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   PARSER        │  → Program { sections: [Section { name: "Intro", ... }] }
//! └─────────────────┘     + structural issues
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   VALIDATOR     │  → Goto target not found: 'End'
//! └─────────────────┘
//! ```
//!
//! No stage fails. Bad input becomes `Error` tokens and [`Issue`]s, and the
//! parser always returns a usable [`Program`].
//!
//! # Modules
//!
//! - [`span`] - Source positions
//! - [`token`] - Token kinds
//! - [`lexer`] - Mode-switching, indentation-aware tokenizer
//! - [`ast`] - Sections, statements, tags and text segments
//! - [`parser`] - Recovering parser with inline-call segmentation
//! - [`validator`] - Cross-reference and well-formedness checks
//! - [`issue`] - Diagnostics
//! - [`error`] - Error type for the strict API

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod error;
pub mod issue;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
pub mod validator;


pub use ast::{Call, Choice, Goto, Program, Replica, Section, Segment, Statement, Tag};
pub use error::{Error, Result};
pub use issue::{Issue, IssueKind};
pub use lexer::{Lexer, tokenize};
pub use parser::{ParseResult, ParsedDocument, Parser, parse, parse_all, parse_from_source};
pub use span::{Position, Span};
pub use token::{Token, TokenKind};
pub use validator::{Diagnostics, check, validate, validate_tokens};
