//! Parser for story scripts.
//!
//! Converts a token stream into a [`Program`]. The parser never fails: it
//! records [`Issue`]s, resynchronizes by skipping one token, and always
//! returns a program with at least one section.

use std::mem;

use crate::ast::{Call, Choice, Goto, MAIN_SECTION, Program, Replica, Section, Segment, Statement, Tag};
use crate::error::{Error, Result};
use crate::issue::Issue;
use crate::lexer::tokenize;
use crate::span::{Position, Span};
use crate::token::{Token, TokenKind};

const INLINE_CALL_PREFIX: &str = "{call:";

/// A parsed program plus the issues found while parsing it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseResult {
    /// The best-effort program.
    pub program: Program,
    /// Structural issues, in discovery order.
    pub issues: Vec<Issue>,
}

impl ParseResult {
    /// Returns true if any issue is error-level.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    /// Returns the program, or an error if any issue is error-level.
    ///
    /// # Errors
    /// Returns [`Error::Invalid`] describing the first error-level issue.
    pub fn into_result(self) -> Result<Program> {
        match Error::from_issues(&self.issues) {
            Some(err) => Err(err),
            None => Ok(self.program),
        }
    }
}

/// Tokens, program and parse issues for one source text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedDocument {
    /// The full token stream, ending in `Eof`.
    pub tokens: Vec<Token>,
    /// The best-effort program.
    pub program: Program,
    /// Structural issues.
    pub issues: Vec<Issue>,
}

/// Statements parsed from one window plus tags left after the last one.
struct Block {
    statements: Vec<Statement>,
    dangling: Vec<Tag>,
}

/// Parser for story token streams.
pub struct Parser<'t> {
    tokens: &'t [Token],
    issues: Vec<Issue>,
}

impl<'t> Parser<'t> {
    /// Creates a parser over the given tokens.
    #[must_use]
    pub const fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            issues: Vec::new(),
        }
    }

    /// Parses the whole token stream.
    #[must_use]
    pub fn parse(mut self) -> ParseResult {
        let program = self.parse_program();
        tracing::debug!(
            sections = program.sections.len(),
            issues = self.issues.len(),
            "parsed story"
        );
        ParseResult {
            program,
            issues: self.issues,
        }
    }

    fn parse_program(&mut self) -> Program {
        let tokens = self.tokens;
        let end = tokens
            .iter()
            .position(|t| t.kind == TokenKind::Eof)
            .unwrap_or(tokens.len());
        let headers: Vec<usize> = tokens[..end]
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TokenKind::Section)
            .map(|(i, _)| i)
            .collect();

        let first_header = headers.first().copied().unwrap_or(end);
        let prelude = self.parse_block(0, first_header);
        let mut sections = Vec::new();

        if headers.is_empty() {
            self.warn_dangling(prelude.dangling);
            sections.push(Section {
                name: MAIN_SECTION.to_string(),
                tags: Vec::new(),
                statements: prelude.statements,
                span: self.extent(0, end).unwrap_or_else(Span::at_start),
            });
            return Program { sections };
        }

        if !prelude.statements.is_empty() || self.has_content(0, first_header) {
            sections.push(Section {
                name: MAIN_SECTION.to_string(),
                tags: Vec::new(),
                statements: prelude.statements,
                span: self.extent(0, first_header).unwrap_or_else(Span::at_start),
            });
        }

        let mut leading = prelude.dangling;
        for (n, &header) in headers.iter().enumerate() {
            let window_end = headers.get(n + 1).copied().unwrap_or(end);
            let tags = mem::take(&mut leading);

            let Some(TokenKind::Identifier(name)) = self.kind_at(header + 1, window_end) else {
                self.error(
                    "Expected section name after '==' header",
                    tokens[header].span,
                );
                self.warn_dangling(tags);
                continue;
            };

            let block = self.parse_block(header + 2, window_end);
            if n + 1 == headers.len() {
                self.warn_dangling(block.dangling);
            } else {
                leading = block.dangling;
            }

            sections.push(Section {
                name: name.clone(),
                tags,
                statements: block.statements,
                span: self
                    .extent(header, window_end)
                    .unwrap_or(tokens[header].span),
            });
        }

        if sections.is_empty() {
            sections.push(Section {
                name: MAIN_SECTION.to_string(),
                tags: Vec::new(),
                statements: Vec::new(),
                span: Span::at_start(),
            });
        }

        Program { sections }
    }

    /// Parses statements in `tokens[start..end]`.
    ///
    /// # Panics
    /// Panics if the loop exceeds its iteration ceiling, which would mean a
    /// branch failed to advance.
    fn parse_block(&mut self, start: usize, end: usize) -> Block {
        let tokens = self.tokens;
        let mut statements = Vec::new();
        let mut pending_tags = Vec::new();
        let mut pending_choice_tags = Vec::new();

        let ceiling = end.saturating_sub(start) + 1;
        let mut iterations = 0usize;
        let mut i = start;

        while i < end {
            iterations += 1;
            assert!(
                iterations <= ceiling,
                "parser exceeded its iteration ceiling at token {i}"
            );

            let token = &tokens[i];
            let statement = match &token.kind {
                TokenKind::Tag(_) => {
                    let (tag, next) = self.read_tag(i, end);
                    pending_tags.push(tag);
                    i = next;
                    continue;
                }
                TokenKind::ChoiceTag(_) => {
                    let (tag, next) = self.read_tag(i, end);
                    pending_choice_tags.push(tag);
                    i = next;
                    continue;
                }
                TokenKind::Goto(_) => {
                    let (goto, next) = self.parse_goto(i, end);
                    i = next;
                    match goto {
                        Some(goto) => Statement::Goto(goto),
                        None => continue,
                    }
                }
                TokenKind::Call(name) => {
                    let (call, next) = self.parse_call(name, i, end);
                    i = next;
                    Statement::Call(call)
                }
                TokenKind::ReplicaBegin => {
                    let (replica, next) = self.parse_replica(i, end);
                    i = next;
                    Statement::Replica(replica)
                }
                TokenKind::Choice => {
                    let (choice, next) = self.parse_choice(i, end);
                    i = next;
                    Statement::Choice(choice)
                }
                kind => {
                    if !kind.is_trivia() && !matches!(kind, TokenKind::Error(_)) {
                        tracing::trace!(index = i, kind = kind.name(), "skipping token");
                    }
                    i += 1;
                    continue;
                }
            };

            let mut statement = statement;
            *statement.tags_mut() = mem::take(&mut pending_tags);
            if let Statement::Choice(choice) = &mut statement {
                choice.choice_tags = mem::take(&mut pending_choice_tags);
            } else {
                self.warn_unused_choice_tags(mem::take(&mut pending_choice_tags));
            }
            statements.push(statement);
        }

        self.warn_unused_choice_tags(pending_choice_tags);
        Block {
            statements,
            dangling: pending_tags,
        }
    }

    /// Reads a tag or choice tag and its optional value.
    fn read_tag(&self, i: usize, end: usize) -> (Tag, usize) {
        let token = &self.tokens[i];
        let name = token.value().unwrap_or_default().to_string();
        match self.kind_at(i + 1, end) {
            Some(TokenKind::TagValue(value)) => (
                Tag {
                    name,
                    value: Some(value.clone()),
                    span: token.span.to(self.tokens[i + 1].span),
                },
                i + 2,
            ),
            _ => (
                Tag {
                    name,
                    value: None,
                    span: token.span,
                },
                i + 1,
            ),
        }
    }

    fn parse_goto(&mut self, i: usize, end: usize) -> (Option<Goto>, usize) {
        let arrow = &self.tokens[i];
        match self.kind_at(i + 1, end) {
            Some(TokenKind::Identifier(target)) if !target.trim().is_empty() => (
                Some(Goto {
                    target: target.trim().to_string(),
                    tags: Vec::new(),
                    span: arrow.span.to(self.tokens[i + 1].span),
                }),
                i + 2,
            ),
            _ => {
                self.error("Goto must be followed by a target name", arrow.span);
                (None, i + 1)
            }
        }
    }

    fn parse_call(&mut self, name: &str, i: usize, end: usize) -> (Call, usize) {
        let mut span = self.tokens[i].span;
        let mut args = Vec::new();
        let mut j = i + 1;
        while let Some(TokenKind::CallArgument(arg)) = self.kind_at(j, end) {
            args.push(arg.clone());
            span = span.to(self.tokens[j].span);
            j += 1;
        }

        if args.is_empty() && matches!(self.kind_at(j, end), Some(TokenKind::Newline) | None) {
            self.warning(format!("Empty or malformed call: {name}()"), span);
        }

        (
            Call {
                name: name.to_string(),
                args,
                tags: Vec::new(),
                span,
            },
            j,
        )
    }

    fn parse_replica(&mut self, i: usize, end: usize) -> (Replica, usize) {
        let tokens = self.tokens;
        let begin = tokens[i].span;
        let mut map = TextMap::new(begin.end);
        let mut last = begin;
        let mut last_line = None;
        let mut j = i + 1;

        while let Some(kind) = self.kind_at(j, end) {
            match kind {
                TokenKind::String(text) => {
                    let span = tokens[j].span;
                    if last_line.is_some_and(|line| line != span.start.line) {
                        map.push_separator("\n");
                    }
                    map.push(text, span.start);
                    last_line = Some(span.end.line);
                    last = span;
                    j += 1;
                }
                TokenKind::ReplicaEnd => {
                    last = tokens[j].span;
                    j += 1;
                    break;
                }
                kind if kind.is_trivia() => j += 1,
                _ => break,
            }
        }

        let segments = self.segment(&map);
        let text = segments.iter().filter_map(Segment::as_text).collect();
        (
            Replica {
                text,
                segments,
                tags: Vec::new(),
                span: begin.to(last),
            },
            j,
        )
    }

    fn parse_choice(&mut self, i: usize, end: usize) -> (Choice, usize) {
        let tokens = self.tokens;
        let mut map = TextMap::new(tokens[i].span.end);
        let mut inline_text = None;
        let mut block_text = None;
        let mut j = i + 1;

        match self.kind_at(j, end) {
            Some(TokenKind::ChoiceTextBound { silent: true }) => {
                j += 1;
                if let Some(TokenKind::ChoiceText(text)) = self.kind_at(j, end) {
                    map.push(text, tokens[j].span.start);
                    inline_text = Some(text.clone());
                    j += 1;
                }
                if let Some(TokenKind::ChoiceTextBound { silent: true }) = self.kind_at(j, end) {
                    j += 1;
                }
            }
            Some(TokenKind::ChoiceTextBound { silent: false }) => {
                let open = tokens[j].span;
                let mut closed = false;
                j += 1;
                while let Some(kind) = self.kind_at(j, end) {
                    match kind {
                        TokenKind::ChoiceTextBound { silent: false } => {
                            closed = true;
                            j += 1;
                            break;
                        }
                        TokenKind::ChoiceText(_)
                        | TokenKind::Newline
                        | TokenKind::Comment(_)
                        | TokenKind::CommentContent(_)
                        | TokenKind::BlockCommentBegin
                        | TokenKind::BlockCommentEnd => {
                            if let Some(value) = kind.value() {
                                map.push(value, tokens[j].span.start);
                            }
                            j += 1;
                        }
                        _ => break,
                    }
                }
                if !closed {
                    self.warning("Unterminated choice text block (missing closing ```)", open);
                }
                block_text = Some(map.text.clone());
            }
            _ => {}
        }

        let segments = self.segment(&map);

        let mut k = j;
        while self.kind_at(k, end).is_some_and(TokenKind::is_trivia) {
            k += 1;
        }
        let (body, next) = if let Some(TokenKind::Indent) = self.kind_at(k, end) {
            let body_end = self.matching_dedent(k, end);
            let block = self.parse_block(k + 1, body_end);
            self.warn_dangling(block.dangling);
            (Some(block.statements), (body_end + 1).min(end))
        } else {
            (None, j)
        };

        let choice = Choice {
            inline_text,
            block_text,
            segments,
            tags: Vec::new(),
            choice_tags: Vec::new(),
            body,
            span: self.extent(i, next).unwrap_or(tokens[i].span),
        };
        (choice, next)
    }

    /// Finds the `Dedent` closing the `Indent` at `indent`, or `end`.
    fn matching_dedent(&self, indent: usize, end: usize) -> usize {
        let mut depth = 0usize;
        for (m, token) in self.tokens[indent..end].iter().enumerate() {
            match token.kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => {
                    depth -= 1;
                    if depth == 0 {
                        return indent + m;
                    }
                }
                _ => {}
            }
        }
        end
    }

    /// Splits text into plain text and inline calls.
    fn segment(&mut self, map: &TextMap) -> Vec<Segment> {
        let text = map.text.as_str();
        let mut segments = Vec::new();
        let mut cursor = 0;

        while let Some(open) = find_inline_start(text, cursor) {
            let Some(close) = find_inline_end(text, open) else {
                self.warning("Unterminated inline call", Span::point(map.position(open)));
                break;
            };
            if open > cursor {
                segments.push(Segment::Text {
                    text: text[cursor..open].to_string(),
                    span: map.span(cursor, open),
                });
            }
            let (name, args) = split_inline_call(&text[open + INLINE_CALL_PREFIX.len()..close]);
            segments.push(Segment::InlineCall {
                name,
                args,
                span: map.span(open, close + 1),
            });
            cursor = close + 1;
        }

        if cursor < text.len() {
            segments.push(Segment::Text {
                text: text[cursor..].to_string(),
                span: map.span(cursor, text.len()),
            });
        }
        segments
    }

    /// Span from the first to the last meaningful token in `[from, to)`.
    fn extent(&self, from: usize, to: usize) -> Option<Span> {
        let window = self.tokens.get(from..to)?;
        let meaningful = |t: &&Token| {
            !t.kind.is_trivia() && !matches!(t.kind, TokenKind::Indent | TokenKind::Dedent)
        };
        let first = window.iter().find(meaningful)?;
        let last = window.iter().rev().find(meaningful)?;
        Some(first.span.to(last.span))
    }

    /// True if `tokens[from..to]` holds anything besides trivia, indentation
    /// and tags.
    fn has_content(&self, from: usize, to: usize) -> bool {
        self.tokens[from..to].iter().any(|t| {
            !t.kind.is_trivia()
                && !matches!(
                    t.kind,
                    TokenKind::Indent
                        | TokenKind::Dedent
                        | TokenKind::Tag(_)
                        | TokenKind::ChoiceTag(_)
                        | TokenKind::TagValue(_)
                        | TokenKind::Eof
                )
        })
    }

    fn kind_at(&self, i: usize, end: usize) -> Option<&'t TokenKind> {
        let tokens: &'t [Token] = self.tokens;
        if i < end {
            tokens.get(i).map(|t| &t.kind)
        } else {
            None
        }
    }

    fn warn_dangling(&mut self, tags: Vec<Tag>) {
        for tag in tags {
            self.warning(
                format!("Tag '@{}' is not attached to any statement", tag.name),
                tag.span,
            );
        }
    }

    fn warn_unused_choice_tags(&mut self, tags: Vec<Tag>) {
        for tag in tags {
            self.warning(
                format!("Choice tag '@{}' is not followed by a choice", tag.name),
                tag.span,
            );
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.issues.push(Issue::error(message, Some(span)));
    }

    fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.issues.push(Issue::warning(message, Some(span)));
    }
}

/// Concatenated text from several tokens with a map back to source positions.
struct TextMap {
    text: String,
    pieces: Vec<Piece>,
    /// Position reported when the text is empty.
    origin: Position,
}

#[derive(Clone, Copy)]
struct Piece {
    offset: usize,
    len: usize,
    start: Position,
}

impl TextMap {
    const fn new(origin: Position) -> Self {
        Self {
            text: String::new(),
            pieces: Vec::new(),
            origin,
        }
    }

    fn push(&mut self, text: &str, start: Position) {
        self.pieces.push(Piece {
            offset: self.text.len(),
            len: text.len(),
            start,
        });
        self.text.push_str(text);
    }

    /// Appends text that has no source counterpart.
    fn push_separator(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn position(&self, offset: usize) -> Position {
        let Some(piece) = self.pieces.iter().rev().find(|p| p.offset <= offset) else {
            return self.origin;
        };
        let within = offset.min(piece.offset + piece.len);
        piece.start.advanced_by(&self.text[piece.offset..within])
    }

    fn span(&self, from: usize, to: usize) -> Span {
        Span::new(self.position(from), self.position(to))
    }
}

/// Finds the next `{call:` not escaped by an odd run of backslashes.
fn find_inline_start(text: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(found) = text[search..].find(INLINE_CALL_PREFIX) {
        let at = search + found;
        let backslashes = text[..at].chars().rev().take_while(|&c| c == '\\').count();
        if backslashes % 2 == 0 {
            return Some(at);
        }
        search = at + 1;
    }
    None
}

/// Finds the `}` closing the inline call that starts at `open`.
fn find_inline_end(text: &str, open: usize) -> Option<usize> {
    let body = open + INLINE_CALL_PREFIX.len();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut prev = None;

    for (idx, c) in text[body..].char_indices() {
        let escaped = prev == Some('\\');
        prev = Some(c);
        if escaped {
            continue;
        }
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth -= 1,
            '}' if !in_quotes && depth <= 0 => return Some(body + idx),
            _ => {}
        }
    }
    None
}

/// Splits `name(args)` into its name and arguments.
fn split_inline_call(inner: &str) -> (String, Vec<String>) {
    let mut prev = None;
    let paren = inner.char_indices().find_map(|(idx, c)| {
        let hit = c == '(' && prev != Some('\\');
        prev = Some(c);
        hit.then_some(idx)
    });

    match paren {
        Some(p) => {
            let rest = inner[p + 1..].trim_end();
            let rest = rest.strip_suffix(')').unwrap_or(rest);
            (inner[..p].trim().to_string(), split_arguments(rest))
        }
        None => (inner.trim().to_string(), Vec::new()),
    }
}

/// Splits an argument list on top-level commas outside double quotes.
///
/// Arguments are trimmed and empty ones are dropped.
#[must_use]
pub fn split_arguments(list: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut prev = None;

    for c in list.chars() {
        let escaped = prev == Some('\\');
        prev = Some(c);
        if !escaped {
            match c {
                '"' => in_quotes = !in_quotes,
                '(' if !in_quotes => depth += 1,
                ')' if !in_quotes => depth -= 1,
                ',' if !in_quotes && depth == 0 => {
                    push_argument(&mut args, &current);
                    current.clear();
                    continue;
                }
                _ => {}
            }
        }
        current.push(c);
    }
    push_argument(&mut args, &current);
    args
}

fn push_argument(args: &mut Vec<String>, raw: &str) {
    let arg = raw.trim();
    if !arg.is_empty() {
        args.push(arg.to_string());
    }
}

/// Parses a token stream into a program.
#[must_use]
pub fn parse(tokens: &[Token]) -> ParseResult {
    Parser::new(tokens).parse()
}

/// Tokenizes and parses source text.
#[must_use]
pub fn parse_from_source(source: &str) -> ParseResult {
    parse(&tokenize(source))
}

/// Tokenizes and parses source text, keeping the tokens.
#[must_use]
pub fn parse_all(source: &str) -> ParsedDocument {
    let tokens = tokenize(source);
    let ParseResult { program, issues } = parse(&tokens);
    ParsedDocument {
        tokens,
        program,
        issues,
    }
}
