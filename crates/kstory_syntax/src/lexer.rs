//! Lexer for story scripts.
//!
//! The lexer converts source text into a stream of tokens. Unlike a classic
//! pull lexer it is line- and mode-sensitive: dialogue text, block comments
//! and choice-text blocks each change how the following characters are read,
//! and indentation at the start of a line produces `Indent`/`Dedent` tokens.
//!
//! Mode precedence at every character:
//!
//! 1. block comment (`/* ... */`)
//! 2. replica (dialogue opened by `" `)
//! 3. choice-text block (```` ``` ... ``` ````)
//! 4. structural scanning
//!
//! Replica and choice-text modes are exclusive ([`Mode`]); a block comment can
//! open on top of either and the underlying mode resumes after `*/`.

use crate::span::{Position, Span};
use crate::token::{Token, TokenKind};

/// Columns per indentation level. A tab counts as one full level.
pub const INDENT_WIDTH: usize = 2;

const CALL_PREFIX: &str = "@call:";
const INLINE_CALL_PREFIX: &str = "{call:";
const CHOICE_TEXT_BOUND: &str = "```";

/// The body mode the lexer is in, below any open block comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Structural,
    Replica,
    ChoiceText,
}

/// Lexer for story script source code.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Tokens emitted so far.
    tokens: Vec<Token>,
    mode: Mode,
    in_block_comment: bool,
    /// Indentation has not been measured for the current line yet.
    pending_indent: bool,
    /// Current indentation level.
    indent_level: usize,
    /// Tokens seen inside an open replica after its last `String`.
    ///
    /// They are flushed after `ReplicaEnd` once the replica closes, which keeps
    /// `tokens` append-only.
    replica_trailing: Vec<Token>,
    /// End of the last `String` (or of `ReplicaBegin`) in the open replica.
    replica_last_end: Position,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            mode: Mode::Structural,
            in_block_comment: false,
            pending_indent: true,
            indent_level: 0,
            replica_trailing: Vec::new(),
            replica_last_end: Position::start(),
        }
    }

    /// Tokenizes all source and returns a vector of tokens ending in `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize()
    }

    /// Consumes the lexer and produces the full token stream.
    ///
    /// # Panics
    /// Panics if the scan exceeds its iteration ceiling, which means a scanner
    /// stopped making progress. That is a lexer bug, never a property of the
    /// input.
    #[must_use]
    pub fn tokenize(mut self) -> Vec<Token> {
        let ceiling = self.source.len() * 4 + 64;
        let mut iterations = 0usize;

        while self.peek().is_some() {
            iterations += 1;
            assert!(
                iterations <= ceiling,
                "lexer exceeded its iteration ceiling at {}:{}",
                self.line,
                self.column
            );
            self.step();
        }

        self.finish();
        tracing::debug!(
            tokens = self.tokens.len(),
            bytes = self.source.len(),
            "tokenized story source"
        );
        self.tokens
    }

    /// Processes whatever starts at the current position.
    fn step(&mut self) {
        if self.at_newline() {
            let start = self.pos();
            if self.peek() == Some('\r') {
                self.advance();
            }
            self.advance();
            self.push(TokenKind::Newline, start);
            self.pending_indent = true;
            return;
        }

        if self.pending_indent {
            self.pending_indent = false;
            if !self.in_block_comment && self.mode != Mode::ChoiceText {
                self.scan_indentation();
                if self.at_line_end() {
                    return;
                }
            }
        }

        if self.in_block_comment {
            self.scan_block_comment_line();
            return;
        }

        match self.mode {
            Mode::Replica => self.scan_replica(),
            Mode::ChoiceText => self.scan_choice_text(),
            Mode::Structural => self.scan_structural(),
        }
    }

    /// Closes anything still open and appends `Eof`.
    fn finish(&mut self) {
        self.close_replica();
        let at = self.pos();
        while self.indent_level > 0 {
            self.indent_level -= 1;
            self.tokens.push(Token::new(TokenKind::Dedent, Span::point(at)));
        }
        self.tokens.push(Token::new(TokenKind::Eof, Span::point(at)));
    }

    // =========================================================================
    // Emission
    // =========================================================================

    /// Emits a token spanning from `start` to the current position.
    fn push(&mut self, kind: TokenKind, start: Position) {
        let span = Span::new(start, self.pos());
        self.push_token(Token::new(kind, span));
    }

    fn push_token(&mut self, token: Token) {
        if self.mode != Mode::Replica {
            self.tokens.push(token);
            return;
        }
        if matches!(token.kind, TokenKind::String(_)) {
            self.tokens.append(&mut self.replica_trailing);
            self.replica_last_end = token.span.end;
            self.tokens.push(token);
        } else {
            self.replica_trailing.push(token);
        }
    }

    /// Emits `text` as `kind` with a span trimmed to the text's own extent.
    fn push_text(&mut self, make: fn(String) -> TokenKind, raw: &str, start: Position) {
        let leading = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        let text_start = start.advanced_by(&raw[..leading]);
        let span = Span::new(text_start, text_start.advanced_by(trimmed));
        self.push_token(Token::new(make(trimmed.to_string()), span));
    }

    fn close_replica(&mut self) {
        if self.mode != Mode::Replica {
            return;
        }
        self.mode = Mode::Structural;
        let end = Token::new(TokenKind::ReplicaEnd, Span::point(self.replica_last_end));
        self.tokens.push(end);
        self.tokens.append(&mut self.replica_trailing);
    }

    // =========================================================================
    // Scanners
    // =========================================================================

    /// Measures leading whitespace and emits one token per level crossed.
    fn scan_indentation(&mut self) {
        let start = self.pos();
        let mut columns = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => columns += 1,
                '\t' => columns += INDENT_WIDTH,
                _ => break,
            }
            self.advance();
        }

        // Blank and comment-only lines keep the current level.
        if self.at_line_end() || self.at_line_comment() {
            return;
        }

        let level = columns / INDENT_WIDTH;
        if level == self.indent_level {
            return;
        }

        self.close_replica();
        let span = Span::new(start, self.pos());
        while self.indent_level < level {
            self.indent_level += 1;
            self.tokens.push(Token::new(TokenKind::Indent, span));
        }
        while self.indent_level > level {
            self.indent_level -= 1;
            self.tokens.push(Token::new(TokenKind::Dedent, span));
        }
    }

    fn scan_structural(&mut self) {
        match self.peek() {
            Some(' ' | '\t' | '\r') => self.advance(),
            _ if self.at_block_comment_start() => self.begin_block_comment(),
            _ if self.at_line_comment() => self.scan_line_comment(),
            _ if self.at_call() => self.scan_call(),
            _ if self.at_choice_tag() => self.scan_tag(true),
            _ if self.at_tag() => self.scan_tag(false),
            _ if self.at_section() => self.scan_section(),
            _ if self.at_goto() => self.scan_goto(),
            _ if self.at_choice() => self.scan_choice(),
            _ if self.at_replica_begin() => self.open_replica(),
            _ if self.at_choice_text_bound() => self.open_choice_text_block(),
            _ => self.scan_error(),
        }
    }

    fn begin_block_comment(&mut self) {
        let start = self.pos();
        self.advance_n(2);
        self.push(TokenKind::BlockCommentBegin, start);
        self.in_block_comment = true;
    }

    /// Reads block comment text up to the end of the line or the closing `*/`.
    fn scan_block_comment_line(&mut self) {
        let start = self.pos();
        let mut content = String::new();
        while !self.at_line_end() && !self.at_block_comment_end() {
            if let Some(c) = self.peek() {
                content.push(c);
            }
            self.advance();
        }
        if !content.is_empty() {
            self.push(TokenKind::CommentContent(content), start);
        }

        if self.at_block_comment_end() {
            let end_start = self.pos();
            self.advance_n(2);
            self.push(TokenKind::BlockCommentEnd, end_start);
            self.in_block_comment = false;
        }
    }

    fn scan_line_comment(&mut self) {
        let start = self.pos();
        let mut content = String::new();
        while !self.at_line_end() {
            if let Some(c) = self.peek() {
                content.push(c);
            }
            self.advance();
        }
        self.push(TokenKind::Comment(content), start);
    }

    /// Scans `@name value` or `@@name value`.
    fn scan_tag(&mut self, choice: bool) {
        let start = self.pos();
        // A choice tag keeps its second `@` in the name.
        self.advance();

        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || self.at_line_end() {
                break;
            }
            name.push(c);
            self.advance();
        }

        if name.is_empty() {
            self.push(TokenKind::Error("@".to_string()), start);
            return;
        }

        let kind = if choice {
            TokenKind::ChoiceTag(name)
        } else {
            TokenKind::Tag(name)
        };
        self.push(kind, start);

        let value_start = self.pos();
        let mut value = String::new();
        while !self.at_line_end() && !self.starts_token() {
            if let Some(c) = self.peek() {
                value.push(c);
            }
            self.advance();
        }

        let value = value.trim_end();
        if !value.trim_start().is_empty() {
            let span = Span::new(value_start, value_start.advanced_by(value));
            self.push_token(Token::new(TokenKind::TagValue(value.to_string()), span));
        }
    }

    /// Scans `@call:name(arg, ...)`.
    fn scan_call(&mut self) {
        let start = self.pos();
        self.advance_n(CALL_PREFIX.len());

        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || self.at_line_end() || self.is_not_escaped('(') {
                break;
            }
            name.push(c);
            self.advance();
        }
        self.push(TokenKind::Call(name), start);

        if self.is_not_escaped('(') {
            self.scan_call_arguments();
        }
    }

    /// Reads comma-separated arguments between balanced parentheses.
    ///
    /// Commas split only at depth 1 and outside double quotes. The argument
    /// list must close on the same line; otherwise the unclosed text becomes an
    /// `Error` token after whatever arguments were read.
    fn scan_call_arguments(&mut self) {
        let open = self.pos();
        self.advance();

        let mut depth = 1usize;
        let mut in_quotes = false;
        let mut current = String::new();
        let mut arg_start = self.pos();
        let mut closed = false;

        while let Some(c) = self.peek() {
            if self.at_line_end() {
                break;
            }
            let escaped = self.prev_char() == Some('\\');
            if c == '"' && !escaped {
                in_quotes = !in_quotes;
            } else if !in_quotes && !escaped {
                match c {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            self.push_argument(&current, arg_start);
                            self.advance();
                            closed = true;
                            break;
                        }
                    }
                    ',' if depth == 1 => {
                        self.push_argument(&current, arg_start);
                        current.clear();
                        self.advance();
                        arg_start = self.pos();
                        continue;
                    }
                    _ => {}
                }
            }
            current.push(c);
            self.advance();
        }

        if !closed {
            self.push_argument(&current, arg_start);
            let text = self.source[open.offset..self.position].trim_end().to_string();
            let span = Span::new(open, open.advanced_by(&text));
            self.push_token(Token::new(TokenKind::Error(text), span));
        }
    }

    fn push_argument(&mut self, raw: &str, start: Position) {
        if !raw.trim().is_empty() {
            self.push_text(TokenKind::CallArgument, raw, start);
        }
    }

    /// Scans `== name`.
    fn scan_section(&mut self) {
        let start = self.pos();
        self.advance_n(2);
        self.push(TokenKind::Section, start);
        self.skip_inline_whitespace();

        let name_start = self.pos();
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == ' '
                || c == '\t'
                || self.at_line_end()
                || self.at_line_comment()
                || self.at_block_comment_start()
            {
                break;
            }
            name.push(c);
            self.advance();
        }
        if !name.is_empty() {
            self.push(TokenKind::Identifier(name), name_start);
        }
    }

    /// Scans `-> target` or `=> target`.
    fn scan_goto(&mut self) {
        let start = self.pos();
        let arrow = self.source[self.position..self.position + 2].to_string();
        self.advance_n(2);
        self.push(TokenKind::Goto(arrow), start);
        self.skip_inline_whitespace();

        let target_start = self.pos();
        let target = self.read_until_comment();
        if !target.trim().is_empty() {
            self.push_text(TokenKind::Identifier, &target, target_start);
        }
    }

    /// Scans `+` and the text that follows it on the same line.
    fn scan_choice(&mut self) {
        let start = self.pos();
        self.advance();
        self.push(TokenKind::Choice, start);

        let rest = &self.source[self.position..];
        let after_ws = rest.trim_start_matches([' ', '\t']);
        if after_ws.starts_with(CHOICE_TEXT_BOUND) {
            self.skip_inline_whitespace();
            self.open_choice_text_block();
            return;
        }

        let text_start = self.pos();
        let mut text = String::new();
        while !self.at_line_end() && !self.at_line_comment() && !self.at_block_comment_start() {
            if self.at_inline_call() {
                self.scan_inline_call_into(&mut text);
                continue;
            }
            if let Some(c) = self.peek() {
                text.push(c);
            }
            self.advance();
        }

        let text = text.trim_end();
        if text.trim_start().is_empty() {
            return;
        }
        let text_end = text_start.advanced_by(text);
        self.tokens.push(Token::new(
            TokenKind::ChoiceTextBound { silent: true },
            Span::point(text_start),
        ));
        self.tokens.push(Token::new(
            TokenKind::ChoiceText(text.to_string()),
            Span::new(text_start, text_end),
        ));
        self.tokens.push(Token::new(
            TokenKind::ChoiceTextBound { silent: true },
            Span::point(text_end),
        ));
    }

    fn open_replica(&mut self) {
        let start = self.pos();
        self.advance_n(2);
        self.push(TokenKind::ReplicaBegin, start);
        self.mode = Mode::Replica;
        self.replica_last_end = self.pos();
    }

    /// Reads one chunk of dialogue text or ends the replica.
    fn scan_replica(&mut self) {
        if self.at_replica_terminator() {
            self.close_replica();
            return;
        }
        if self.at_block_comment_start() {
            self.begin_block_comment();
            return;
        }
        if self.at_line_comment() {
            self.scan_line_comment();
            return;
        }

        let start = self.pos();
        let mut text = String::new();
        while !self.at_line_end() {
            if self.at_inline_call() {
                self.scan_inline_call_into(&mut text);
                continue;
            }
            if self.at_replica_terminator()
                || self.at_block_comment_start()
                || self.at_line_comment()
            {
                break;
            }
            if let Some(c) = self.peek() {
                text.push(c);
            }
            self.advance();
        }

        if !text.trim().is_empty() {
            self.push(TokenKind::String(text), start);
        }
    }

    fn open_choice_text_block(&mut self) {
        let start = self.pos();
        self.advance_n(CHOICE_TEXT_BOUND.len());
        self.push(TokenKind::ChoiceTextBound { silent: false }, start);
        self.mode = Mode::ChoiceText;
    }

    /// Reads one chunk of block choice text or closes the block.
    fn scan_choice_text(&mut self) {
        if self.at_choice_text_bound() {
            let start = self.pos();
            self.advance_n(CHOICE_TEXT_BOUND.len());
            self.mode = Mode::Structural;
            self.push(TokenKind::ChoiceTextBound { silent: false }, start);
            return;
        }
        if self.at_block_comment_start() {
            self.begin_block_comment();
            return;
        }
        if self.at_line_comment() {
            self.scan_line_comment();
            return;
        }

        let start = self.pos();
        let mut text = String::new();
        while !self.at_line_end() {
            if self.at_inline_call() {
                self.scan_inline_call_into(&mut text);
                continue;
            }
            if self.at_choice_text_bound()
                || self.at_block_comment_start()
                || self.at_line_comment()
            {
                break;
            }
            if let Some(c) = self.peek() {
                text.push(c);
            }
            self.advance();
        }

        if !text.is_empty() {
            self.push(TokenKind::ChoiceText(text), start);
        }
    }

    /// Copies `{call:name(args)}` verbatim into `text`.
    ///
    /// Parentheses and double quotes are tracked so that a `}` or a structural
    /// character inside the arguments does not end the call early. An
    /// unterminated call stops at the end of the line; the parser reports it.
    fn scan_inline_call_into(&mut self, text: &mut String) {
        text.push_str(INLINE_CALL_PREFIX);
        self.advance_n(INLINE_CALL_PREFIX.len());

        let mut depth = 0i32;
        let mut in_quotes = false;
        while let Some(c) = self.peek() {
            if self.at_line_end() {
                break;
            }
            let escaped = self.prev_char() == Some('\\');
            text.push(c);
            self.advance();
            if escaped {
                continue;
            }
            match c {
                '"' => in_quotes = !in_quotes,
                '(' if !in_quotes => depth += 1,
                ')' if !in_quotes => depth -= 1,
                '}' if !in_quotes && depth <= 0 => break,
                _ => {}
            }
        }
    }

    /// Collects unrecognized text up to the next recognizable token.
    fn scan_error(&mut self) {
        let start = self.pos();
        let mut text = String::new();
        loop {
            if let Some(c) = self.peek() {
                text.push(c);
            }
            self.advance();
            if self.at_line_end() || self.starts_token() {
                break;
            }
        }
        self.push_text(TokenKind::Error, &text, start);
    }

    // =========================================================================
    // Recognizers
    // =========================================================================

    /// True if the current character is `c` and is not preceded by `\`.
    fn is_not_escaped(&self, c: char) -> bool {
        self.peek() == Some(c) && self.prev_char() != Some('\\')
    }

    fn starts_token(&self) -> bool {
        self.at_block_comment_start()
            || self.at_line_comment()
            || self.at_tag()
            || self.at_section()
            || self.at_goto()
            || self.at_choice()
            || self.at_replica_begin()
            || self.at_choice_text_bound()
    }

    /// True where an open replica must end.
    fn at_replica_terminator(&self) -> bool {
        self.at_replica_begin()
            || self.at_tag()
            || self.at_section()
            || self.at_goto()
            || self.at_choice()
    }

    fn at_replica_begin(&self) -> bool {
        self.is_not_escaped('"') && self.peek_n(1) == Some(' ')
    }

    fn at_tag(&self) -> bool {
        self.is_not_escaped('@')
    }

    fn at_choice_tag(&self) -> bool {
        self.at_tag() && self.peek_n(1) == Some('@')
    }

    fn at_call(&self) -> bool {
        self.at_tag() && self.rest().starts_with(CALL_PREFIX)
    }

    fn at_inline_call(&self) -> bool {
        self.is_not_escaped('{') && self.rest().starts_with(INLINE_CALL_PREFIX)
    }

    fn at_section(&self) -> bool {
        self.is_not_escaped('=') && self.peek_n(1) == Some('=') && self.is_separator_at(2)
    }

    fn at_goto(&self) -> bool {
        (self.is_not_escaped('-') || self.is_not_escaped('='))
            && self.peek_n(1) == Some('>')
            && self.is_separator_at(2)
    }

    fn at_choice(&self) -> bool {
        self.is_not_escaped('+') && self.first_on_line()
    }

    fn at_choice_text_bound(&self) -> bool {
        self.is_not_escaped('`') && self.rest().starts_with(CHOICE_TEXT_BOUND)
    }

    fn at_line_comment(&self) -> bool {
        self.is_not_escaped('#')
    }

    fn at_block_comment_start(&self) -> bool {
        self.is_not_escaped('/') && self.peek_n(1) == Some('*')
    }

    fn at_block_comment_end(&self) -> bool {
        self.is_not_escaped('*') && self.peek_n(1) == Some('/')
    }

    fn at_newline(&self) -> bool {
        let rest = self.rest();
        rest.starts_with('\n') || rest.starts_with("\r\n")
    }

    fn at_line_end(&self) -> bool {
        self.peek().is_none() || self.at_newline()
    }

    /// True if the character `n` ahead is whitespace, a line end, or missing.
    fn is_separator_at(&self, n: usize) -> bool {
        matches!(self.peek_n(n), None | Some(' ' | '\t' | '\n' | '\r'))
    }

    /// True if only spaces and tabs precede the cursor on this line.
    fn first_on_line(&self) -> bool {
        self.source[..self.position]
            .chars()
            .rev()
            .take_while(|&c| c != '\n')
            .all(|c| c == ' ' || c == '\t')
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    fn pos(&self) -> Position {
        Position::new(self.position, self.line, self.column)
    }

    fn rest(&self) -> &'src str {
        &self.source[self.position..]
    }

    /// Peeks at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Peeks `n` characters ahead.
    fn peek_n(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn prev_char(&self) -> Option<char> {
        self.source[..self.position].chars().next_back()
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.advance();
        }
    }

    /// Reads the rest of the line, stopping before any comment.
    fn read_until_comment(&mut self) -> String {
        let mut text = String::new();
        while !self.at_line_end() && !self.at_line_comment() && !self.at_block_comment_start() {
            if let Some(c) = self.peek() {
                text.push(c);
            }
            self.advance();
        }
        text
    }
}

/// Tokenizes story source. The result always ends with exactly one `Eof`.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::tokenize_all(source)
}
