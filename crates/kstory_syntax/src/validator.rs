//! Semantic checks over a parsed program.
//!
//! The validator is pure: it reads a [`Program`] (or a token stream) and
//! returns issues. Running it twice yields the same list.

use std::collections::{HashMap, HashSet};

use crate::ast::{Choice, Program, Section, Statement};
use crate::issue::{Issue, IssueKind};
use crate::parser::parse_all;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Everything an editor shows for one source text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    /// The full token stream.
    pub tokens: Vec<Token>,
    /// The best-effort program.
    pub program: Program,
    /// Lexical, then structural, then semantic issues.
    pub issues: Vec<Issue>,
}

impl Diagnostics {
    /// Returns true if any issue is error-level.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    /// Returns issues of the given severity.
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

/// Tokenizes, parses and validates source text.
#[must_use]
pub fn check(source: &str) -> Diagnostics {
    let document = parse_all(source);
    let mut issues = validate_tokens(&document.tokens);
    issues.extend(document.issues);
    issues.extend(validate(&document.program));
    Diagnostics {
        tokens: document.tokens,
        program: document.program,
        issues,
    }
}

/// Reports one error per lexer `Error` token.
#[must_use]
pub fn validate_tokens(tokens: &[Token]) -> Vec<Issue> {
    tokens
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::Error(text) => Some(Issue::error(
                format!("Lexing error: {}", text.trim()),
                Some(token.span),
            )),
            _ => None,
        })
        .collect()
}

/// Checks cross-references and structural well-formedness.
#[must_use]
pub fn validate(program: &Program) -> Vec<Issue> {
    let mut validator = Validator::default();
    validator.check_duplicate_sections(&program.sections);
    for section in &program.sections {
        if section.statements.is_empty() {
            validator.warning(
                format!("Section '{}' has no statements", section.name),
                section.span,
            );
        }
        validator.check_statements(section, &section.statements);
    }
    validator.resolve_gotos(program);
    validator.issues
}

#[derive(Default)]
struct Validator<'p> {
    issues: Vec<Issue>,
    gotos: Vec<(&'p str, Span)>,
}

impl<'p> Validator<'p> {
    fn check_duplicate_sections(&mut self, sections: &[Section]) {
        let mut order: Vec<String> = Vec::new();
        let mut seen: HashMap<String, (usize, usize)> = HashMap::new();
        for (idx, section) in sections.iter().enumerate() {
            let key = section.name.to_lowercase();
            match seen.get_mut(&key) {
                Some((_, count)) => *count += 1,
                None => {
                    seen.insert(key.clone(), (idx, 1));
                    order.push(key);
                }
            }
        }

        for key in order {
            let Some(&(first, count)) = seen.get(&key) else {
                continue;
            };
            if count > 1 {
                let section = &sections[first];
                self.error(
                    format!(
                        "Duplicate section name: '{}' is defined {count} times",
                        section.name
                    ),
                    section.span,
                );
            }
        }
    }

    fn check_statements(&mut self, section: &Section, statements: &'p [Statement]) {
        for statement in statements {
            match statement {
                Statement::Goto(goto) => self.gotos.push((&goto.target, goto.span)),
                Statement::Call(call) => {
                    if call.name.trim().is_empty() {
                        self.error(
                            format!("Empty call name in section '{}'", section.name),
                            call.span,
                        );
                    }
                }
                Statement::Replica(replica) => {
                    if replica.text.trim().is_empty() {
                        self.warning("Empty replica text", replica.span);
                    }
                }
                Statement::Choice(choice) => self.check_choice(section, choice),
            }
        }
    }

    fn check_choice(&mut self, section: &Section, choice: &'p Choice) {
        if choice.inline_text.is_some() && choice.block_text.is_some() {
            self.error("Choice has both inline and block text", choice.span);
        }

        let has_text = choice.text().is_some_and(|t| !t.trim().is_empty());
        let has_body = choice.body.as_ref().is_some_and(|b| !b.is_empty());
        if !has_text && !has_body {
            self.warning(
                format!("Empty choice in section '{}'", section.name),
                choice.span,
            );
        }

        let mut names = HashSet::new();
        for tag in &choice.choice_tags {
            if !names.insert(tag.name.to_lowercase()) {
                self.error(format!("Duplicate choice tag '{}'", tag.name), tag.span);
            }
        }

        if let Some(body) = &choice.body {
            self.check_statements(section, body);
        }
    }

    fn resolve_gotos(&mut self, program: &Program) {
        let known: HashSet<String> = program
            .sections
            .iter()
            .map(|s| s.name.to_lowercase())
            .collect();
        let mut referenced = HashSet::new();

        for (target, span) in std::mem::take(&mut self.gotos) {
            let key = target.to_lowercase();
            if known.contains(&key) {
                referenced.insert(key);
            } else {
                self.error(format!("Goto target not found: '{target}'"), span);
            }
        }

        for section in &program.sections {
            if !section.is_main() && !referenced.contains(&section.name.to_lowercase()) {
                self.warning(
                    format!("Unreferenced section: '{}'", section.name),
                    section.span,
                );
            }
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.issues.push(Issue::error(message, Some(span)));
    }

    fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.issues.push(Issue::warning(message, Some(span)));
    }
}
