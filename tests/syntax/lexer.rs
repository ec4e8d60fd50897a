//! Integration tests for the lexer
//!
//! Tests tokenization of whole story scripts.

use kstory_syntax::{Lexer, TokenKind, tokenize};

const STORY: &str = r#"# A short scene
== Intro
@mood calm
" Welcome, traveler. {call:playSound("bell")}
  # indented comment lines do not move the level
" The road splits here.
@@once
+ Go left
  " You take the left path.
  -> Forest
+ ```Go right,
toward the river```
  @call:setFlag(river, true)
  => River
/* hidden
   option */
== Forest
-> Intro
"#;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).into_iter().map(|t| t.kind).collect()
}

fn count(kinds: &[TokenKind], pred: impl Fn(&TokenKind) -> bool) -> usize {
    kinds.iter().filter(|k| pred(k)).count()
}

// =============================================================================
// Whole Stories
// =============================================================================

#[test]
fn tokenize_story_ends_with_single_eof() {
    let tokens = Lexer::tokenize_all(STORY);
    assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
    assert_eq!(
        tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
        1
    );
}

#[test]
fn tokenize_story_structure() {
    let kinds = kinds(STORY);
    assert_eq!(count(&kinds, |k| *k == TokenKind::Section), 2);
    assert_eq!(count(&kinds, |k| *k == TokenKind::Choice), 2);
    assert_eq!(count(&kinds, |k| *k == TokenKind::ReplicaBegin), 3);
    assert_eq!(count(&kinds, |k| *k == TokenKind::ReplicaEnd), 3);
    assert_eq!(count(&kinds, |k| matches!(k, TokenKind::Goto(_))), 3);
    assert_eq!(count(&kinds, |k| matches!(k, TokenKind::Error(_))), 0);
}

#[test]
fn tokenize_story_balances_indentation() {
    let kinds = kinds(STORY);
    assert_eq!(
        count(&kinds, |k| *k == TokenKind::Indent),
        count(&kinds, |k| *k == TokenKind::Dedent)
    );
}

#[test]
fn tokenize_story_keeps_inline_call_in_replica_text() {
    let kinds = kinds(STORY);
    assert!(kinds.contains(&TokenKind::String(
        "Welcome, traveler. {call:playSound(\"bell\")}".into()
    )));
}

#[test]
fn tokenize_story_call_arguments() {
    let kinds = kinds(STORY);
    let args: Vec<_> = kinds
        .iter()
        .filter_map(|k| match k {
            TokenKind::CallArgument(a) => Some(a.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(args, vec!["river", "true"]);
}

#[test]
fn tokenize_story_both_goto_arrows() {
    let kinds = kinds(STORY);
    assert!(kinds.contains(&TokenKind::Goto("->".into())));
    assert!(kinds.contains(&TokenKind::Goto("=>".into())));
}

// =============================================================================
// Replica Staging
// =============================================================================

#[test]
fn replica_end_precedes_trailing_trivia() {
    let kinds = kinds("\" one\n\" two # aside\n");
    let first_end = kinds
        .iter()
        .position(|k| *k == TokenKind::ReplicaEnd)
        .unwrap();
    assert_eq!(kinds[first_end - 1], TokenKind::String("one".into()));
    assert_eq!(kinds[first_end + 1], TokenKind::Newline);
}

#[test]
fn replica_survives_block_comment() {
    let kinds = kinds("\" before /* note */ after\n");
    assert_eq!(
        kinds,
        vec![
            TokenKind::ReplicaBegin,
            TokenKind::String("before ".into()),
            TokenKind::BlockCommentBegin,
            TokenKind::CommentContent(" note ".into()),
            TokenKind::BlockCommentEnd,
            TokenKind::String(" after".into()),
            TokenKind::ReplicaEnd,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn replica_closed_by_tag() {
    let kinds = kinds("\" line @mood sad\n");
    assert_eq!(kinds[1], TokenKind::String("line ".into()));
    assert_eq!(kinds[2], TokenKind::ReplicaEnd);
    assert_eq!(kinds[3], TokenKind::Tag("mood".into()));
}

// =============================================================================
// Escaping
// =============================================================================

#[test]
fn escaped_markers_stay_in_text() {
    let kinds = kinds("\" a \\@b \\-> c \\# d\n");
    assert_eq!(kinds[1], TokenKind::String("a \\@b \\-> c \\# d".into()));
}

#[test]
fn escaped_choice_marker_is_not_a_choice() {
    let kinds = kinds("\\+ not a choice\n");
    assert!(!kinds.contains(&TokenKind::Choice));
    assert!(matches!(kinds[0], TokenKind::Error(_)));
}

// =============================================================================
// Positions
// =============================================================================

#[test]
fn token_positions_are_one_based() {
    let tokens = tokenize("== A\n  -> A");
    assert_eq!(tokens[0].span.start.line, 1);
    assert_eq!(tokens[0].span.start.column, 1);
    let goto = tokens
        .iter()
        .find(|t| matches!(t.kind, TokenKind::Goto(_)))
        .unwrap();
    assert_eq!(goto.span.start.line, 2);
    assert_eq!(goto.span.start.column, 3);
}

#[test]
fn token_text_matches_source() {
    let source = "@call:give(\"sword\", 2)\n";
    for token in tokenize(source) {
        if let TokenKind::CallArgument(value) = &token.kind {
            assert_eq!(token.text(source), value.as_str());
        }
    }
}
