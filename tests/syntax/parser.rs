//! Integration tests for the parser
//!
//! Tests parsing of story scripts into programs.

use kstory_syntax::{IssueKind, Lexer, ParseResult, Segment, Statement, parse, parse_all, parse_from_source};

const STORY: &str = r#"@chapter 1
== Intro
@mood calm
" Welcome. {call:playSound("bell")}
" The road splits.
@@once
+ Go left
  " You take the left path.
  -> Forest
+ ```Go right,
toward the river```
  @call:setFlag(river, true)
  -> River
== Forest
-> Intro
== River
-> Intro
"#;

fn messages(result: &ParseResult, kind: IssueKind) -> Vec<&str> {
    result
        .issues
        .iter()
        .filter(|i| i.kind == kind)
        .map(|i| i.message.as_str())
        .collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn two_sections_with_replica_and_goto() {
    let result = parse_from_source("== Intro\n\" hi\n== Next\n-> Intro\n");
    assert!(result.issues.is_empty(), "{:?}", result.issues);
    assert_eq!(result.program.section_names(), vec!["Intro", "Next"]);

    let intro = result.program.section("Intro").unwrap();
    assert_eq!(intro.statements[0].kind_name(), "replica");

    let next = result.program.section("Next").unwrap();
    assert_eq!(next.statements[0].kind_name(), "goto");
    assert_eq!(next.statements[0].as_goto().unwrap().target, "Intro");
}

#[test]
fn tags_and_choice_tags_keep_untrimmed_values() {
    let result = parse_from_source("@ui dark\n@@only true\n+ Hello\n");
    let statements = &result.program.sections[0].statements;
    assert_eq!(statements.len(), 1);

    let choice = statements[0].as_choice().unwrap();
    assert_eq!(choice.tags[0].name, "ui");
    assert_eq!(choice.tags[0].value.as_deref(), Some(" dark"));
    assert_eq!(choice.choice_tags[0].name, "@only");
    assert_eq!(choice.choice_tags[0].value.as_deref(), Some(" true"));
}

#[test]
fn choice_with_inline_text_and_body() {
    let result = parse_from_source("+ Hello\n  -> Next\n");
    let choice = result.program.sections[0].statements[0].as_choice().unwrap();
    assert_eq!(choice.inline_text.as_deref(), Some(" Hello"));

    let body = choice.body.as_ref().unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].as_goto().unwrap().target, "Next");
}

#[test]
fn replica_with_inline_call_has_three_segments() {
    let result = parse_from_source("\" Hello {call:say(1, \"x\")} world\n");
    let replica = result.program.sections[0].statements[0].as_replica().unwrap();
    assert_eq!(replica.segments.len(), 3);

    assert!(matches!(&replica.segments[0], Segment::Text { text, .. } if text == "Hello "));
    match &replica.segments[1] {
        Segment::InlineCall { name, args, .. } => {
            assert_eq!(name, "say");
            assert_eq!(args, &vec!["1".to_string(), "\"x\"".to_string()]);
        }
        other => panic!("expected inline call, got {other:?}"),
    }
    assert!(matches!(&replica.segments[2], Segment::Text { text, .. } if text == " world"));
}

// =============================================================================
// Boundaries
// =============================================================================

#[test]
fn empty_section_name_is_one_error() {
    let result = parse_from_source("== \n");
    let errors = messages(&result, IssueKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("section name"));
    assert!(result.program.sections.len() <= 1);
}

#[test]
fn goto_without_target_adds_no_statement() {
    let result = parse_from_source("-> \n");
    assert_eq!(messages(&result, IssueKind::Error).len(), 1);
    assert!(
        result
            .program
            .sections
            .iter()
            .all(|s| s.statements.iter().all(|st| st.as_goto().is_none()))
    );
}

#[test]
fn malformed_statement_does_not_stop_the_parse() {
    let result = parse_from_source("->\n-> A\n->\n-> B\n");
    assert_eq!(messages(&result, IssueKind::Error).len(), 2);
    let targets: Vec<_> = result.program.sections[0]
        .statements
        .iter()
        .filter_map(Statement::as_goto)
        .map(|g| g.target.as_str())
        .collect();
    assert_eq!(targets, vec!["A", "B"]);
}

#[test]
fn stray_text_before_first_header_is_kept_as_main() {
    let result = parse_from_source("garbage\n== A\n-> A\n");
    assert_eq!(result.program.section_names(), vec!["main", "A"]);
}

#[test]
fn empty_token_stream_still_has_a_section() {
    let result = parse(&[]);
    assert_eq!(result.program.section_names(), vec!["main"]);
}

// =============================================================================
// Whole Stories
// =============================================================================

#[test]
fn story_parses_cleanly() {
    let result = parse_from_source(STORY);
    assert!(result.issues.is_empty(), "{:?}", result.issues);
    assert_eq!(result.program.section_names(), vec!["Intro", "Forest", "River"]);
}

#[test]
fn story_leading_tag_attaches_to_first_section() {
    let result = parse_from_source(STORY);
    let intro = &result.program.sections[0];
    assert_eq!(intro.tags.len(), 1);
    assert_eq!(intro.tags[0].name, "chapter");
}

#[test]
fn story_intro_statements() {
    let result = parse_from_source(STORY);
    let intro = &result.program.sections[0];
    let kinds: Vec<_> = intro.statements.iter().map(Statement::kind_name).collect();
    assert_eq!(kinds, vec!["replica", "replica", "choice", "choice"]);

    let welcome = intro.statements[0].as_replica().unwrap();
    assert_eq!(welcome.tags[0].name, "mood");
    assert_eq!(welcome.text, "Welcome. ");
    assert_eq!(welcome.segments.len(), 2);
}

#[test]
fn story_choices() {
    let result = parse_from_source(STORY);
    let intro = &result.program.sections[0];

    let left = intro.statements[2].as_choice().unwrap();
    assert_eq!(left.choice_tags.len(), 1);
    assert_eq!(left.choice_tags[0].name, "@once");
    assert_eq!(left.body.as_ref().map(Vec::len), Some(2));

    let right = intro.statements[3].as_choice().unwrap();
    assert!(right.choice_tags.is_empty());
    assert_eq!(right.block_text.as_deref(), Some("Go right,\ntoward the river"));
    let body = right.body.as_ref().unwrap();
    let call = body[0].as_call().unwrap();
    assert_eq!(call.name, "setFlag");
    assert_eq!(call.args, vec!["river", "true"]);
    assert_eq!(body[1].as_goto().unwrap().target, "River");
}

#[test]
fn story_statement_at_finds_nested_goto() {
    let result = parse_from_source(STORY);
    let statement = result.program.statement_at(9, 5).unwrap();
    assert_eq!(statement.as_goto().unwrap().target, "Forest");

    let outer = result.program.statement_at(7, 1).unwrap();
    assert!(outer.as_choice().is_some());
}

#[test]
fn section_lookup_ignores_case() {
    let result = parse_from_source(STORY);
    assert!(result.program.section("forest").is_some());
    assert!(result.program.section("Nowhere").is_none());
}

// =============================================================================
// Entry Points
// =============================================================================

#[test]
fn entry_points_agree() {
    let tokens = Lexer::tokenize_all(STORY);
    let from_tokens = parse(&tokens);
    let from_source = parse_from_source(STORY);
    let all = parse_all(STORY);

    assert_eq!(from_tokens, from_source);
    assert_eq!(all.tokens, tokens);
    assert_eq!(all.program, from_source.program);
    assert_eq!(all.issues, from_source.issues);
}

#[test]
fn parse_issue_spans_point_at_source() {
    let source = "== A\n-> A\n  ->\n";
    let result = parse_from_source(source);
    let issue = &result.issues[0];
    let span = issue.span.unwrap();
    assert_eq!(span.start.line, 3);
    assert_eq!(span.text(source), "->");
}
