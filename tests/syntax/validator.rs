//! Integration tests for the validator
//!
//! Tests semantic checks over parsed stories and the combined diagnostics pass.

use kstory_syntax::{Issue, IssueKind, check, parse_all, parse_from_source, validate, validate_tokens};

fn validate_source(source: &str) -> Vec<Issue> {
    validate(&parse_from_source(source).program)
}

fn messages(issues: &[Issue], kind: IssueKind) -> Vec<&str> {
    issues
        .iter()
        .filter(|i| i.kind == kind)
        .map(|i| i.message.as_str())
        .collect()
}

// =============================================================================
// References
// =============================================================================

#[test]
fn connected_story_is_clean() {
    let issues = validate_source("== Start\n-> End\n== End\n-> Start\n");
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn each_missing_target_is_one_error() {
    let issues = validate_source("== A\n-> Gone\n+ pick\n  -> Lost\n-> A\n");
    assert_eq!(
        messages(&issues, IssueKind::Error),
        vec!["Goto target not found: 'Gone'", "Goto target not found: 'Lost'"]
    );
}

#[test]
fn each_unreferenced_section_is_one_warning() {
    let issues = validate_source("== Hub\n-> Hub\n== Attic\n-> Hub\n== Cellar\n-> Hub\n");
    assert_eq!(
        messages(&issues, IssueKind::Warning),
        vec!["Unreferenced section: 'Attic'", "Unreferenced section: 'Cellar'"]
    );
}

#[test]
fn targets_resolve_ignoring_case() {
    let issues = validate_source("== Forest\n-> FOREST\n");
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn implicit_main_is_never_unreferenced() {
    let issues = validate_source("\" opening line\n== Next\n-> Next\n");
    assert!(issues.is_empty(), "{issues:?}");
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn duplicate_sections_reported_once_at_first() {
    let source = "== Room\n-> room\n== room\n-> Room\n== ROOM\n-> Room\n";
    let issues = validate_source(source);
    let duplicates: Vec<_> = issues
        .iter()
        .filter(|i| i.message.starts_with("Duplicate section name"))
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(
        duplicates[0].message,
        "Duplicate section name: 'Room' is defined 3 times"
    );
    assert_eq!(duplicates[0].span.map(|s| s.start.line), Some(1));
}

#[test]
fn duplicate_choice_tags() {
    let issues = validate_source("@@once\n@@ONCE\n+ Pick\n  -> main\n");
    assert_eq!(
        messages(&issues, IssueKind::Error),
        vec!["Duplicate choice tag '@ONCE'"]
    );
}

#[test]
fn empty_section_and_empty_choice_warn() {
    let issues = validate_source("== Quiet\n== Loud\n+\n-> Quiet\n");
    let warnings = messages(&issues, IssueKind::Warning);
    assert!(warnings.contains(&"Section 'Quiet' has no statements"));
    assert!(warnings.contains(&"Empty choice in section 'Loud'"));
}

#[test]
fn replica_of_only_inline_calls_warns_empty() {
    let issues = validate_source("\" {call:pause(2)}\n");
    assert_eq!(messages(&issues, IssueKind::Warning), vec!["Empty replica text"]);
    assert!(messages(&issues, IssueKind::Error).is_empty());
}

#[test]
fn validation_is_repeatable() {
    let program = parse_from_source("== A\n-> B\n== A\n== C\n+\n").program;
    let first = validate(&program);
    let second = validate(&program);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn token_errors_are_reported_separately() {
    let document = parse_all("== A\nloose words\n-> A\n");
    let lexical = validate_tokens(&document.tokens);
    assert_eq!(lexical.len(), 1);
    assert_eq!(lexical[0].message, "Lexing error: loose words");
    assert!(validate(&document.program).is_empty());
}

#[test]
fn check_orders_issues_by_stage() {
    let diagnostics = check("stray\n->\n-> Missing\n");
    let messages: Vec<_> = diagnostics.issues.iter().map(|i| i.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Lexing error: stray",
            "Goto must be followed by a target name",
            "Goto target not found: 'Missing'",
        ]
    );
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.of_kind(IssueKind::Warning).count(), 0);
}

#[test]
fn issue_display_includes_position() {
    let diagnostics = check("== A\n-> A\n-> B\n");
    let issue = diagnostics.of_kind(IssueKind::Error).next().unwrap();
    assert_eq!(issue.to_string(), "3:1: error: Goto target not found: 'B'");
}
