//! Integration tests for story export
//!
//! Tests the exported document shapes, both encodings and file export.

use std::fs;
use std::path::PathBuf;

use kstory_export::{
    Encoding, ExportDocument, ExportError, ExportFormat, ExportOptions, FORMAT_VERSION,
    build_document, default_output_path, export_file, export_source,
};
use serde_json::Value;

const STORY: &str = r#"== Intro
@mood calm
" Hello {call:wave(1)} there
@@once
+ ```Leave
quietly```
  -> Outro
== Outro
-> Intro
"#;

fn json(source: &str, options: &ExportOptions) -> Value {
    serde_json::from_slice(&export_source(source, options).unwrap()).unwrap()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("kstory-export-{}-{name}", std::process::id()))
}

// =============================================================================
// Document Shapes
// =============================================================================

#[test]
fn simple_export_has_no_positions() {
    let value = json(STORY, &ExportOptions::new());
    assert_eq!(value["metadata"]["version"], FORMAT_VERSION);
    assert_eq!(value["metadata"]["format"], "simple");

    let text = value.to_string();
    assert!(!text.contains("\"span\""));
    assert!(!text.contains("\"offset\""));
}

#[test]
fn simple_export_statements() {
    let value = json(STORY, &ExportOptions::new());
    let intro = &value["sections"][0];
    assert_eq!(intro["name"], "Intro");

    let replica = &intro["statements"][0];
    assert_eq!(replica["type"], "replica");
    assert_eq!(replica["text"], "Hello  there");
    assert_eq!(replica["tags"][0]["name"], "mood");
    assert_eq!(replica["tags"][0]["value"], " calm");
    assert_eq!(replica["segments"][1]["type"], "inline_call");
    assert_eq!(replica["segments"][1]["name"], "wave");

    let choice = &intro["statements"][1];
    assert_eq!(choice["type"], "choice");
    assert_eq!(choice["choice_text"], "Leave\nquietly");
    assert_eq!(choice["choice_tags"][0]["name"], "@once");
    assert_eq!(choice["body"][0]["type"], "goto");
    assert_eq!(choice["body"][0]["target"], "Outro");
}

#[test]
fn full_export_keeps_positions() {
    let options = ExportOptions::new().with_format(ExportFormat::Full);
    let value = json(STORY, &options);
    assert_eq!(value["metadata"]["format"], "full");

    let choice = &value["sections"][0]["statements"][1];
    assert_eq!(choice["block_text"], "Leave\nquietly");
    assert!(choice["inline_text"].is_null());
    assert_eq!(choice["span"]["start"]["line"], 5);
}

#[test]
fn issues_are_exported() {
    let options = ExportOptions::new().with_validation(true);
    let value = json("== A\n-> B\n->\n", &options);
    let issues = value["metadata"]["issues"].as_array().unwrap();
    let messages: Vec<_> = issues.iter().map(|i| i["message"].as_str().unwrap()).collect();
    assert_eq!(
        messages,
        vec![
            "Goto must be followed by a target name",
            "Goto target not found: 'B'",
            "Unreferenced section: 'A'",
        ]
    );
    assert_eq!(issues[0]["kind"], "error");
    assert_eq!(issues[2]["kind"], "warning");
}

// =============================================================================
// Encodings
// =============================================================================

#[test]
fn msgpack_matches_json_content() {
    let packed = export_source(
        STORY,
        &ExportOptions::new().with_encoding(Encoding::MessagePack),
    )
    .unwrap();
    let unpacked: Value = rmp_serde::from_slice(&packed).unwrap();
    let plain = json(STORY, &ExportOptions::new());
    assert_eq!(unpacked["sections"], plain["sections"]);
}

#[test]
fn pretty_json_is_multiline() {
    let compact = export_source(STORY, &ExportOptions::new()).unwrap();
    let pretty = export_source(STORY, &ExportOptions::new().with_pretty(true)).unwrap();
    assert!(!compact.contains(&b'\n'));
    assert!(pretty.contains(&b'\n'));
}

// =============================================================================
// Strict Mode
// =============================================================================

#[test]
fn strict_mode_rejects_errors_only() {
    let strict = ExportOptions::new().with_strict(true);
    assert!(build_document("== Lonely\n\" hi\n", &strict.with_validation(true)).is_ok());

    let err = build_document("== \n", &strict).unwrap_err();
    assert!(matches!(err, ExportError::Invalid(_)));
    assert!(err.to_string().contains("1 error(s)"));
}

#[test]
fn lenient_mode_exports_broken_stories() {
    let document = build_document("->\n== \n", &ExportOptions::new()).unwrap();
    assert_eq!(document.issue_counts(), (2, 0));
    assert!(matches!(document, ExportDocument::Simple(_)));
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn export_file_writes_output() {
    let input = temp_path("story.ks");
    let output = default_output_path(&input, Encoding::Json);
    fs::write(&input, STORY).unwrap();

    let summary = export_file(&input, &output, &ExportOptions::new()).unwrap();
    assert_eq!(summary.sections, 2);
    assert_eq!((summary.errors, summary.warnings), (0, 0));

    let written = fs::read(&output).unwrap();
    assert_eq!(summary.bytes, written.len());
    let value: Value = serde_json::from_slice(&written).unwrap();
    assert_eq!(value["sections"][1]["name"], "Outro");

    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&output);
}

#[test]
fn export_file_missing_input() {
    let input = temp_path("missing.ks");
    let output = temp_path("missing.json");
    let err = export_file(&input, &output, &ExportOptions::new()).unwrap_err();
    assert!(matches!(err, ExportError::Io { action: "read", .. }));
    assert!(err.to_string().starts_with("failed to read"));
    assert!(!output.exists());
}
