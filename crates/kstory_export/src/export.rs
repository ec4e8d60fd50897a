//! Encoding stories to bytes and files.

use std::fs;
use std::path::{Path, PathBuf};

use kstory_syntax::{Error, ParseResult, parse_all, validate, validate_tokens};

use crate::document::{ExportDocument, to_document};
use crate::error::{ExportError, Result};
use crate::options::{Encoding, ExportOptions};

/// What an export produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of exported sections.
    pub sections: usize,
    /// Error-level issues in the document.
    pub errors: usize,
    /// Warning-level issues in the document.
    pub warnings: usize,
    /// Size of the encoded output.
    pub bytes: usize,
}

/// Parses source text and builds its export document.
///
/// # Errors
///
/// In strict mode, returns [`ExportError::Invalid`] if any error-level issue
/// was found.
pub fn build_document(source: &str, options: &ExportOptions) -> Result<ExportDocument> {
    let parsed = parse_all(source);
    let mut result = ParseResult {
        program: parsed.program,
        issues: Vec::new(),
    };
    if options.include_validation {
        result.issues = validate_tokens(&parsed.tokens);
    }
    result.issues.extend(parsed.issues);
    if options.include_validation {
        result.issues.extend(validate(&result.program));
    }

    if options.strict {
        if let Some(err) = Error::from_issues(&result.issues) {
            tracing::debug!(issues = result.issues.len(), "strict export rejected story");
            return Err(err.into());
        }
    }

    // Validation already ran above.
    Ok(to_document(&result, &options.with_validation(false)))
}

/// Encodes a document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(document: &ExportDocument, options: &ExportOptions) -> Result<Vec<u8>> {
    let bytes = match (options.encoding, options.pretty) {
        (Encoding::Json, true) => serde_json::to_vec_pretty(document)?,
        (Encoding::Json, false) => serde_json::to_vec(document)?,
        (Encoding::MessagePack, _) => rmp_serde::to_vec_named(document)?,
    };
    Ok(bytes)
}

/// Parses source text and encodes it.
///
/// # Errors
///
/// Returns an error in strict mode when the story has errors, or if
/// serialization fails.
pub fn export_source(source: &str, options: &ExportOptions) -> Result<Vec<u8>> {
    encode(&build_document(source, options)?, options)
}

/// Reads `input`, exports it, and writes the result to `output`.
///
/// # Errors
///
/// Returns an error if the input cannot be read, the output cannot be
/// written, strict mode rejects the story, or serialization fails.
pub fn export_file(input: &Path, output: &Path, options: &ExportOptions) -> Result<ExportSummary> {
    let source = fs::read_to_string(input).map_err(|e| ExportError::io("read", input, e))?;
    tracing::debug!(path = %input.display(), bytes = source.len(), "read story");

    let document = build_document(&source, options)?;
    let bytes = encode(&document, options)?;
    fs::write(output, &bytes).map_err(|e| ExportError::io("write", output, e))?;

    let (errors, warnings) = document.issue_counts();
    let summary = ExportSummary {
        sections: document.section_count(),
        errors,
        warnings,
        bytes: bytes.len(),
    };
    tracing::info!(
        output = %output.display(),
        sections = summary.sections,
        errors,
        warnings,
        "exported story"
    );
    Ok(summary)
}

/// The input path with the encoding's extension.
#[must_use]
pub fn default_output_path(input: &Path, encoding: Encoding) -> PathBuf {
    input.with_extension(encoding.extension())
}
