//! Integration tests for Layer 1: Export
//!
//! Tests for document shapes, encodings and file export.

mod export;
