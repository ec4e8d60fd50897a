//! Export configuration.

/// Shape of the exported document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Sections and statements without source positions.
    #[default]
    Simple,
    /// The full tree with spans on every node and issue.
    Full,
}

/// Binary encoding of the exported document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8 JSON.
    #[default]
    Json,
    /// `MessagePack` with named fields.
    MessagePack,
}

impl Encoding {
    /// File extension conventionally used for this encoding.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::MessagePack => "msgpack",
        }
    }
}

/// Options controlling what is exported and how it is encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Document shape.
    pub format: ExportFormat,
    /// Output encoding.
    pub encoding: Encoding,
    /// Indent JSON output. Ignored for `MessagePack`.
    pub pretty: bool,
    /// Fail instead of exporting when any error-level issue exists.
    pub strict: bool,
    /// Run the validator and include its issues (and lexer errors).
    pub include_validation: bool,
}

impl ExportOptions {
    /// Creates the default options: simple, compact JSON.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document shape.
    #[must_use]
    pub const fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the output encoding.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Enables or disables pretty JSON.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Enables or disables strict mode.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enables or disables validator issues in the output.
    #[must_use]
    pub const fn with_validation(mut self, include_validation: bool) -> Self {
        self.include_validation = include_validation;
        self
    }
}
