//! Error types for descriptor loading and value parsing.

/// Errors arising while reading or parsing descriptor data.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json at {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A version string does not follow `major[.minor[.micro[.qualifier]]]`.
    #[error("invalid version `{input}`: {reason}")]
    InvalidVersion { input: String, reason: String },

    /// A version range is neither a bare version nor a bracketed interval.
    #[error("invalid version range `{input}`: {reason}")]
    InvalidVersionRange { input: String, reason: String },

    /// A filter expression does not follow the filter grammar.
    #[error("invalid filter `{input}` at offset {offset}: {reason}")]
    InvalidFilter {
        input: String,
        offset: usize,
        reason: String,
    },

    #[error("unsupported descriptor schema {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },
}
