//! Error types for analysis runs.
//!
//! Findings are never errors: they travel through the report sink. These
//! variants abort a run or a parse call.

use featcheck_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The region declaration is not a well-formed list of region records.
    #[error("malformed region declaration: {reason}")]
    MalformedDeclaration { reason: String },

    #[error("failed to read origin store {path}: {source}")]
    ReadOrigins {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseConfig {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown analyser task `{0}`")]
    UnknownTask(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AnalysisError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        AnalysisError::MalformedDeclaration {
            reason: reason.into(),
        }
    }
}
