//! Analyser configuration (`featcheck.toml`).
//!
//! ```toml
//! file-storage = "target/origins"
//! tasks = ["api-regions", "bundle-packages"]
//! ```

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "featcheck.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AnalyserConfig {
    /// Directory holding the origin properties files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_storage: Option<PathBuf>,
    /// Task ids to run, in order. Empty runs every task.
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl AnalyserConfig {
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, AnalysisError> {
        toml::from_str(raw).map_err(|source| AnalysisError::ParseConfig {
            path: origin.display().to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let raw = std::fs::read_to_string(path).map_err(|source| AnalysisError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&raw, path)?;
        tracing::debug!(path = %path.display(), tasks = config.tasks.len(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<AnalyserConfig, AnalysisError> {
        AnalyserConfig::from_toml_str(raw, Path::new("featcheck.toml"))
    }

    #[test]
    fn empty_config_runs_everything_without_origins() {
        let config = parse("").expect("empty config parses");
        assert_eq!(config, AnalyserConfig::default());
    }

    #[test]
    fn keys_are_kebab_case() {
        let config = parse("file-storage = \"store\"\ntasks = [\"api-regions\"]\n")
            .expect("config parses");
        assert_eq!(config.file_storage, Some(PathBuf::from("store")));
        assert_eq!(config.tasks, vec!["api-regions"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse("fileStorage = \"store\"\n").expect_err("camelCase key rejected");
        assert!(matches!(err, AnalysisError::ParseConfig { .. }));
        assert!(err.to_string().starts_with("invalid toml at featcheck.toml"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AnalyserConfig::load(Path::new("/nonexistent/featcheck.toml"))
            .expect_err("missing file");
        assert!(matches!(err, AnalysisError::ReadConfig { .. }));
    }
}
