//! Catalog configuration, loaded from TOML.
//!
//! ```toml
//! [store]
//! enforce_lengths = true
//! optimistic_locking = true
//!
//! [seed]
//! directory_types = ["category", "collection", "format", "location", "path"]
//! action_statuses = ["pending", "complete", "failed"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MildredConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

/// `[store]` section: constraint enforcement knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Reject text longer than its column length.
    #[serde(default = "enabled")]
    pub enforce_lengths: bool,
    /// Reject updates whose version does not match the stored row.
    #[serde(default = "enabled")]
    pub optimistic_locking: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enforce_lengths: true,
            optimistic_locking: true,
        }
    }
}

/// `[seed]` section: rows created by `catalog::seed` when missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub directory_types: Vec<String>,
    #[serde(default)]
    pub action_statuses: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            directory_types: ["category", "collection", "format", "location", "path"]
                .into_iter()
                .map(String::from)
                .collect(),
            action_statuses: Vec::new(),
        }
    }
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl MildredConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = MildredConfig::from_toml_str("").unwrap();
        assert_eq!(config, MildredConfig::default());
        assert!(config.store.enforce_lengths);
        assert!(config.store.optimistic_locking);
        assert_eq!(config.seed.directory_types.len(), 5);
        assert!(config.seed.action_statuses.is_empty());
    }

    #[test]
    fn parses_all_sections() {
        let config = MildredConfig::from_toml_str(
            r#"
[store]
enforce_lengths = false

[seed]
directory_types = ["path"]
action_statuses = ["pending", "failed"]
"#,
        )
        .unwrap();
        assert!(!config.store.enforce_lengths);
        assert!(config.store.optimistic_locking);
        assert_eq!(config.seed.directory_types, vec!["path"]);
        assert_eq!(config.seed.action_statuses, vec!["pending", "failed"]);
    }

    #[test]
    fn rejects_wrong_types() {
        let err = MildredConfig::from_toml_str("[store]\nenforce_lengths = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mildred.toml");
        std::fs::write(&path, "[seed]\naction_statuses = [\"done\"]\n").unwrap();
        let config = MildredConfig::load(&path).unwrap();
        assert_eq!(config.seed.action_statuses, vec!["done"]);

        let missing = MildredConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
