//! Search configuration via `kubesearch.toml`
//!
//! On first start a default `kubesearch.toml` can be written next to the
//! process. To change settings, edit the file and restart.

use kubesearch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::Level;

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "kubesearch.toml";

/// Search configuration loaded from `kubesearch.toml`.
///
/// # Example
///
/// ```toml
/// # Kinds of object to index
/// kinds = ["Deployment", "Pod"]
///
/// # Log level: trace, debug, info, warn or error
/// log_level = "info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Kinds of object to index, one worker each.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<String>,
    /// Log level for the fmt subscriber.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_kinds() -> Vec<String> {
    vec!["Deployment".to_string(), "Pod".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            kinds: default_kinds(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Parse the log level string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the level is not one of
    /// trace/debug/info/warn/error.
    pub fn level(&self) -> Result<Level> {
        self.log_level.parse::<Level>().map_err(|_| {
            Error::Config(format!(
                "Invalid log level '{}'. Expected trace, debug, info, warn or error.",
                self.log_level
            ))
        })
    }

    /// Check the kinds list and the log level.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty kind list, a blank kind, a
    /// duplicate kind or an invalid log level.
    pub fn validate(&self) -> Result<()> {
        if self.kinds.is_empty() {
            return Err(Error::Config("At least one kind must be indexed".to_string()));
        }
        let mut seen = HashSet::new();
        for kind in &self.kinds {
            if kind.trim().is_empty() {
                return Err(Error::Config("Kind names must not be blank".to_string()));
            }
            if !seen.insert(kind.as_str()) {
                return Err(Error::Config(format!("Kind '{}' listed twice", kind)));
            }
        }
        self.level()?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# kubesearch configuration
#
# Kinds of object to index. Each kind gets its own change feed and
# indexing worker.
kinds = ["Deployment", "Pod"]

# Log level: "trace", "debug", "info" (default), "warn" or "error"
log_level = "info"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SearchConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_indexes_deployments_and_pods() {
        let config = SearchConfig::default();
        assert_eq!(config.kinds, vec!["Deployment", "Pod"]);
        assert_eq!(config.level().unwrap(), Level::INFO);
        config.validate().unwrap();
    }

    #[test]
    fn default_toml_parses_correctly() {
        let config: SearchConfig = toml::from_str(SearchConfig::default_toml()).unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn parse_custom_kinds() {
        let config: SearchConfig = toml::from_str(r#"kinds = ["Service"]"#).unwrap();
        assert_eq!(config.kinds, vec!["Service"]);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn invalid_level_returns_error() {
        let config: SearchConfig = toml::from_str(r#"log_level = "loud""#).unwrap();
        assert!(matches!(config.level(), Err(Error::Config(_))));
    }

    #[test]
    fn duplicate_kind_fails_validation() {
        let config: SearchConfig = toml::from_str(r#"kinds = ["Pod", "Pod"]"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_kinds_fails_validation() {
        let config: SearchConfig = toml::from_str("kinds = []").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        SearchConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());

        let config = SearchConfig::from_file(&path).unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();

        SearchConfig::write_default_if_missing(&path).unwrap();

        let config = SearchConfig::from_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn from_file_with_missing_field_uses_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();

        let config = SearchConfig::from_file(&path).unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = SearchConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn from_file_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "kinds = 3\n").unwrap();
        assert!(matches!(SearchConfig::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = SearchConfig {
            kinds: vec!["Service".to_string(), "ConfigMap".to_string()],
            log_level: "warn".to_string(),
        };

        config.write_to_file(&path).unwrap();
        assert_eq!(SearchConfig::from_file(&path).unwrap(), config);
    }
}
