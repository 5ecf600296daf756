//! Configuration for goal storage and logging

use crate::error::{GoalsError, Result};
use goals_common::{get_default_data_dir, DEFAULT_LOG_LEVEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Log levels accepted by `log_level`
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalsConfig {
    /// Directory holding the goal collection file
    pub data_dir: PathBuf,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Also write logs to this file
    pub log_file: Option<PathBuf>,
}

/// A partial configuration from one source; `None` fields leave the current value alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Read overrides from `GOALS_DATA_DIR`, `GOALS_LOG_LEVEL`, `GOALS_JSON_LOGS` and `GOALS_LOG_FILE`
    ///
    /// # Errors
    /// Returns `GoalsError::Configuration` if `GOALS_JSON_LOGS` is not a boolean
    pub fn from_env() -> Result<Self> {
        let json_logs = match std::env::var("GOALS_JSON_LOGS") {
            Ok(value) => Some(parse_bool(&value).ok_or_else(|| {
                GoalsError::configuration(format!("Invalid GOALS_JSON_LOGS value: '{value}'"))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            data_dir: non_empty_var("GOALS_DATA_DIR").map(PathBuf::from),
            log_level: non_empty_var("GOALS_LOG_LEVEL").map(|v| v.to_lowercase()),
            json_logs,
            log_file: non_empty_var("GOALS_LOG_FILE").map(PathBuf::from),
        })
    }

    /// Read overrides from a JSON or YAML file, chosen by extension
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GoalsError::configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        if is_yaml(path) {
            Ok(serde_yaml::from_str(&content)?)
        } else {
            serde_json::from_str(&content).map_err(|e| {
                GoalsError::configuration(format!("Failed to parse JSON config: {e}"))
            })
        }
    }
}

impl GoalsConfig {
    /// Create a configuration storing goals in `data_dir`
    #[must_use]
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            log_file: None,
        }
    }

    /// Create a configuration using `~/.goals`
    #[must_use]
    pub fn with_default_path() -> Self {
        Self::new(get_default_data_dir())
    }

    /// Defaults overlaid with environment variables
    ///
    /// # Errors
    /// Returns `GoalsError::Configuration` if an environment value is invalid
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply(ConfigOverrides::from_env()?);
        Ok(config)
    }

    /// Defaults overlaid with a JSON or YAML config file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::default();
        config.apply(ConfigOverrides::from_file(path)?);
        Ok(config)
    }

    /// Configuration rooted in a fresh temporary directory
    ///
    /// The directory is removed when the returned `TempDir` is dropped.
    ///
    /// # Errors
    /// Returns `GoalsError::Io` if the temporary directory cannot be created
    pub fn for_testing() -> Result<(Self, TempDir)> {
        let dir = TempDir::new()?;
        Ok((Self::new(dir.path()), dir))
    }

    /// Overlay every field the overrides set
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(data_dir) = overrides.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        if let Some(json_logs) = overrides.json_logs {
            self.json_logs = json_logs;
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
    }

    /// Save as JSON or YAML
    ///
    /// # Errors
    /// Returns an error for unknown formats or if the file cannot be written
    pub fn to_file<P: AsRef<Path>>(&self, path: P, format: &str) -> Result<()> {
        let content = match format {
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            "json" => serde_json::to_string_pretty(self)?,
            _ => {
                return Err(GoalsError::configuration(format!(
                    "Unsupported format: {format}"
                )))
            }
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// Returns `GoalsError::Configuration` describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(GoalsError::configuration("Data directory cannot be empty"));
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(GoalsError::configuration(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        if self
            .log_file
            .as_ref()
            .is_some_and(|p| p.file_name().is_none())
        {
            return Err(GoalsError::configuration("Log file must name a file"));
        }
        Ok(())
    }
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self::with_default_path()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "GOALS_DATA_DIR",
        "GOALS_LOG_LEVEL",
        "GOALS_JSON_LOGS",
        "GOALS_LOG_FILE",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_config_creation() {
        let config = GoalsConfig::new("/tmp/goals-data");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/goals-data"));
        assert_eq!(config.log_level, "warn");
        assert!(!config.json_logs);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_default_config() {
        let config = GoalsConfig::default();
        assert!(config.data_dir.ends_with(".goals"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_testing_dir_lives_with_guard() {
        let (config, dir) = GoalsConfig::for_testing().unwrap();
        assert!(config.data_dir.is_dir());
        assert_eq!(config.data_dir, dir.path());

        drop(dir);
        assert!(!config.data_dir.exists());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var("GOALS_DATA_DIR", "/custom/goals");
        std::env::set_var("GOALS_LOG_LEVEL", "DEBUG");
        std::env::set_var("GOALS_JSON_LOGS", "yes");

        let config = GoalsConfig::from_env().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/goals"));
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_without_variables() {
        clear_env();
        let config = GoalsConfig::from_env().unwrap();
        assert_eq!(config, GoalsConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_bool() {
        clear_env();
        std::env::set_var("GOALS_JSON_LOGS", "maybe");
        assert!(matches!(
            GoalsConfig::from_env(),
            Err(GoalsError::Configuration { .. })
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_blank_values() {
        clear_env();
        std::env::set_var("GOALS_DATA_DIR", "  ");
        let overrides = ConfigOverrides::from_env().unwrap();
        assert!(overrides.data_dir.is_none());
        clear_env();
    }

    #[test]
    fn test_from_file_json_and_yaml() {
        let dir = TempDir::new().unwrap();

        let json_path = dir.path().join("config.json");
        std::fs::write(&json_path, r#"{"data_dir": "/from/json", "json_logs": true}"#).unwrap();
        let config = GoalsConfig::from_file(&json_path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/json"));
        assert!(config.json_logs);
        assert_eq!(config.log_level, "warn");

        let yaml_path = dir.path().join("config.yml");
        std::fs::write(&yaml_path, "log_level: info\nlog_file: /tmp/goals.log\n").unwrap();
        let config = GoalsConfig::from_file(&yaml_path).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/goals.log")));
    }

    #[test]
    fn test_from_file_errors() {
        let dir = TempDir::new().unwrap();
        assert!(GoalsConfig::from_file(dir.path().join("missing.json")).is_err());

        let bad_yaml = dir.path().join("bad.yaml");
        std::fs::write(&bad_yaml, "log_level: [unclosed").unwrap();
        assert!(matches!(
            GoalsConfig::from_file(&bad_yaml),
            Err(GoalsError::Configuration { .. })
        ));

        let unknown = dir.path().join("unknown.json");
        std::fs::write(&unknown, r#"{"database_path": "/x"}"#).unwrap();
        assert!(GoalsConfig::from_file(&unknown).is_err());
    }

    #[test]
    fn test_to_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut config = GoalsConfig::new(dir.path());
        config.log_level = "info".to_string();

        for format in ["json", "yaml"] {
            let path = dir.path().join(format!("config.{format}"));
            config.to_file(&path, format).unwrap();
            assert_eq!(GoalsConfig::from_file(&path).unwrap(), config);
        }

        assert!(config.to_file(dir.path().join("config.toml"), "toml").is_err());
    }

    #[test]
    fn test_apply_only_overrides_set_fields() {
        let mut config = GoalsConfig::new("/base");
        config.apply(ConfigOverrides {
            log_level: Some("error".to_string()),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.data_dir, PathBuf::from("/base"));
        assert_eq!(config.log_level, "error");
    }

    #[test]
    fn test_validate() {
        let mut config = GoalsConfig::new("/data");
        assert!(config.validate().is_ok());

        config.log_level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));

        let config = GoalsConfig::new("");
        assert!(config.validate().is_err());
    }
}
