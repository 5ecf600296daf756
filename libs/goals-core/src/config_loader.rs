//! Configuration Loader
//!
//! Resolves a [`GoalsConfig`] from defaults, config files and environment
//! variables, in increasing order of precedence.

use crate::config::{ConfigOverrides, GoalsConfig};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration loader that layers multiple sources
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Starting configuration
    base_config: GoalsConfig,
    /// Configuration files applied in order; later files win
    config_paths: Vec<PathBuf>,
    /// Whether environment variables are applied last
    load_from_env: bool,
    /// Whether to validate the final configuration
    validate: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_config: GoalsConfig::default(),
            config_paths: Self::get_default_config_paths(),
            load_from_env: true,
            validate: true,
        }
    }

    #[must_use]
    pub fn with_base_config(mut self, config: GoalsConfig) -> Self {
        self.base_config = config;
        self
    }

    #[must_use]
    pub fn add_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_paths.push(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_config_paths<P: AsRef<Path>>(mut self, paths: Vec<P>) -> Self {
        self.config_paths = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    #[must_use]
    pub fn with_env_loading(mut self, enabled: bool) -> Self {
        self.load_from_env = enabled;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Load configuration from all sources
    ///
    /// Unreadable files and invalid environment values are logged and
    /// skipped; only a failing final validation is an error.
    ///
    /// # Errors
    /// Returns an error if validation is enabled and the result is invalid
    pub fn load(&self) -> Result<GoalsConfig> {
        let mut config = self.base_config.clone();

        for path in &self.config_paths {
            if !path.exists() {
                debug!("Configuration file not found: {}", path.display());
                continue;
            }
            match ConfigOverrides::from_file(path) {
                Ok(overrides) => {
                    config.apply(overrides);
                    info!("Loaded configuration from {}", path.display());
                }
                Err(e) => warn!("Failed to load configuration from {}: {}", path.display(), e),
            }
        }

        if self.load_from_env {
            match ConfigOverrides::from_env() {
                Ok(overrides) => config.apply(overrides),
                Err(e) => warn!("Ignoring environment configuration: {}", e),
            }
        }

        if self.validate {
            config.validate()?;
        }

        debug!(data_dir = %config.data_dir.display(), "Configuration resolved");
        Ok(config)
    }

    /// Config files tried by default, in order
    #[must_use]
    pub fn get_default_config_paths() -> Vec<PathBuf> {
        let user_dir = Self::get_user_config_dir();
        vec![
            user_dir.join("config.json"),
            user_dir.join("config.yaml"),
            user_dir.join("config.yml"),
            PathBuf::from("goals-config.json"),
            PathBuf::from("goals-config.yaml"),
            PathBuf::from("goals-config.yml"),
        ]
    }

    /// Per-user configuration directory
    #[must_use]
    pub fn get_user_config_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config").join("goals")
        } else if let Ok(userprofile) = std::env::var("USERPROFILE") {
            PathBuf::from(userprofile)
                .join("AppData")
                .join("Roaming")
                .join("goals")
        } else {
            PathBuf::from("~/.config/goals")
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from the default locations and the environment
///
/// # Errors
/// Returns an error if the resolved configuration is invalid
pub fn load_config() -> Result<GoalsConfig> {
    ConfigLoader::new().load()
}
