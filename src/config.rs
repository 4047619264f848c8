//! Configuration management for afconverge
//!
//! TOML configuration with defaults and validation.
//! Location: ~/.afconverge/config.toml

use crate::convergence::MachineConfig;
use crate::errors::{ConvergeError, Result};
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub machine: MachineConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub regions: RegionsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Focus-region geometry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionsConfig {
    /// Half-size of each focus rectangle in density-independent pixels
    pub radius_dp: f32,
    /// Display density multiplier
    pub density: f32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            radius_dp: 4.0,
            density: 1.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConvergeError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConvergeError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location, falling back to built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".afconverge").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.machine.stall_threshold == 0 {
            return Err(ConvergeError::ConfigError(
                "stall_threshold must be greater than 0".to_string(),
            ));
        }

        if self.session.channel_capacity == 0 {
            return Err(ConvergeError::ConfigError(
                "channel_capacity must be greater than 0".to_string(),
            ));
        }

        if self.regions.radius_dp <= 0.0 || self.regions.density <= 0.0 {
            return Err(ConvergeError::ConfigError(
                "radius_dp and density must be positive".to_string(),
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConvergeError::ConfigError(format!(
                    "Invalid log level: {}",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConvergeError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConvergeError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ConvergeError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Focus rectangle half-size in pixels
    pub fn focus_radius(&self) -> i32 {
        crate::regions::focus_radius(self.regions.radius_dp, self.regions.density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.machine.stall_threshold, 20);
        assert_eq!(config.session.timeout_ms, 5000);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_threshold() {
        let mut config = Config::default();
        config.machine.stall_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_density() {
        let mut config = Config::default();
        config.regions.density = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[machine]\nstall_threshold = 5\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.machine.stall_threshold, 5);
        assert_eq!(config.session.channel_capacity, 32);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.session.timeout_ms = 0;
        config.regions.density = 2.75;
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.session.timeout_ms, 0);
        assert_eq!(loaded.focus_radius(), 11);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[machine]\nstall_threshold = 0\n").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(ConvergeError::ConfigError(_))
        ));
    }
}
