//! Configuration management for graypipe.
//!
//! Configuration is loaded from the platform config directory with defaults
//! that reproduce the reference four-image benchmark run.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for graypipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source list and destination derivation
    pub paths: PathsConfig,

    /// Channel and failure settings
    pub pipeline: PipelineConfig,

    /// Resize settings
    pub transform: TransformConfig,

    /// Output image settings
    pub output: OutputConfig,

    /// Report file settings
    pub report: ReportConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.graypipe.graypipe/config.toml
    /// - Linux: ~/.config/graypipe/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\graypipe\config\config.toml
    ///
    /// Falls back to ~/.graypipe/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "graypipe", "graypipe")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".graypipe").join("config.toml")
            })
    }

    /// Resolved report file path (with ~ expansion).
    pub fn report_path(&self) -> PathBuf {
        expand(&self.report.path)
    }

    /// Resolved telemetry log path, or `None` when the file sink is disabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        if self.logging.file.is_empty() {
            None
        } else {
            Some(expand(&self.logging.file))
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
