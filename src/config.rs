use crate::error::{LogsmithError, Result};
use crate::handler::{DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logging configuration loadable from a TOML or JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory where log files are written
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Minimum severity applied to every handler
    #[serde(default)]
    pub level: Severity,

    /// Whether to also emit to the console
    #[serde(default)]
    pub console: bool,

    /// Optional size-based rotation settings
    #[serde(default)]
    pub rotation: Option<RotationConfig>,
}

/// Size-based rotation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Maximum file size in bytes before rollover
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Number of rotated backup files to keep
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,
}

// Default value functions for serde
fn default_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn default_backup_count() -> usize {
    DEFAULT_BACKUP_COUNT
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            level: Severity::default(),
            console: false,
            rotation: None,
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            backup_count: default_backup_count(),
        }
    }
}

impl LogConfig {
    /// Load configuration from a file (supports TOML and JSON).
    ///
    /// # Arguments
    /// * `path` - Config file; the extension selects the parser
    ///
    /// # Returns
    /// * `Ok(LogConfig)` - Parsed and validated configuration
    /// * `Err(LogsmithError)` - Unreadable file, unsupported extension,
    ///   parse failure, or invalid values
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LogsmithError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let config: LogConfig = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| LogsmithError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| LogsmithError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(LogsmithError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(LogsmithError::InvalidConfig(
                "Log directory cannot be empty".to_string(),
            ));
        }

        if let Some(rotation) = &self.rotation {
            if rotation.max_bytes == 0 {
                return Err(LogsmithError::InvalidConfig(
                    "Rotation max_bytes must be greater than zero".to_string(),
                ));
            }
            if rotation.backup_count == 0 {
                return Err(LogsmithError::InvalidConfig(
                    "Rotation backup_count must be greater than zero".to_string(),
                ));
            }
        }

        Ok(())
    }
}
