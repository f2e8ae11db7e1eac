use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::dashboard::ViewDefaults;
use crate::models::{Filter, ParseError, SortKey};
use crate::session::DEFAULT_MARKER_KEY;

/// Errors raised while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid view setting: {0}")]
    View(#[from] ParseError),
}

/// Configuration for the risk dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Scoring backend configuration
    pub backend: BackendConfig,
    /// Session persistence configuration
    pub session: SessionConfig,
    /// Initial selector values
    pub view: ViewConfig,
    /// Output configuration
    pub output: OutputConfig,
}

/// Scoring backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the scoring service
    pub base_url: String,
    /// Request timeout in seconds; unset means wait indefinitely
    pub timeout_seconds: Option<u64>,
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// SQLite file holding the session marker
    pub store_path: PathBuf,
    /// Key of the session marker
    pub marker_key: String,
}

/// Initial selector values, also restored on logout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// One of: all, normal, risk, high risk, suspicious
    pub default_filter: String,
    /// One of: id, score
    pub default_sort: String,
    /// Scoring model requested first
    pub default_model: String,
    /// Models offered to the operator
    pub models: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "console", "json" or "jsonl"
    pub format: String,
    /// Output file path (if format is not "console")
    pub file_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendConfig {
                base_url: "http://localhost:5000".to_string(),
                timeout_seconds: None,
            },
            session: SessionConfig {
                store_path: PathBuf::from("riskdash.db"),
                marker_key: DEFAULT_MARKER_KEY.to_string(),
            },
            view: ViewConfig {
                default_filter: "all".to_string(),
                default_sort: "id".to_string(),
                default_model: "iforest".to_string(),
                models: vec!["iforest".to_string(), "random".to_string()],
            },
            output: OutputConfig {
                format: "console".to_string(),
                file_path: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.view_defaults()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &PathBuf) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Parsed selector defaults for the controller
    pub fn view_defaults(&self) -> Result<ViewDefaults, ConfigError> {
        Ok(ViewDefaults {
            filter: self.view.default_filter.parse::<Filter>()?,
            sort_key: self.view.default_sort.parse::<SortKey>()?,
            model: self.view.default_model.clone(),
            models: self.view.models.clone(),
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.backend.timeout_seconds.map(Duration::from_secs)
    }
}
