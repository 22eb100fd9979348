use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::download::DownloadMode;
use crate::error::ConfigError;

/// Default browser-like user-agent. The episode host serves a blank page
/// to naive bot agents, so this is a functional default, not a security
/// mechanism.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Application configuration.
///
/// Every field has a documented default and a validated range; `validate`
/// must pass before the config is handed to the downloader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Destination directory for downloaded artifacts (default: `.`)
    pub download_dir: PathBuf,
    /// Which artifacts to retrieve (default: both)
    pub mode: DownloadMode,
    /// Per-attempt connect/read timeout in seconds (default 30, range 1-300)
    pub timeout_secs: u64,
    /// Maximum fetch attempts (default 3, range 1-10)
    pub max_retries: u32,
    /// Fixed delay between attempts in milliseconds (default 1000, max 60000)
    pub retry_delay_ms: u64,
    /// Upper bound on stream chunk size in bytes (default 64 KiB,
    /// range 1 KiB - 8 MiB)
    pub chunk_size: usize,
    /// User-agent header sent with every request
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            mode: DownloadMode::Both,
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
            chunk_size: 64 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=300).contains(&self.timeout_secs) {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: format!("{} is outside 1-300", self.timeout_secs),
            });
        }
        if !(1..=10).contains(&self.max_retries) {
            return Err(ConfigError::InvalidValue {
                field: "max_retries",
                reason: format!("{} is outside 1-10", self.max_retries),
            });
        }
        if self.retry_delay_ms > 60_000 {
            return Err(ConfigError::InvalidValue {
                field: "retry_delay_ms",
                reason: format!("{} exceeds 60000", self.retry_delay_ms),
            });
        }
        if !(1024..=8 * 1024 * 1024).contains(&self.chunk_size) {
            return Err(ConfigError::InvalidValue {
                field: "chunk_size",
                reason: format!("{} is outside 1 KiB - 8 MiB", self.chunk_size),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "user_agent",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Per-attempt timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay between fetch attempts as a Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
