//! User configuration (`<home>/config.toml`).
//!
//! Every key is optional; a missing file means built-in defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::io::retry::RetryPolicy;

/// Errors from reading the config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The file is not valid config TOML.
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
}

/// HTTP timeouts (`[fetch]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            connect_timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Retry policy parameters (`[retry]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    /// Build the runtime policy. At least one attempt is always made.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_secs(self.max_delay_secs),
            ..RetryPolicy::default()
        }
    }
}

/// Global configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Install destination; defaults to `<home>/bin`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,
    /// Extra descriptor directory; defaults to `<home>/formulas`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula_dir: Option<PathBuf>,
    /// HTTP timeouts.
    pub fetch: FetchConfig,
    /// Download retry policy.
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert!(cfg.bin_dir.is_none());
        assert_eq!(cfg.fetch.timeout(), Duration::from_secs(300));
        assert_eq!(cfg.fetch.connect_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.retry.max_attempts, 4);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            bin_dir = "/home/me/.local/bin"

            [fetch]
            timeout_secs = 60

            [retry]
            max_attempts = 2
            base_delay_ms = 100
        "#;
        let cfg: Config = toml::from_str(toml).unwrap();
        assert_eq!(cfg.bin_dir, Some(PathBuf::from("/home/me/.local/bin")));
        assert_eq!(cfg.fetch.timeout_secs, 60);
        // Unset keys inside a present section keep their defaults.
        assert_eq!(cfg.fetch.connect_timeout_secs, 30);
        assert_eq!(cfg.retry.max_attempts, 2);
        assert_eq!(cfg.retry.max_delay_secs, 30);

        let policy = cfg.retry.policy();
        assert_eq!(policy.base_delay, Duration::from_millis(100));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let cfg = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        assert_eq!(cfg.policy().max_attempts, 1);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[retry]\nmax_attempts = \"lots\"\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
