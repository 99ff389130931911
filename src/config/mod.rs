//! Configuration management for feedsky.
//!
//! Configuration is read from `~/.config/feedsky/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! Credentials never live in this file: they come from the environment.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::Credentials;

pub const DEFAULT_FEED_URL: &str = "https://lobste.rs/newest.rss";
pub const DEFAULT_SERVICE_URL: &str = "https://bsky.social";

pub const USER_ENV: &str = "BLUESKY_USER";
pub const PASSWORD_ENV: &str = "BLUESKY_PASS";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub service: ServiceConfig,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// RSS feed to mirror
    pub url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the posting service (XRPC host)
    pub base_url: String,
    /// Timeout applied to every HTTP call, in seconds
    pub timeout_secs: u64,
    /// Language tag attached to each post
    pub language: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            timeout_secs: 10,
            language: "en".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Ledger database path (default: `<data dir>/feedsky/ledger.db`)
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/feedsky/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedsky").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# feedsky configuration
#
# Credentials are read from the environment, never from this file:
#   BLUESKY_USER  account handle or email
#   BLUESKY_PASS  app password

[feed]
url = "https://lobste.rs/newest.rss"

[service]
base_url = "https://bsky.social"

# Timeout for every HTTP call, in seconds
timeout_secs = 10

# Language tag attached to each post
language = "en"

[ledger]
# Where posted GUIDs and the cached session are kept.
# Defaults to the platform data directory.
# path = "/var/lib/feedsky/ledger.db"
"##
    }
}

impl Credentials {
    /// Read the login identifier and password from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let identifier = std::env::var(USER_ENV).map_err(|_| ConfigError::MissingEnv(USER_ENV))?;
        let password =
            std::env::var(PASSWORD_ENV).map_err(|_| ConfigError::MissingEnv(PASSWORD_ENV))?;
        Ok(Self::new(identifier, password))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
