//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with GUESTBOOK_)
//! 2. Config file (config.toml)
//! 3. Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Submission limits and the posting cooldown
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum name length in Unicode characters
    pub max_name_len: usize,
    /// Maximum message length in Unicode characters
    pub max_message_len: usize,
    /// Number of entries shown, newest first
    pub show_limit: usize,
    /// Wait between two posts per submitter, in seconds
    pub cooldown_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_name_len: 50,
            max_message_len: 2000,
            show_limit: 200,
            cooldown_secs: crate::rate_limit::DEFAULT_COOLDOWN_SECS,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the entry log and the rate-limit markers
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "guestbook_data".to_string(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from config.toml and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("GUESTBOOK").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Path of the append-only entry log.
    pub fn entries_file(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join("entries.jsonl")
    }

    /// Directory holding one cooldown marker per submitter.
    pub fn rate_dir(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join("rate")
    }
}
