//! Configuration management
//!
//! This module handles loading, validation, and management of the askme
//! configuration. Configuration is stored in TOML format at
//! `~/.askme/config.toml`.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **assistant**: Remote API endpoint, assistant id, greeting and polling
//!   bounds
//!
//! The API key is deliberately not part of this file: it is read once from
//! the `OPENAI_API_KEY` environment variable at startup (see
//! [`crate::secrets::api_key_from_env`]) and injected into the engine as an
//! explicit value.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Anything wrong with reading, parsing or validating the file
    #[error("Configuration error: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Remote assistant settings
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Remote assistant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Base URL for the Assistants API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Assistant identifier; a fixed per-deployment value
    #[serde(default = "default_assistant_id")]
    pub assistant_id: String,

    /// Greeting message seeded into every new session
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Interval between run status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on total polling time for one run, in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl AssistantConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Poll deadline as a [`Duration`].
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_assistant_id() -> String {
    // Deployment constant for the published profile page.
    "asst_SAWgJNTGMIoidRR5FbUV4ATK".to_string()
}

fn default_greeting() -> String {
    "Hello! Ask me anything about my experience and background.".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_timeout_secs() -> u64 {
    120
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            assistant_id: default_assistant_id(),
            greeting: default_greeting(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.askme/config.toml).
    ///
    /// If the configuration file doesn't exist, creates a default one.
    /// Validates the configuration after loading.
    pub fn load_or_create() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Invalid(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration and save it to `path`.
    fn create_default(path: &Path) -> Result<Self, ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Invalid(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();
        config.validate()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Invalid(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.askme/config.toml).
    fn default_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::Invalid("Could not determine home directory".to_string()))?;

        Ok(home.join(".askme").join("config.toml"))
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.assistant.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "assistant.base_url must not be empty".to_string(),
            ));
        }

        if self.assistant.assistant_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "assistant.assistant_id must not be empty".to_string(),
            ));
        }

        if self.assistant.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "assistant.poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.assistant.poll_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "assistant.poll_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
