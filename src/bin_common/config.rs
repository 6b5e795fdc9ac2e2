//! Listener configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Listener binary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Server root, e.g. https://cloud.example.com
    pub server_url: String,
    /// Username, overridable by NOTIFY_PUSH_USERNAME
    #[serde(default)]
    pub username: Option<String>,
    /// Password or app token, overridable by NOTIFY_PUSH_PASSWORD
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Topics to listen on
    pub topics: Vec<String>,
    /// Base retry interval in milliseconds
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Capacity of the dispatch queue
    #[serde(default = "default_dispatch_capacity")]
    pub dispatch_capacity: usize,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_retry_interval_ms() -> u64 {
    1000
}

fn default_dispatch_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ListenerConfig {
    /// Load configuration from YAML file and .env
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;

        // Don't fail if .env doesn't exist
        dotenv::dotenv().ok();

        Self::from_yaml(&yaml_content)
    }

    /// Parse, apply environment overrides and validate
    pub fn from_yaml(yaml_content: &str) -> Result<Self> {
        let mut config: ListenerConfig = serde_yaml::from_str(yaml_content)?;

        if let Ok(username) = std::env::var("NOTIFY_PUSH_USERNAME") {
            info!("Overriding username from environment variable");
            config.username = Some(username);
        }
        if let Ok(password) = std::env::var("NOTIFY_PUSH_PASSWORD") {
            config.password = Some(password);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(
                "server_url must start with http:// or https://".to_string(),
            ));
        }

        if self.username.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::EnvVarMissing("NOTIFY_PUSH_USERNAME".to_string()));
        }

        if self.password.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::EnvVarMissing("NOTIFY_PUSH_PASSWORD".to_string()));
        }

        if self.topics.is_empty() {
            return Err(ConfigError::ValidationError(
                "topics must list at least one topic".to_string(),
            ));
        }

        if let Some(topic) = self.topics.iter().find(|t| t.is_empty() || t.contains(' ')) {
            return Err(ConfigError::ValidationError(format!(
                "topic '{}' must be non-empty and contain no spaces",
                topic
            )));
        }

        if self.retry_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "retry_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.dispatch_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch_capacity must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Server: {}", self.server_url);
        info!("  Username: {}", self.username.as_deref().unwrap_or(""));
        info!("  Topics: {}", self.topics.join(", "));
        info!("  Retry interval: {} ms", self.retry_interval_ms);
        info!("  Dispatch capacity: {}", self.dispatch_capacity);
        info!("  Log level: {}", self.log_level);
    }
}
