//! Configuration module for Parley
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`PARLEY_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use parley::config::ParleyConfig;
//!
//! let config = ParleyConfig::default();
//! assert_eq!(config.api.base_url, "http://localhost:8000");
//!
//! let toml = r#"
//! [api]
//! timeout_seconds = 10
//! "#;
//! let config: ParleyConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.api.timeout_seconds, 10);
//! assert_eq!(config.api.chat_path, "/chat/");
//! ```

pub mod api;
pub mod auth;
pub mod chat;
pub mod error;
pub mod logging;
pub mod storage;

pub use api::ApiConfig;
pub use auth::AuthConfig;
pub use chat::ChatConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use storage::StorageConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// User id sent when none is configured.
pub const DEFAULT_USER_ID: &str = "web_user";

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "parley.toml";

/// Unified configuration for the client and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParleyConfig {
    /// Remote service settings
    pub api: ApiConfig,
    /// Chat session settings
    pub chat: ChatConfig,
    /// Admin credentials
    pub auth: AuthConfig,
    /// Local state persistence
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides
    ///
    /// Supports PARLEY_* environment variables for common settings.
    /// Invalid values are ignored and the previous value is kept.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("PARLEY_API_BASE_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(timeout) = std::env::var("PARLEY_TIMEOUT_SECONDS") {
            if let Ok(t) = timeout.trim().parse() {
                self.api.timeout_seconds = t;
            }
        }
        if let Ok(user_id) = std::env::var("PARLEY_USER_ID") {
            if !user_id.trim().is_empty() {
                self.chat.user_id = user_id;
            }
        }
        if let Ok(locale) = std::env::var("PARLEY_LOCALE") {
            if let Ok(l) = locale.parse() {
                self.chat.locale = l;
            }
        }

        if let Ok(level) = std::env::var("PARLEY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PARLEY_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "api.base_url",
                format!("'{}' must start with http:// or https://", base_url),
            ));
        }
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "api.timeout_seconds",
                "timeout must be non-zero",
            ));
        }
        if !self.api.chat_path.starts_with('/') {
            return Err(ConfigError::invalid(
                "api.chat_path",
                "path must start with '/'",
            ));
        }
        if self.api.max_message_length == 0 {
            return Err(ConfigError::invalid(
                "api.max_message_length",
                "limit must be non-zero",
            ));
        }
        if self.chat.warning_threshold > self.api.max_message_length {
            return Err(ConfigError::invalid(
                "chat.warning_threshold",
                format!(
                    "threshold {} exceeds max_message_length {}",
                    self.chat.warning_threshold, self.api.max_message_length
                ),
            ));
        }
        if self.auth.token_env.trim().is_empty() {
            return Err(ConfigError::invalid(
                "auth.token_env",
                "variable name cannot be empty",
            ));
        }

        Ok(())
    }
}
