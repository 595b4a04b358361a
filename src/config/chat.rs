//! Chat session configuration

use crate::chat::Locale;
use serde::{Deserialize, Serialize};

/// `[chat]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Sent as `user_id` with every chat request
    pub user_id: String,
    /// Input length at which the prompt starts showing a character counter
    pub warning_threshold: usize,
    /// Interval between connection checks in interactive mode (0 disables)
    pub health_poll_seconds: u64,
    /// Language of user-facing error messages
    pub locale: Locale,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            user_id: super::DEFAULT_USER_ID.to_string(),
            warning_threshold: 400,
            health_poll_seconds: 30,
            locale: Locale::En,
        }
    }
}
