//! Remote API configuration

use serde::{Deserialize, Serialize};

/// `[api]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Service root, without trailing slash
    pub base_url: String,
    /// Per-request deadline
    pub timeout_seconds: u64,
    /// Path of the chat endpoint
    pub chat_path: String,
    /// Longest accepted chat message, in characters
    pub max_message_length: usize,
}

impl ApiConfig {
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_seconds.saturating_mul(1000)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 30,
            chat_path: "/chat/".to_string(),
            max_message_length: 500,
        }
    }
}
