//! Admin credential configuration

use serde::{Deserialize, Serialize};

/// `[auth]` section
///
/// The admin token is normally read from the environment variable named by
/// `token_env`. An inline `token` is accepted for local setups and wins when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: "PARLEY_ADMIN_TOKEN".to_string(),
            token: None,
        }
    }
}
