//! Bearer tokens for admin endpoints.
//!
//! Where a token comes from is not this crate's concern; a [`TokenProvider`]
//! hands one over on demand. The CLI uses [`EnvToken`] or [`StaticToken`].

use crate::config::AuthConfig;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("No admin token found. Set the {0} environment variable or auth.token in the config file")]
    Missing(String),

    #[error("Admin token provider failed: {0}")]
    Provider(String),
}

/// Source of a bearer token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a current token. Implementations may refresh it.
    async fn token(&self) -> Result<String, AuthError>;

    fn name(&self) -> &str;
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, AuthError> {
        if self.0.trim().is_empty() {
            return Err(AuthError::Missing("auth.token".to_string()));
        }
        Ok(self.0.trim().to_string())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

#[async_trait]
impl TokenProvider for EnvToken {
    async fn token(&self) -> Result<String, AuthError> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(AuthError::Missing(self.var.clone())),
        }
    }

    fn name(&self) -> &str {
        "env"
    }
}

/// Pick the provider described by the `[auth]` section.
pub fn provider_from_config(config: &AuthConfig) -> Box<dyn TokenProvider> {
    match &config.token {
        Some(token) if !token.trim().is_empty() => Box::new(StaticToken::new(token.clone())),
        _ => Box::new(EnvToken::new(config.token_env.clone())),
    }
}
