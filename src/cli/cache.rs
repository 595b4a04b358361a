//! Cache command handlers

use crate::auth::{provider_from_config, StaticToken, TokenProvider};
use crate::chat::Notice;
use crate::cli::output::{format_cache_stats_table, format_vector_info_table, to_json};
use crate::cli::AdminArgs;
use crate::client::ApiClient;
use crate::config::ParleyConfig;
use colored::Colorize;

type CliResult = Result<String, Box<dyn std::error::Error>>;

/// Resolve the admin token: `--token` first, then the configured provider.
async fn admin_token(args: &AdminArgs, config: &ParleyConfig) -> Result<String, Box<dyn std::error::Error>> {
    let provider: Box<dyn TokenProvider> = match &args.token {
        Some(token) => Box::new(StaticToken::new(token.clone())),
        None => provider_from_config(&config.auth),
    };
    tracing::debug!(provider = provider.name(), "Resolving admin token");
    Ok(provider.token().await?)
}

/// Admin endpoints report some failures as `{"status": "error", "error": ...}` with a 200.
fn body_error(error: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    match error.filter(|e| !e.trim().is_empty()) {
        Some(e) => Err(format!("Server reported an error: {}", e).into()),
        None => Ok(()),
    }
}

/// Handle `parley cache stats`
pub async fn handle_cache_stats(args: &AdminArgs, config: &ParleyConfig) -> CliResult {
    let token = admin_token(args, config).await?;
    let stats = ApiClient::new(&config.api).cache_stats(&token).await?;
    body_error(stats.error.as_deref())?;

    if args.json {
        Ok(to_json(&stats)?)
    } else {
        Ok(format_cache_stats_table(&stats))
    }
}

/// Handle `parley cache clear`
pub async fn handle_cache_clear(args: &AdminArgs, config: &ParleyConfig) -> CliResult {
    let token = admin_token(args, config).await?;
    let ack = ApiClient::new(&config.api).clear_caches(&token).await?;
    body_error(ack.error.as_deref())?;

    if args.json {
        return Ok(to_json(&ack)?);
    }
    let message = ack
        .message
        .unwrap_or_else(|| config.chat.locale.text(Notice::CacheCleared));
    Ok(format!("{} {}", "✓".green(), message))
}

/// Handle `parley cache cleanup`
pub async fn handle_cache_cleanup(args: &AdminArgs, config: &ParleyConfig) -> CliResult {
    let token = admin_token(args, config).await?;
    let result = ApiClient::new(&config.api).cleanup_caches(&token).await?;
    body_error(result.error.as_deref())?;

    if args.json {
        return Ok(to_json(&result)?);
    }
    Ok(format!(
        "{} Removed {} expired {}",
        "✓".green(),
        result.removed,
        if result.removed == 1 { "entry" } else { "entries" }
    ))
}

/// Handle `parley cache vector-info`
pub async fn handle_vector_info(args: &AdminArgs, config: &ParleyConfig) -> CliResult {
    let token = admin_token(args, config).await?;
    let info = ApiClient::new(&config.api).vector_cache_info(&token).await?;
    body_error(info.error.as_deref())?;

    if args.json {
        Ok(to_json(&info)?)
    } else {
        Ok(format_vector_info_table(&info.vector_cache_info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConnectionArgs;
    use mockito::Server;
    use std::path::PathBuf;

    fn admin_args(json: bool) -> AdminArgs {
        AdminArgs {
            json,
            token: Some("test-token".to_string()),
            connection: ConnectionArgs {
                config: PathBuf::from("parley.toml"),
                base_url: None,
                timeout: None,
                log_level: None,
            },
        }
    }

    fn config_for(url: String) -> ParleyConfig {
        let mut config = ParleyConfig::default();
        config.api.base_url = url;
        config
    }

    #[tokio::test]
    async fn test_cache_clear_twice() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/admin/cache/clear")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"All caches cleared","status":"success"}"#)
            .expect(2)
            .create_async()
            .await;

        let config = config_for(server.url());
        let first = handle_cache_clear(&admin_args(false), &config).await.unwrap();
        let second = handle_cache_clear(&admin_args(false), &config).await.unwrap();

        mock.assert_async().await;
        assert!(first.contains("All caches cleared"));
        assert!(second.contains("All caches cleared"));
    }

    #[tokio::test]
    async fn test_cache_stats_error_body_is_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/admin/cache/stats")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"redis unavailable","status":"error"}"#)
            .create_async()
            .await;

        let err = handle_cache_stats(&admin_args(false), &config_for(server.url()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("redis unavailable"));
    }

    #[tokio::test]
    async fn test_cache_cleanup_reports_count() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/admin/cache/cleanup")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"removed_count":3,"status":"success"}"#)
            .create_async()
            .await;

        let output = handle_cache_cleanup(&admin_args(false), &config_for(server.url()))
            .await
            .unwrap();
        assert!(output.contains("Removed 3 expired entries"));
    }

    #[tokio::test]
    async fn test_vector_info_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/admin/vector-cache/info")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"vector_cache_info":{"cached_documents":8},"status":"success"}"#)
            .create_async()
            .await;

        let output = handle_vector_info(&admin_args(true), &config_for(server.url()))
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["vector_cache_info"]["cached_documents"], 8);
    }

    #[tokio::test]
    async fn test_missing_token_names_variable() {
        let mut args = admin_args(false);
        args.token = None;
        let mut config = config_for("http://127.0.0.1:9".to_string());
        config.auth.token_env = "PARLEY_TEST_NO_SUCH_TOKEN".to_string();

        let err = handle_cache_stats(&args, &config).await.unwrap_err();
        assert!(err.to_string().contains("PARLEY_TEST_NO_SUCH_TOKEN"));
    }
}
