//! Health command implementation

use crate::cli::HealthArgs;
use crate::client::ApiClient;
use crate::config::ParleyConfig;
use colored::Colorize;
use serde::Serialize;
use std::time::Instant;

#[derive(Serialize)]
pub struct HealthReport {
    pub base_url: String,
    pub healthy: bool,
    pub latency_ms: u64,
    pub version: String,
}

fn format_health_pretty(report: &HealthReport) -> String {
    let status = if report.healthy {
        "Healthy".green()
    } else {
        "Unreachable".red()
    };
    format!(
        "Service: {}\nStatus: {}\nLatency: {}ms",
        report.base_url, status, report.latency_ms
    )
}

/// Handle health command
pub async fn handle_health(
    args: &HealthArgs,
    config: &ParleyConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let client = ApiClient::new(&config.api);
    let start = Instant::now();
    let healthy = client.health_check().await;

    let report = HealthReport {
        base_url: client.base_url().to_string(),
        healthy,
        latency_ms: start.elapsed().as_millis() as u64,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    if args.json {
        Ok(serde_json::to_string_pretty(&report)?)
    } else {
        Ok(format_health_pretty(&report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConnectionArgs;
    use mockito::Server;
    use std::path::PathBuf;

    fn args(json: bool) -> HealthArgs {
        HealthArgs {
            json,
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
    async fn test_health_pretty_healthy() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"healthy"}"#)
            .create_async()
            .await;

        let output = handle_health(&args(false), &config_for(server.url()))
            .await
            .unwrap();
        assert!(output.contains("Healthy"));
        assert!(output.contains(&server.url()));
    }

    #[tokio::test]
    async fn test_health_json_unreachable() {
        let output = handle_health(&args(true), &config_for("http://127.0.0.1:9".to_string()))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["healthy"], false);
        assert!(parsed.get("latency_ms").is_some());
    }
}
