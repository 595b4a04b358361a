//! Documents command implementation

use crate::cli::output::to_json;
use crate::cli::LoadArgs;
use crate::client::{ApiClient, DocumentSource, RequestConfig};
use crate::config::ParleyConfig;
use colored::Colorize;
use std::time::Duration;

/// Uploads and remote fetches get more time than a chat turn.
const LOAD_TIMEOUT_FACTOR: u32 = 4;

fn source_from_args(args: &LoadArgs) -> Result<DocumentSource, Box<dyn std::error::Error>> {
    if let Some(text) = &args.text {
        return Ok(DocumentSource::Text(text.clone()));
    }
    if let Some(url) = &args.url {
        return Ok(DocumentSource::Url(url.clone()));
    }
    if let Some(path) = &args.pdf {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        return Ok(DocumentSource::Pdf { filename, bytes });
    }
    Err("One of --text, --pdf or --url is required".into())
}

/// Handle `parley documents load`
pub async fn handle_load(
    args: &LoadArgs,
    config: &ParleyConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let source = source_from_args(args)?;
    let kind = source.kind();

    let timeout = Duration::from_millis(config.api.timeout_ms()) * LOAD_TIMEOUT_FACTOR;
    let client = ApiClient::new(&config.api);
    let response = client
        .load_documents(source, RequestConfig::new().timeout(timeout))
        .await?;

    tracing::info!(kind, source = ?response.source, "Documents loaded");

    if args.json {
        return Ok(to_json(&response)?);
    }

    let message = response
        .message
        .unwrap_or_else(|| format!("Loaded {} document", kind));
    match response.source {
        Some(source) => Ok(format!("{} {} ({})", "✓".green(), message, source)),
        None => Ok(format!("{} {}", "✓".green(), message)),
    }
}
