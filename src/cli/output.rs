//! Output formatting helpers for CLI commands

use crate::chat::{ConnectionStatus, Message, Role};
use crate::client::{CacheStats, RetrievedContext, VectorCacheInfo};
use crate::format::{format_timestamp, TimestampStyle};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

/// Longest context snippet shown in the sources table.
const SNIPPET_CHARS: usize = 80;

/// Pretty JSON for `--json` output.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Colored label for a connection state
pub fn connection_label(status: ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Connected => "Connected".green().to_string(),
        ConnectionStatus::Connecting => "Connecting".yellow().to_string(),
        ConnectionStatus::Disconnected => "Disconnected".dimmed().to_string(),
        ConnectionStatus::Error => "Unreachable".red().to_string(),
    }
}

/// One transcript line: `[14:05] assistant: text`
pub fn render_message(message: &Message) -> String {
    let time = format_timestamp(message.created_at, TimestampStyle::Time);
    let who = match message.role {
        Role::User => "you".cyan().bold(),
        Role::Assistant => "assistant".green().bold(),
        Role::Error => "error".red().bold(),
        Role::System => "system".yellow().bold(),
    };
    let text = match message.role {
        Role::Error => message.text.red().to_string(),
        _ => message.text.clone(),
    };
    format!("{} {}: {}", format!("[{}]", time).dimmed(), who, text)
}

/// Format retrieved context as a table
pub fn format_sources_table(sources: &[RetrievedContext]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Source", "Similarity", "Excerpt"]);

    for s in sources {
        table.add_row(vec![
            Cell::new(&s.id),
            Cell::new(format!("{:.2}", s.similarity)),
            Cell::new(snippet(&s.text)),
        ]);
    }

    table.to_string()
}

/// Format cache statistics as a table
pub fn format_cache_stats_table(stats: &CacheStats) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Metric", "Value"]);

    if let Some(entries) = stats.entries() {
        table.add_row(vec![Cell::new("Entries"), Cell::new(entries)]);
    }
    if let Some(total) = stats.total_size {
        table.add_row(vec![Cell::new("Total size"), Cell::new(format_bytes(total))]);
    }
    if let Some(details) = &stats.cache_stats {
        let mut keys: Vec<_> = details.keys().collect();
        keys.sort();
        for key in keys {
            if key == "size" || key == "total_entries" {
                continue;
            }
            table.add_row(vec![Cell::new(key), Cell::new(display_value(&details[key]))]);
        }
    }

    table.to_string()
}

/// Format vector store cache info as a table
pub fn format_vector_info_table(info: &VectorCacheInfo) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Metric", "Value"]);

    if let Some(docs) = info.cached_documents {
        table.add_row(vec![Cell::new("Cached documents"), Cell::new(docs)]);
    }
    if let Some(fresh) = info.cache_fresh {
        let label = if fresh { "yes".green() } else { "no".yellow() };
        table.add_row(vec![Cell::new("Fresh"), Cell::new(label.to_string())]);
    }
    if let Some(age) = info.cache_age_seconds {
        table.add_row(vec![Cell::new("Age"), Cell::new(format_seconds(age))]);
    }
    if let Some(ttl) = info.cache_ttl_seconds {
        table.add_row(vec![Cell::new("TTL"), Cell::new(format_seconds(ttl))]);
    }
    if let Some(last) = &info.last_refresh {
        table.add_row(vec![Cell::new("Last refresh"), Cell::new(last)]);
    }
    let mut extra: Vec<_> = info.extra.iter().collect();
    extra.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in extra {
        table.add_row(vec![Cell::new(key), Cell::new(display_value(value))]);
    }

    table.to_string()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
        format!("{}…", cut.trim_end())
    }
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a duration in seconds as `1h 2m 3s`
pub fn format_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
