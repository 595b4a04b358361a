//! CLI module for Parley
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `health` - Check whether the chat service is up
//! - `chat` - Send one message, or start an interactive session
//! - `cache` - Inspect and manage server caches (admin)
//! - `documents` - Load material into the knowledge base
//! - `config` - Configuration utilities (init, show)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Ask a single question
//! parley chat "What projects has Peter worked on?"
//!
//! # Interactive session against a remote deployment
//! parley chat --base-url https://api.example.com
//!
//! # Cache statistics as JSON
//! PARLEY_ADMIN_TOKEN=... parley cache stats --json
//! ```

pub mod cache;
pub mod chat;
pub mod completions;
pub mod config;
pub mod documents;
pub mod health;
pub mod output;

pub use completions::handle_completions;
pub use config::{handle_config_init, handle_config_show};

use crate::config::{ParleyConfig, DEFAULT_CONFIG_FILE};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parley - terminal client for a retrieval-augmented chat service
#[derive(Parser, Debug)]
#[command(
    name = "parley",
    version,
    about = "Terminal client for a retrieval-augmented chat service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check service health
    Health(HealthArgs),
    /// Chat with the service
    Chat(ChatArgs),
    /// Manage server caches (requires an admin token)
    #[command(subcommand)]
    Cache(CacheCommands),
    /// Manage knowledge base documents
    #[command(subcommand)]
    Documents(DocumentsCommands),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that talks to the service.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Override the service base URL
    #[arg(long, env = "PARLEY_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Override the request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PARLEY_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Message to send; omit to start an interactive session
    pub message: Option<String>,

    /// Output the reply as JSON
    #[arg(long, conflicts_with = "html")]
    pub json: bool,

    /// Output the reply as formatted HTML
    #[arg(long)]
    pub html: bool,

    /// Show the retrieved context used for the reply
    #[arg(long)]
    pub sources: bool,

    /// Start a new conversation instead of resuming the stored one
    #[arg(long)]
    pub new: bool,

    /// Use this conversation id for this run
    #[arg(long, conflicts_with = "new")]
    pub conversation: Option<String>,

    /// Override the user id sent with messages
    #[arg(short, long, env = "PARLEY_USER_ID")]
    pub user: Option<String>,

    /// Language for error messages (en, sv)
    #[arg(long, env = "PARLEY_LOCALE")]
    pub locale: Option<String>,

    /// Do not read or write the stored conversation id
    #[arg(long)]
    pub no_persist: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show response cache statistics
    Stats(AdminArgs),
    /// Clear all cached responses
    Clear(AdminArgs),
    /// Remove expired cache entries
    Cleanup(AdminArgs),
    /// Show vector store cache information
    VectorInfo(AdminArgs),
}

#[derive(Args, Debug)]
pub struct AdminArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Admin bearer token (defaults to the variable named by auth.token_env)
    #[arg(long)]
    pub token: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Subcommand, Debug)]
pub enum DocumentsCommands {
    /// Load text, a PDF file or a URL into the knowledge base
    Load(LoadArgs),
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Raw text to load
    #[arg(
        long,
        conflicts_with_all = ["pdf", "url"],
        required_unless_present_any = ["pdf", "url"]
    )]
    pub text: Option<String>,

    /// PDF file to upload
    #[arg(long, conflicts_with = "url")]
    pub pdf: Option<PathBuf>,

    /// URL for the service to fetch
    #[arg(long)]
    pub url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
    /// Print the effective configuration
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load configuration with CLI overrides
///
/// A missing file at the default path means defaults; a missing file the
/// user named explicitly is an error.
pub fn load_config(args: &ConnectionArgs) -> Result<ParleyConfig, Box<dyn std::error::Error>> {
    let mut config = if args.config.exists() {
        ParleyConfig::load(Some(&args.config))?
    } else if args.config == PathBuf::from(DEFAULT_CONFIG_FILE) {
        tracing::debug!("Config file not found, using defaults");
        ParleyConfig::default()
    } else {
        return Err(crate::config::ConfigError::NotFound(args.config.clone()).into());
    };

    config = config.with_env_overrides();

    if let Some(ref base_url) = args.base_url {
        config.api.base_url = base_url.trim().trim_end_matches('/').to_string();
    }
    if let Some(timeout) = args.timeout {
        config.api.timeout_seconds = timeout;
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}
