use clap::Parser;
use parley::cli::{
    cache, chat, documents, handle_completions, handle_config_init, handle_config_show, health,
    load_config, CacheCommands, Cli, Commands, ConfigCommands, ConnectionArgs, DocumentsCommands,
};
use parley::config::ParleyConfig;

/// Load configuration and start logging for a command that talks to the service.
fn prepare(args: &ConnectionArgs) -> Result<ParleyConfig, Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    if let Err(e) = parley::logging::init_tracing(&config.logging) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Health(args) => match prepare(&args.connection) {
            Ok(config) => health::handle_health(&args, &config).await,
            Err(e) => Err(e),
        },
        Commands::Chat(args) => match prepare(&args.connection) {
            Ok(config) => chat::handle_chat(&args, &config).await,
            Err(e) => Err(e),
        },
        Commands::Cache(cmd) => match cmd {
            CacheCommands::Stats(args) => match prepare(&args.connection) {
                Ok(config) => cache::handle_cache_stats(&args, &config).await,
                Err(e) => Err(e),
            },
            CacheCommands::Clear(args) => match prepare(&args.connection) {
                Ok(config) => cache::handle_cache_clear(&args, &config).await,
                Err(e) => Err(e),
            },
            CacheCommands::Cleanup(args) => match prepare(&args.connection) {
                Ok(config) => cache::handle_cache_cleanup(&args, &config).await,
                Err(e) => Err(e),
            },
            CacheCommands::VectorInfo(args) => match prepare(&args.connection) {
                Ok(config) => cache::handle_vector_info(&args, &config).await,
                Err(e) => Err(e),
            },
        },
        Commands::Documents(cmd) => match cmd {
            DocumentsCommands::Load(args) => match prepare(&args.connection) {
                Ok(config) => documents::handle_load(&args, &config).await,
                Err(e) => Err(e),
            },
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
            ConfigCommands::Show(args) => handle_config_show(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(String::new())
        }
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
