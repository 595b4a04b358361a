//! Config command handlers

use crate::cli::{load_config, ConfigInitArgs, ConfigShowArgs};
use colored::Colorize;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../parley.example.toml");

/// Handle `parley config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<String, Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, EXAMPLE_CONFIG)?;

    Ok(format!(
        "{} Configuration file created: {}\n  Edit this file to point parley at your chat service.",
        "✓".green(),
        args.output.display()
    ))
}

/// Handle `parley config show`: the merged result of file, environment and flags
pub fn handle_config_show(args: &ConfigShowArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config(&args.connection)?;
    Ok(toml::to_string_pretty(&config)?)
}
