//! Hotload CLI Binary
//!
//! Command-line interface for the hot-reload registry.

use clap::Parser;
use hotload::logging::init_logging;
use hotload::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let config = match CliContext::load_config(&cli.root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let logging = match config.logging.clone().with_overrides(
        cli.log_level.clone(),
        cli.log_format.clone(),
        cli.log_output.clone(),
        cli.log_file.clone(),
    ) {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    // Create CLI context
    let context = match CliContext::from_config(&cli.root, config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing registry: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
