//! todocache - task records with a cached dataset read path
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use todocache::cli::{commands, Cli, Commands};
use todocache::config::{Config, ConfigManager};
use todocache::error::TodoResult;
use todocache::service::ResourceService;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> TodoResult<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = manager.load().await?;

    init_tracing(cli.verbose, &config);
    debug!(path = %manager.path().display(), "Configuration loaded");

    match cli.command {
        Commands::Request(request) => {
            let format = cli.format;
            ResourceService::run_scoped(&config, move |service| async move {
                commands::request(request, &service, format).await
            })
            .await
        }
        Commands::Shell => commands::shell(&config, cli.format).await,
        Commands::Config(args) => commands::config(args, &manager, &config).await,
    }
}

/// Initialize logging: 0 = warn, 1 = info, 2+ = debug. `RUST_LOG` wins when set.
fn init_tracing(verbose: u8, config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("todocache=warn"),
        1 => EnvFilter::new("todocache=info"),
        _ => EnvFilter::new("todocache=debug"),
    });

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }
}
