use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod browser;
mod cli;
mod command;
mod config;
mod domain;
mod history;
mod state;

use cli::{Cli, Commands};
use command::{CommandContext, LogOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if cli.verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::new("info"),
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        // No command specified, show help
        eprintln!("No command specified. Use --help for usage information.");
        eprintln!("Use 'retro-cabinet browse' to browse a server interactively.");
        return Ok(());
    };

    if let Commands::Config { action } = command {
        return command::run_config(action, cli.config_dir);
    }

    let ctx = CommandContext::load(cli.server, cli.config_dir)?;

    match command {
        Commands::Refs => command::run_refs(&ctx).await?,
        Commands::Log {
            target,
            max_depth,
            affix,
            json,
        } => {
            let options = LogOptions {
                target,
                max_depth,
                affix,
                json,
            };
            command::run_log(&ctx, options).await?;
        }
        Commands::Show { hash } => command::run_show(&ctx, &hash).await?,
        Commands::Browse => command::run_browse(&ctx).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
