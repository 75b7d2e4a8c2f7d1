mod cli;
mod commands;
mod dispatch;
mod telegram;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use trialbot_core::config::AppConfig;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Browser sessions run on the blocking pool; one per permit, plus headroom
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .max_blocking_threads(16)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // .env is optional; real environment variables win
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config).unwrap_or_else(|_| {
        warn!(path = %cli.config, "config file not found, using defaults");
        include_str!("../config/default.toml").to_string()
    });
    let mut config: AppConfig = toml::from_str(&config_str)?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;

    match cli.command {
        Commands::Bot => {
            commands::bot::run(config).await?;
        }
        Commands::Signup { name } => {
            commands::signup::run(config, name).await?;
        }
        Commands::Inbox { address } => {
            commands::inbox::run(config, address).await?;
        }
    }

    Ok(())
}
