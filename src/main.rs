mod bot;
mod config;
mod enforcement;
mod health;
mod pipeline;
mod policy;
mod scoring;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,safetext_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Scoring endpoint: {}", config.scoring.endpoint);
    info!(
        "  Thresholds: average > {}, toxicity > {}, obscene > {}",
        config.thresholds.average, config.thresholds.toxicity, config.thresholds.obscene
    );

    // Keep-alive endpoint for the hosting platform's pinger
    if config.health.enabled {
        let port = config.health.port;
        tokio::spawn(async move {
            if let Err(e) = health::serve(port).await {
                error!("Health endpoint stopped: {:#}", e);
            }
        });
    }

    // Run the Telegram bot
    info!("Bot is starting...");
    bot::run(config).await?;

    Ok(())
}
