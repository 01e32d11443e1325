//! Functopus - a Discord party bot
//!
//! Memes, jokes, facts, GIFs, dice, AI chat and a handful of channel
//! games (Hangman, Truth or Dare, Never Have I Ever).

mod common;
mod config;
mod discord;
mod games;
mod relay;
mod responders;

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use common::AppError;
use config::{env::get_config_path, load_and_validate};
use discord::DiscordBotBuilder;
use relay::RelayClient;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine, the token may come from the real environment
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Functopus v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Set FUNCTOPUS_DISCORD_TOKEN or add discord.token to {}.", config_path);
        AppError::from(e)
    })?;

    info!("Configuration loaded successfully");
    info!("  Command prefix: {}", config.discord.prefix);
    info!("  AI chat: {}", enabled(config.apis.gemini_api_key.is_some()));
    info!("  GIF search: {}", enabled(config.apis.tenor_api_key.is_some()));
    info!("  Welcome stickers: {}", enabled(config.apis.giphy_api_key.is_some()));
    info!(
        "  Welcome messages: {} (channel '{}')",
        enabled(config.welcome.enabled),
        config.welcome.channel
    );

    let relay = RelayClient::new(&config.apis).map_err(AppError::from)?;
    let config = Arc::new(config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let discord_bot = DiscordBotBuilder::new(config, relay, shutdown_rx)
        .build()
        .await?;

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(discord_bot.run());

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - disconnecting...");
            true
        }
        _ = &mut discord_task => false,
    };

    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (bot already exited): {}", e);
        }
        let timeout = tokio::time::Duration::from_secs(5);
        match tokio::time::timeout(timeout, discord_task).await {
            Ok(Ok(())) => info!("Discord bot stopped gracefully"),
            Ok(Err(e)) => warn!("Discord task panicked: {}", e),
            Err(_) => warn!("Discord shutdown timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
}

fn enabled(on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
