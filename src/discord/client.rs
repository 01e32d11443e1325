//! Discord bot client abstraction.
//!
//! Serenity callbacks only forward events into a channel. A single loop
//! owns the [`BotHandler`] and processes Discord events, game events and
//! the idle sweep one at a time.

use std::sync::Arc;
use std::time::Duration;

use serenity::all::{GatewayIntents, Guild, Member, Message, Ready};
use serenity::async_trait;
use serenity::http::HttpBuilder;
use serenity::prelude::*;
use serenity::Client;

use backon::BackoffBuilder;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::common::error::AppError;
use crate::config::Config;
use crate::discord::handler::BotHandler;
use crate::games::GameEvent;
use crate::relay::RelayClient;

/// How often idle game sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub enum DiscordBotEvent {
    /// Bot connected and ready.
    Ready { context: Context, ready: Ready },
    /// Guild data received. `is_new` is set when the bot was just added.
    GuildCreate {
        context: Context,
        guild: Guild,
        is_new: bool,
    },
    MemberJoined { context: Context, member: Member },
    Message { context: Context, message: Message },
    Disconnected,
}

struct DiscordBotEvents {
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

impl DiscordBotEvents {
    fn new(discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> Self {
        Self { discord_events_tx }
    }

    fn forward(&self, event: DiscordBotEvent) {
        if let Err(error) = self.discord_events_tx.send(event) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, context: Context, ready: Ready) {
        self.forward(DiscordBotEvent::Ready { context, ready });
    }

    async fn guild_create(&self, context: Context, guild: Guild, is_new: Option<bool>) {
        self.forward(DiscordBotEvent::GuildCreate {
            context,
            guild,
            is_new: is_new.unwrap_or(false),
        });
    }

    async fn guild_member_addition(&self, context: Context, member: Member) {
        self.forward(DiscordBotEvent::MemberJoined { context, member });
    }

    async fn message(&self, context: Context, message: Message) {
        self.forward(DiscordBotEvent::Message { context, message });
    }
}

/// Builder for creating the Discord bot.
pub struct DiscordBotBuilder {
    config: Arc<Config>,
    relay: RelayClient,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordBotBuilder {
    pub fn new(config: Arc<Config>, relay: RelayClient, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            config,
            relay,
            shutdown_rx,
        }
    }

    /// Build the Discord bot.
    pub async fn build(self) -> Result<DiscordBot, AppError> {
        let (discord_events_tx, discord_events_rx) = mpsc::unbounded_channel::<DiscordBotEvent>();
        let (game_events_tx, game_events_rx) = mpsc::unbounded_channel::<GameEvent>();

        let token = self.config.discord.token.clone();
        let client = build_client(&token, discord_events_tx.clone()).await?;
        let handler = BotHandler::new(self.config, self.relay, game_events_tx);

        Ok(DiscordBot {
            client: Some(client),
            token,
            handler,
            discord_events_rx,
            discord_events_tx,
            game_events_rx,
            shutdown_rx: self.shutdown_rx,
        })
    }
}

async fn build_client(
    token: &str,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
) -> Result<Client, AppError> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    // Build a custom reqwest client with timeout settings
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let http = HttpBuilder::new(token).client(reqwest_client).build();

    let events = DiscordBotEvents::new(discord_events_tx);
    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler(events)
        .await?;
    Ok(client)
}

/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
fn discord_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(Duration::from_secs(300))
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

pub struct DiscordBot {
    client: Option<Client>,
    token: String,
    handler: BotHandler,
    discord_events_rx: mpsc::UnboundedReceiver<DiscordBotEvent>,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
    game_events_rx: mpsc::UnboundedReceiver<GameEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordBot {
    pub async fn run(mut self) {
        let shard_manager = self.client.as_ref().map(|c| c.shard_manager.clone());
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::select! {
            _ = Self::run_connection(&mut self.client, &self.token, &self.discord_events_tx) => {},
            _ = Self::process_events(
                &mut self.discord_events_rx,
                &mut self.game_events_rx,
                &mut self.handler,
                &mut self.shutdown_rx,
            ) => {},
            _ = async {
                loop {
                    if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                if let Some(ref manager) = shard_manager {
                    info!("Initiating graceful Discord shutdown...");
                    manager.shutdown_all().await;
                    info!("Discord shutdown complete");
                }
            } => {}
        }
        info!("Discord task ended");
    }

    async fn run_connection(
        client: &mut Option<Client>,
        token: &str,
        discord_events_tx: &mpsc::UnboundedSender<DiscordBotEvent>,
    ) {
        let mut backoff = discord_backoff();

        loop {
            info!("Connecting to Discord...");

            let mut client = match client.take() {
                Some(client) => client,
                None => {
                    // serenity mostly handles reconnections itself.
                    match build_client(token, discord_events_tx.clone()).await {
                        Ok(client) => {
                            backoff = discord_backoff();
                            client
                        }
                        Err(e) => {
                            error!("Failed to rebuild Discord client: {}", e);
                            let delay = backoff.next().unwrap_or(Duration::from_secs(300));
                            warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                            sleep(delay).await;
                            continue;
                        }
                    }
                }
            };

            match client.start().await {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    break;
                }
                Err(e) => {
                    error!("Discord client error: {}", e);
                    let delay = backoff.next().unwrap_or(Duration::from_secs(300));
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64(),
                    );
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    sleep(delay).await;
                }
            }
        }
    }

    async fn process_events(
        discord_events_rx: &mut mpsc::UnboundedReceiver<DiscordBotEvent>,
        game_events_rx: &mut mpsc::UnboundedReceiver<GameEvent>,
        handler: &mut BotHandler,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) {
        let mut discord_connection: Option<Context> = None;
        let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = discord_events_rx.recv() => {
                    let Some(event) = event else {
                        debug!("Discord events channel closed.");
                        break;
                    };
                    match event {
                        DiscordBotEvent::Ready { context, ready } => {
                            info!(
                                "Discord bot connected as {} in {} guilds",
                                ready.user.name,
                                ready.guilds.len()
                            );
                            handler.set_bot_id(ready.user.id);
                            discord_connection = Some(context);
                        }
                        DiscordBotEvent::GuildCreate { context, guild, is_new } => {
                            handler.handle_guild_create(&context, &guild, is_new);
                        }
                        DiscordBotEvent::MemberJoined { context, member } => {
                            handler.handle_member_join(&context, &member);
                        }
                        DiscordBotEvent::Message { context, message } => {
                            handler.handle_message(&context, &message).await;
                        }
                        DiscordBotEvent::Disconnected => {
                            discord_connection = None;
                        }
                    }
                }

                // Game events (drop if not connected)
                event = game_events_rx.recv() => {
                    let Some(event) = event else {
                        warn!("Game event channel closed");
                        break;
                    };
                    match discord_connection {
                        Some(ref context) => {
                            if let Err(e) = handler.handle_game_event(context, event).await {
                                error!("Failed to handle game event: {:#}", e);
                            }
                        }
                        None => debug!("Dropping game event - Discord not connected: {:?}", event),
                    }
                }

                _ = sweep.tick() => {
                    if let Some(ref context) = discord_connection {
                        handler.sweep_idle(context).await;
                    }
                }

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping event processing");
                        break;
                    }
                }
            }
        }
    }
}
