//! Discord event handling.
//!
//! `BotHandler` is owned by the event loop in `client.rs`. It parses
//! commands, owns the game sessions and starts the background work for
//! slow commands.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serenity::all::{
    ChannelId, Colour, Context, CreateEmbed, CreateEmbedFooter, CreateMessage, Guild, GuildId,
    Http, Member, Mentionable, Message, UserId,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::common::error::{DiceError, GameError};
use crate::config::Config;
use crate::discord::commands::{self, parse_command, Command};
use crate::discord::fun::{self, Banter, Targets};
use crate::discord::welcome;
use crate::games::{GameEvent, GameRegistry};
use crate::relay::RelayClient;

/// Reply for handler failures that are not the user's fault.
pub const GENERIC_FAILURE: &str = "Something went wrong while running that command.";

/// Reply text for errors the user can act on. `None` for internal errors.
pub fn user_facing(error: &anyhow::Error) -> Option<String> {
    if let Some(e) = error.downcast_ref::<GameError>() {
        return Some(e.to_string());
    }
    if let Some(e) = error.downcast_ref::<DiceError>() {
        return Some(e.to_string());
    }
    None
}

/// Display name of a message author: server nickname, then global name.
pub fn author_name(msg: &Message) -> String {
    msg.member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .or_else(|| msg.author.global_name.clone())
        .unwrap_or_else(|| msg.author.name.clone())
}

pub struct BotHandler {
    pub(super) config: Arc<Config>,
    pub(super) relay: RelayClient,
    pub(super) games: GameRegistry,
    pub(super) game_events_tx: mpsc::UnboundedSender<GameEvent>,
    bot_id: Option<UserId>,
}

impl BotHandler {
    pub fn new(
        config: Arc<Config>,
        relay: RelayClient,
        game_events_tx: mpsc::UnboundedSender<GameEvent>,
    ) -> Self {
        Self {
            config,
            relay,
            games: GameRegistry::default(),
            game_events_tx,
            bot_id: None,
        }
    }

    pub fn set_bot_id(&mut self, bot_id: UserId) {
        self.bot_id = Some(bot_id);
    }

    pub(super) fn prefix(&self) -> &str {
        &self.config.discord.prefix
    }

    pub async fn handle_message(&mut self, ctx: &Context, msg: &Message) {
        // Ignore bots, ourselves and direct messages
        if msg.author.bot || Some(msg.author.id) == self.bot_id || msg.guild_id.is_none() {
            return;
        }

        let Some(command) = parse_command(self.prefix(), &msg.content) else {
            return;
        };
        info!("Command {:?} from {} in {}", command, msg.author.name, msg.channel_id);

        if let Err(e) = self.dispatch(ctx, msg, command).await {
            let reply = match user_facing(&e) {
                Some(reply) => reply,
                None => {
                    error!("Command handler error: {:#}", e);
                    GENERIC_FAILURE.to_string()
                }
            };
            if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
                warn!("Failed to report command error: {}", e);
            }
        }
    }

    async fn dispatch(&mut self, ctx: &Context, msg: &Message, command: Command) -> anyhow::Result<()> {
        let http = ctx.http.clone();
        let relay = self.relay.clone();
        let channel_id = msg.channel_id;

        match command {
            Command::Help { topic } => self.send_help(ctx, channel_id, topic.as_deref()).await?,
            Command::Meme => spawn_command(http.clone(), channel_id, "meme", fun::meme(http, relay, channel_id)),
            Command::Joke => spawn_command(http.clone(), channel_id, "joke", fun::joke(http, relay, channel_id)),
            Command::Fact => spawn_command(http.clone(), channel_id, "fact", fun::fact(http, relay, channel_id)),
            Command::Gif { term } => {
                spawn_command(http.clone(), channel_id, "gif", fun::gif(http, relay, channel_id, term))
            }
            Command::Compliment { args } => self.spawn_banter(ctx, msg, Banter::Compliment, &args),
            Command::Roast { args } => self.spawn_banter(ctx, msg, Banter::Roast, &args),
            Command::Ask { prompt } => {
                spawn_command(http.clone(), channel_id, "ask", fun::ask(http, relay, channel_id, prompt))
            }
            Command::Roll { notation } => {
                let text = fun::roll(&msg.author.mention().to_string(), notation.as_deref())?;
                channel_id.say(&ctx.http, text).await?;
            }
            Command::Flip => {
                channel_id
                    .say(&ctx.http, fun::coin_flip(&msg.author.mention().to_string()))
                    .await?;
            }
            Command::Hangman => self.hangman_start(ctx, msg).await?,
            Command::Guess { input } => self.hangman_guess(ctx, msg, &input).await?,
            Command::HangmanStop => self.hangman_stop(ctx, msg).await?,
            Command::Tod(action) => self.tod(ctx, msg, action).await?,
            Command::Done => self.tod_done(ctx, msg).await?,
            Command::Nhie => self.nhie_start(msg)?,
        }
        Ok(())
    }

    async fn send_help(&self, ctx: &Context, channel_id: ChannelId, topic: Option<&str>) -> anyhow::Result<()> {
        let prefix = self.prefix();
        let embed = match topic {
            None => {
                let mut embed = CreateEmbed::new()
                    .title("🤖 Bot Commands")
                    .description(format!(
                        "Here's everything I can do! Use `{}help <command>` for more details.",
                        prefix
                    ))
                    .colour(Colour::BLUE);
                for (title, lines) in commands::help_overview(prefix) {
                    embed = embed.field(title, lines, false);
                }
                embed
            }
            Some(topic) => {
                let Some(spec) = commands::find_command(topic) else {
                    channel_id
                        .say(&ctx.http, format!("No command called `{}` found.", topic))
                        .await?;
                    return Ok(());
                };
                let mut embed = CreateEmbed::new()
                    .title(format!("Command: {}{}", prefix, spec.name))
                    .description(spec.brief)
                    .colour(Colour::BLUE)
                    .field("Usage", commands::usage(prefix, spec), false);
                if let Some(aliases) = commands::aliases(prefix, spec) {
                    embed = embed.field("Aliases", aliases, false);
                }
                if spec.name == "tod" {
                    embed = embed.field("Subcommands", commands::tod_help(prefix), false);
                }
                embed
            }
        };
        let embed = embed.footer(CreateEmbedFooter::new(format!(
            "Use {}help <command> for details on a command",
            prefix
        )));
        channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(embed))
            .await?;
        Ok(())
    }

    fn spawn_banter(&self, ctx: &Context, msg: &Message, kind: Banter, args: &str) {
        let mentions: Vec<UserId> = msg.mentions.iter().map(|u| u.id).collect();
        let targets = Targets::from_message(args, &mentions, msg.author.id, msg.guild_id);
        let task = fun::banter(
            ctx.http.clone(),
            self.relay.clone(),
            msg.channel_id,
            kind,
            targets,
            self.bot_id,
        );
        spawn_command(ctx.http.clone(), msg.channel_id, kind.noun(), task);
    }

    /// Send the intro embed when the bot was just added to a server.
    pub fn handle_guild_create(&self, ctx: &Context, guild: &Guild, is_new: bool) {
        info!("Received guild data for '{}' ({} channels)", guild.name, guild.channels.len());
        if !is_new {
            return;
        }
        let Some(bot_id) = self.bot_id else {
            warn!("Joined guild '{}' before Ready, skipping intro", guild.name);
            return;
        };

        let candidates = welcome::channel_candidates(guild, bot_id);
        match welcome::first_writable(&candidates) {
            Some(channel_id) => {
                tokio::spawn(welcome::send_intro(
                    ctx.http.clone(),
                    channel_id,
                    guild.name.clone(),
                    self.prefix().to_string(),
                ));
            }
            None => warn!("No writable channel for intro in guild '{}'", guild.name),
        }
    }

    /// Greet a member who just joined.
    pub fn handle_member_join(&self, ctx: &Context, member: &Member) {
        if !self.config.welcome.enabled || member.user.bot {
            return;
        }
        let Some(bot_id) = self.bot_id else {
            return;
        };
        info!("{} joined guild {}", member.user.name, member.guild_id);

        let resolved = {
            let Some(guild) = ctx.cache.guild(member.guild_id) else {
                warn!("Guild {} not cached, dropping welcome", member.guild_id);
                return;
            };
            let candidates = welcome::channel_candidates(&guild, bot_id);
            welcome::resolve_welcome_channel(
                &self.config.welcome.channel,
                guild.system_channel_id,
                &candidates,
            )
            .map(|channel_id| (channel_id, guild.name.clone()))
        };

        match resolved {
            Some((channel_id, guild_name)) => {
                tokio::spawn(welcome::greet_member(
                    ctx.http.clone(),
                    self.relay.clone(),
                    channel_id,
                    member.mention().to_string(),
                    guild_name,
                ));
            }
            None => warn!("No welcome channel in guild {}, dropping welcome", member.guild_id),
        }
    }

    /// Post a game event back into the loop after `delay`.
    pub(super) fn schedule(&self, delay: Duration, event: GameEvent) {
        let tx = self.game_events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(event).is_err() {
                debug!("Game event dropped, event loop stopped");
            }
        });
    }
}

/// Whether a member may force-end games: MANAGE_MESSAGES in the channel.
pub(super) async fn is_moderator(ctx: &Context, guild_id: GuildId, channel_id: ChannelId, user_id: UserId) -> bool {
    let member = match guild_id.member(ctx, user_id).await {
        Ok(member) => member,
        Err(e) => {
            warn!("Failed to fetch member {} for permission check: {}", user_id, e);
            return false;
        }
    };
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return false;
    };
    guild
        .channels
        .get(&channel_id)
        .map(|channel| guild.user_permissions_in(channel, &member).manage_messages())
        .unwrap_or(false)
}

/// Run a command in its own task and report failures to the channel.
fn spawn_command<F>(http: Arc<Http>, channel_id: ChannelId, name: &'static str, task: F)
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            error!("Command !{} failed: {:#}", name, e);
            if let Err(e) = channel_id.say(&http, GENERIC_FAILURE).await {
                warn!("Failed to report command error: {}", e);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_errors() {
        let game: anyhow::Error = GameError::NotYourTurn.into();
        assert_eq!(user_facing(&game).as_deref(), Some("This is not your turn!"));

        let dice: anyhow::Error = DiceError::InvalidNumber.into();
        assert!(user_facing(&dice).is_some());

        let internal = anyhow::anyhow!("socket closed");
        assert_eq!(user_facing(&internal), None);
    }
}
