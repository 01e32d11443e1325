//! Greetings: the intro embed when the bot joins a server, and a welcome
//! message (plus sticker) when a member joins.

use std::sync::Arc;

use serenity::all::{
    ChannelId, ChannelType, Colour, CreateEmbed, CreateEmbedFooter, CreateMessage, Guild, Http,
    UserId,
};
use tracing::{debug, info, warn};

use crate::common::resources::{INTRO_FEATURES, INTRO_TITLE};
use crate::relay::RelayClient;

/// A text channel as seen by the channel resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCandidate {
    pub id: ChannelId,
    pub name: String,
    pub position: u16,
    /// The bot may send messages here.
    pub writable: bool,
}

/// Text channels of a guild with the bot's send permission, by position.
pub fn channel_candidates(guild: &Guild, bot_id: UserId) -> Vec<ChannelCandidate> {
    let bot_member = guild.members.get(&bot_id);
    let mut candidates: Vec<ChannelCandidate> = guild
        .channels
        .values()
        .filter(|ch| ch.kind == ChannelType::Text)
        .map(|ch| ChannelCandidate {
            id: ch.id,
            name: ch.name.clone(),
            position: ch.position,
            writable: bot_member
                .map(|m| guild.user_permissions_in(ch, m).send_messages())
                .unwrap_or(false),
        })
        .collect();
    candidates.sort_by_key(|c| (c.position, c.id));
    candidates
}

/// First writable text channel, by position.
pub fn first_writable(candidates: &[ChannelCandidate]) -> Option<ChannelId> {
    candidates.iter().find(|c| c.writable).map(|c| c.id)
}

/// Pick where to greet a new member: the configured channel name, then the
/// system channel, then the first writable text channel.
pub fn resolve_welcome_channel(
    preferred_name: &str,
    system_channel: Option<ChannelId>,
    candidates: &[ChannelCandidate],
) -> Option<ChannelId> {
    if let Some(named) = candidates
        .iter()
        .find(|c| c.writable && c.name.eq_ignore_ascii_case(preferred_name))
    {
        return Some(named.id);
    }
    debug!(
        "Welcome channel '{}' not found, trying fallbacks",
        preferred_name
    );

    if let Some(system) = system_channel {
        if candidates.iter().any(|c| c.id == system && c.writable) {
            return Some(system);
        }
    }

    first_writable(candidates)
}

/// Welcome text for a new member.
pub fn welcome_text(member_mention: &str, guild_name: &str) -> String {
    format!(
        "Welcome {} to **{}**! 👋 We're excited to have you here!",
        member_mention, guild_name
    )
}

fn intro_embed(prefix: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(INTRO_TITLE)
        .description("Thanks for adding me to your server!")
        .colour(Colour::BLUE)
        .field("Features & Commands", INTRO_FEATURES, false)
        .footer(CreateEmbedFooter::new(format!(
            "Need help? Type {}help for a list of commands!",
            prefix
        )))
}

/// Send the intro embed after the bot was added to a server.
pub async fn send_intro(http: Arc<Http>, channel_id: ChannelId, guild_name: String, prefix: String) {
    let builder = CreateMessage::new().embed(intro_embed(&prefix));
    match channel_id.send_message(&http, builder).await {
        Ok(_) => info!("Sent intro to guild '{}'", guild_name),
        Err(e) => warn!("Failed to send intro to guild '{}': {}", guild_name, e),
    }
}

/// Greet a member, then follow up with a sticker when one is available.
pub async fn greet_member(
    http: Arc<Http>,
    relay: RelayClient,
    channel_id: ChannelId,
    member_mention: String,
    guild_name: String,
) {
    if let Err(e) = channel_id
        .say(&http, welcome_text(&member_mention, &guild_name))
        .await
    {
        warn!("Failed to send welcome message in '{}': {}", guild_name, e);
        return;
    }
    info!("Sent welcome message in '{}'", guild_name);

    if !relay.has_giphy() {
        debug!("No Giphy key, skipping welcome sticker");
        return;
    }
    match relay.welcome_sticker().await {
        Ok(Some(url)) => {
            if let Err(e) = channel_id.say(&http, url).await {
                warn!("Failed to send welcome sticker: {}", e);
            }
        }
        Ok(None) => debug!("No welcome sticker found"),
        Err(e) => warn!("Welcome sticker lookup failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, name: &str, position: u16, writable: bool) -> ChannelCandidate {
        ChannelCandidate {
            id: ChannelId::new(id),
            name: name.to_string(),
            position,
            writable,
        }
    }

    #[test]
    fn test_prefers_named_channel() {
        let channels = vec![
            candidate(1, "rules", 0, true),
            candidate(2, "General", 1, true),
        ];
        assert_eq!(
            resolve_welcome_channel("general", Some(ChannelId::new(1)), &channels),
            Some(ChannelId::new(2))
        );
    }

    #[test]
    fn test_falls_back_to_writable_system_channel() {
        let channels = vec![
            candidate(1, "rules", 0, true),
            candidate(3, "lobby", 2, true),
        ];
        assert_eq!(
            resolve_welcome_channel("general", Some(ChannelId::new(3)), &channels),
            Some(ChannelId::new(3))
        );
    }

    #[test]
    fn test_skips_read_only_system_channel() {
        let channels = vec![
            candidate(1, "announcements", 0, false),
            candidate(2, "chat", 1, true),
            candidate(3, "general", 2, false),
        ];
        assert_eq!(
            resolve_welcome_channel("general", Some(ChannelId::new(1)), &channels),
            Some(ChannelId::new(2))
        );
    }

    #[test]
    fn test_nothing_writable() {
        let channels = vec![candidate(1, "general", 0, false)];
        assert_eq!(resolve_welcome_channel("general", None, &channels), None);
        assert_eq!(first_writable(&channels), None);
    }

    #[test]
    fn test_welcome_text() {
        assert_eq!(
            welcome_text("<@42>", "Rustaceans"),
            "Welcome <@42> to **Rustaceans**! 👋 We're excited to have you here!"
        );
    }
}
