//! Fun commands: content relays, dice, coin flips and AI chat.
//!
//! Relay commands run as their own tasks since they only wait on
//! third-party services and never touch game state.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serenity::all::{ChannelId, GuildId, Http, Mentionable, UserId};
use tracing::{debug, info, warn};

use crate::common::error::{DiceError, RelayError};
use crate::common::resources::{COMPLIMENTS, ROASTS, ROAST_WARNING};
use crate::relay::{chunk_message, AiReply, RelayClient, DISCORD_MESSAGE_LIMIT};
use crate::responders::{flip, format_flip, format_roll, pick, DiceRoll, DEFAULT_NOTATION};

/// Members fetched for `@everyone` compliments and roasts.
const EVERYONE_LIMIT: u64 = 1000;

/// Compliment or roast requests in flight at once.
const BANTER_CONCURRENCY: usize = 4;

/// Reply for a failed relay.
pub fn relay_failure(what: &str, error: &RelayError) -> String {
    match error {
        RelayError::Disabled { feature } => {
            format!("Sorry, {} is not configured on this bot. (Missing API Key)", feature)
        }
        RelayError::Timeout => format!(
            "The {} service is taking too long to respond. Please try again later.",
            what
        ),
        RelayError::Shape(_) => format!("Received an invalid response from the {} service.", what),
        RelayError::Status(_) | RelayError::Transport(_) => {
            format!("Failed to fetch a {}. Please try again later.", what)
        }
    }
}

async fn relay_reply(
    http: &Arc<Http>,
    channel_id: ChannelId,
    what: &str,
    result: Result<String, RelayError>,
) -> anyhow::Result<()> {
    let text = result.unwrap_or_else(|e| {
        warn!("{} relay failed: {}", what, e);
        relay_failure(what, &e)
    });
    channel_id.say(http, text).await?;
    Ok(())
}

pub async fn meme(http: Arc<Http>, relay: RelayClient, channel_id: ChannelId) -> anyhow::Result<()> {
    let result = relay.meme().await.map(|m| m.format());
    relay_reply(&http, channel_id, "meme", result).await
}

pub async fn joke(http: Arc<Http>, relay: RelayClient, channel_id: ChannelId) -> anyhow::Result<()> {
    let result = relay.joke().await.map(|j| j.format());
    relay_reply(&http, channel_id, "joke", result).await
}

pub async fn fact(http: Arc<Http>, relay: RelayClient, channel_id: ChannelId) -> anyhow::Result<()> {
    let result = relay.fact().await.map(|f| f.format());
    relay_reply(&http, channel_id, "fact", result).await
}

pub async fn gif(
    http: Arc<Http>,
    relay: RelayClient,
    channel_id: ChannelId,
    term: String,
) -> anyhow::Result<()> {
    if !relay.has_tenor() {
        channel_id
            .say(&http, "Sorry, the GIF search service is not configured. (Missing API Key)")
            .await?;
        return Ok(());
    }
    if term.is_empty() {
        channel_id
            .say(&http, "Please provide a search term for the GIF. Example: `!gif dancing`")
            .await?;
        return Ok(());
    }

    let text = match relay.gif(&term).await {
        Ok(Some(url)) => url,
        Ok(None) => format!("Sorry, I couldn't find any GIFs for '{}'.", term),
        Err(e) => {
            warn!("GIF search for '{}' failed: {}", term, e);
            relay_failure("GIF search", &e)
        }
    };
    channel_id.say(&http, text).await?;
    Ok(())
}

/// Who a compliment or roast is aimed at.
#[derive(Debug, Clone)]
pub enum Targets {
    Users(Vec<UserId>),
    /// Every non-bot member, or the author if there are none.
    Everyone { guild_id: GuildId, author: UserId },
}

impl Targets {
    /// `@everyone` at the end of the arguments targets the whole server;
    /// otherwise the mentioned users, or the author when nobody is mentioned.
    pub fn from_message(
        args: &str,
        mentions: &[UserId],
        author: UserId,
        guild_id: Option<GuildId>,
    ) -> Self {
        if let Some(guild_id) = guild_id {
            if args.trim().to_lowercase().ends_with("@everyone") {
                return Targets::Everyone { guild_id, author };
            }
        }
        if mentions.is_empty() {
            Targets::Users(vec![author])
        } else {
            Targets::Users(mentions.to_vec())
        }
    }

    async fn resolve(self, http: &Arc<Http>, bot_id: Option<UserId>) -> anyhow::Result<Vec<UserId>> {
        let users = match self {
            Targets::Users(users) => users,
            Targets::Everyone { guild_id, author } => {
                let members: Vec<UserId> = guild_id
                    .members(http, Some(EVERYONE_LIMIT), None::<UserId>)
                    .await?
                    .into_iter()
                    .filter(|m| !m.user.bot && Some(m.user.id) != bot_id)
                    .map(|m| m.user.id)
                    .collect();
                or_author(members, author)
            }
        };
        Ok(users.into_iter().filter(|u| Some(*u) != bot_id).collect())
    }
}

fn or_author(users: Vec<UserId>, author: UserId) -> Vec<UserId> {
    if users.is_empty() {
        vec![author]
    } else {
        users
    }
}

/// Run `count` fetches with at most `limit` in flight, keeping their order.
async fn fetch_bounded<F, Fut, T>(count: usize, limit: usize, fetch: F) -> Vec<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = T>,
{
    stream::iter(0..count)
        .map(fetch)
        .buffered(limit.max(1))
        .collect()
        .await
}

/// Compliments or roasts for a list of users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banter {
    Compliment,
    Roast,
}

impl Banter {
    pub fn noun(self) -> &'static str {
        match self {
            Banter::Compliment => "compliment",
            Banter::Roast => "roast",
        }
    }

    fn emoji(self) -> &'static str {
        match self {
            Banter::Compliment => "🌸",
            Banter::Roast => "🔥",
        }
    }

    fn fallback(self) -> &'static str {
        let phrases = match self {
            Banter::Compliment => COMPLIMENTS,
            Banter::Roast => ROASTS,
        };
        pick(&mut rand::thread_rng(), phrases).unwrap_or("You're one of a kind.")
    }

    async fn fetch(self, relay: &RelayClient) -> String {
        let result = match self {
            Banter::Compliment => relay.compliment().await,
            Banter::Roast => relay.roast().await,
        };
        result.unwrap_or_else(|e| {
            warn!("{} relay failed, using local phrase: {}", self.noun(), e);
            self.fallback().to_string()
        })
    }
}

pub async fn banter(
    http: Arc<Http>,
    relay: RelayClient,
    channel_id: ChannelId,
    kind: Banter,
    targets: Targets,
    bot_id: Option<UserId>,
) -> anyhow::Result<()> {
    let users = targets.resolve(&http, bot_id).await?;
    if users.is_empty() {
        channel_id
            .say(&http, format!("No valid users to {}!", kind.noun()))
            .await?;
        return Ok(());
    }

    let lines = fetch_bounded(users.len(), BANTER_CONCURRENCY, |_| kind.fetch(&relay)).await;

    if kind == Banter::Roast {
        channel_id.say(&http, ROAST_WARNING).await?;
    }
    for (user, line) in users.iter().zip(lines) {
        channel_id
            .say(&http, format!("{} {} {}", user.mention(), kind.emoji(), line))
            .await?;
    }
    Ok(())
}

/// Roll dice; invalid notation is reported as a `DiceError`.
pub fn roll(author: &str, notation: Option<&str>) -> Result<String, DiceError> {
    let notation = notation.unwrap_or(DEFAULT_NOTATION);
    let dice = DiceRoll::parse(notation)?;
    debug!(
        "Rolling {} (range {}..={})",
        dice,
        dice.min_total(),
        dice.max_total()
    );
    let outcome = dice.roll(&mut rand::thread_rng());
    Ok(format_roll(author, notation, &dice, &outcome))
}

pub fn coin_flip(author: &str) -> String {
    format_flip(author, flip(&mut rand::thread_rng()))
}

pub async fn ask(
    http: Arc<Http>,
    relay: RelayClient,
    channel_id: ChannelId,
    prompt: String,
) -> anyhow::Result<()> {
    if !relay.has_gemini() {
        channel_id
            .say(&http, "Error: AI chat is not configured. Please contact the bot owner.")
            .await?;
        return Ok(());
    }
    if prompt.is_empty() {
        channel_id
            .say(
                &http,
                "Please provide a question or prompt after the command. Example: `!ask Who are you?`",
            )
            .await?;
        return Ok(());
    }

    info!("AI chat prompt of {} chars", prompt.chars().count());
    let reply = {
        let _typing = channel_id.start_typing(&http);
        relay.ask(&prompt).await
    };

    match reply {
        Ok(AiReply::Text(text)) => {
            for chunk in chunk_message(&text, DISCORD_MESSAGE_LIMIT) {
                channel_id.say(&http, chunk).await?;
            }
        }
        Ok(AiReply::Blocked(reason)) => {
            channel_id
                .say(&http, format!("Sorry, your prompt was blocked. Reason: {}", reason))
                .await?;
        }
        Err(e) => {
            warn!("AI chat failed: {}", e);
            channel_id.say(&http, relay_failure("AI", &e)).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_relay_failure_messages() {
        assert_eq!(
            relay_failure("joke", &RelayError::Timeout),
            "The joke service is taking too long to respond. Please try again later."
        );
        assert_eq!(
            relay_failure("joke", &RelayError::Status(503)),
            "Failed to fetch a joke. Please try again later."
        );
        assert!(relay_failure(
            "GIF search",
            &RelayError::Disabled {
                feature: "GIF search"
            }
        )
        .contains("not configured"));
    }

    #[test]
    fn test_targets() {
        let author = UserId::new(1);
        let guild = Some(GuildId::new(10));

        assert!(matches!(
            Targets::from_message("", &[], author, guild),
            Targets::Users(u) if u == vec![author]
        ));
        let mentioned = vec![UserId::new(2), UserId::new(3)];
        assert!(matches!(
            Targets::from_message("<@2> <@3>", &mentioned, author, guild),
            Targets::Users(u) if u == mentioned
        ));
        assert!(matches!(
            Targets::from_message("@Everyone", &[], author, guild),
            Targets::Everyone { author: a, .. } if a == author
        ));
    }

    #[test]
    fn test_empty_server_falls_back_to_author() {
        let author = UserId::new(1);
        assert_eq!(or_author(Vec::new(), author), vec![author]);
        assert_eq!(or_author(vec![UserId::new(2)], author), vec![UserId::new(2)]);
    }

    #[tokio::test]
    async fn test_large_target_list_is_fetched_with_bounded_concurrency() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (in_flight, peak) = (&in_flight, &peak);

        let lines = fetch_bounded(EVERYONE_LIMIT as usize, BANTER_CONCURRENCY, |i| async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            i
        })
        .await;

        assert_eq!(lines, (0..EVERYONE_LIMIT as usize).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= BANTER_CONCURRENCY);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_bot_is_never_a_target() {
        let http = Arc::new(Http::new(""));
        let bot = UserId::new(99);
        let targets = Targets::Users(vec![UserId::new(2), bot]);
        let users = targets.resolve(&http, Some(bot)).await.unwrap();
        assert_eq!(users, vec![UserId::new(2)]);
    }

    #[test]
    fn test_roll_reply() {
        let text = roll("alice", Some("2d6+3")).unwrap();
        assert!(text.contains("alice"));
        assert!(text.contains("2d6+3"));

        assert!(matches!(
            roll("alice", Some("abc")),
            Err(DiceError::InvalidNotation(_))
        ));
        assert!(roll("alice", None).unwrap().contains("1d6"));
    }

    #[test]
    fn test_coin_flip_reply() {
        let text = coin_flip("bob");
        assert!(text.contains("**Heads**") || text.contains("**Tails**"));
    }
}
