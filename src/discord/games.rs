//! Game commands and the background events that drive them.
//!
//! Commands mutate the session synchronously. Anything slow (word lookup,
//! prompt fetch, NHIE window) runs in a spawned task and comes back as a
//! [`GameEvent`], which is applied only if the session still expects it.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serenity::all::{
    ChannelId, Colour, Context, CreateEmbed, CreateEmbedFooter, CreateMessage, Http, Mentionable,
    Message, MessageId, User, UserId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::common::error::GameError;
use crate::common::resources::{hangman_drawing, NHIE_REACTION};
use crate::discord::commands::{tod_help, TodAction};
use crate::discord::fun::relay_failure;
use crate::discord::handler::{author_name, is_moderator, BotHandler};
use crate::games::hangman::parse_guess;
use crate::games::{
    tally_summary, Choice, GameEvent, GuessOutcome, HangmanSession, NhieRound, Player, TodSession,
    TodTimeout, Turn,
};
use crate::relay::words::hangman_word;
use crate::relay::PromptKind;

/// Reactors read per request when tallying a NHIE round.
const REACTION_PAGE: u8 = 100;

fn player(msg: &Message) -> Player {
    Player {
        id: msg.author.id,
        name: author_name(msg),
    }
}

/// Embed showing the state of a hangman game.
fn hangman_embed(session: &HangmanSession, title: &str, note: Option<&str>) -> CreateEmbed {
    let drawing = hangman_drawing(session.attempts_left(), session.max_misses());
    let description = match note {
        Some(note) => format!("```{}```\n{}", drawing, note),
        None => format!("```{}```", drawing),
    };
    CreateEmbed::new()
        .title(title)
        .description(description)
        .colour(Colour::BLUE)
        .field("Word", format!("`{}`", session.masked()), false)
        .field("Attempts Left", session.attempts_left().to_string(), true)
        .field("Guessed Letters", session.guessed_letters(), true)
}

/// Embed for a finished hangman game.
fn hangman_over_embed(session: &HangmanSession, won: bool, guesser: &str) -> CreateEmbed {
    let word = session.word().unwrap_or_default().to_uppercase();
    let drawing = hangman_drawing(session.attempts_left(), session.max_misses());
    let embed = CreateEmbed::new()
        .description(format!("```{}```", drawing))
        .footer(CreateEmbedFooter::new("Game Over. Play again with !hangman"));
    if won {
        embed
            .title("🎉 You Won! 🎉")
            .colour(Colour::DARK_GREEN)
            .field("Word", format!("`{}`", word), false)
            .field("Guessed by", guesser, false)
    } else {
        embed
            .title("💀 You Lost! 💀")
            .colour(Colour::RED)
            .field("The word was", format!("`{}`", word), false)
    }
}

async fn send_embed(http: &Arc<Http>, channel_id: ChannelId, embed: CreateEmbed) -> anyhow::Result<()> {
    channel_id
        .send_message(http, CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}

impl BotHandler {
    // ---------------------------------------------------------------------
    // Hangman
    // ---------------------------------------------------------------------

    pub(super) async fn hangman_start(&mut self, _ctx: &Context, msg: &Message) -> anyhow::Result<()> {
        let channel_id = msg.channel_id;
        let session = HangmanSession::new(
            msg.author.id,
            author_name(msg),
            self.config.games.hangman_max_misses,
            Utc::now(),
        );
        self.games.hangman.start(channel_id, session)?;
        info!("Hangman started in {} by {}", channel_id, msg.author.name);

        let relay = self.relay.clone();
        let tx = self.game_events_tx.clone();
        tokio::spawn(async move {
            let word = hangman_word(&relay).await;
            if tx.send(GameEvent::HangmanWord { channel_id, word }).is_err() {
                debug!("Hangman word dropped, event loop stopped");
            }
        });
        Ok(())
    }

    pub(super) async fn hangman_guess(&mut self, ctx: &Context, msg: &Message, input: &str) -> anyhow::Result<()> {
        let channel_id = msg.channel_id;
        let session = self.games.hangman.get_mut(channel_id)?;
        let letter = parse_guess(input)?;
        let outcome = session.guess(letter, Utc::now())?;

        let embed = match outcome {
            GuessOutcome::Won => hangman_over_embed(session, true, &msg.author.mention().to_string()),
            GuessOutcome::Lost => hangman_over_embed(session, false, ""),
            GuessOutcome::Hit => hangman_embed(
                session,
                "Hangman Update",
                Some(&format!("Good guess! '{}' is in the word.", letter)),
            )
            .footer(CreateEmbedFooter::new(format!(
                "Guessed by {}. Use !guess <letter>.",
                author_name(msg)
            ))),
            GuessOutcome::Miss => hangman_embed(
                session,
                "Hangman Update",
                Some(&format!("Sorry, '{}' is not in the word.", letter)),
            )
            .footer(CreateEmbedFooter::new(format!(
                "Guessed by {}. Use !guess <letter>.",
                author_name(msg)
            ))),
        };
        if outcome.is_over() {
            self.games.hangman.end(channel_id);
            info!("Hangman in {} ended: {:?}", channel_id, outcome);
        }

        send_embed(&ctx.http, channel_id, embed).await
    }

    pub(super) async fn hangman_stop(&mut self, ctx: &Context, msg: &Message) -> anyhow::Result<()> {
        let channel_id = msg.channel_id;
        if !self.games.hangman.get(channel_id)?.can_stop(msg.author.id, false)
            && !self.moderator(ctx, msg).await
        {
            return Err(GameError::NotPermitted.into());
        }

        let session = self.games.hangman.end(channel_id).ok_or(GameError::NoSession {
            game: "Hangman",
            hint: "!hangman",
        })?;
        let text = match session.word() {
            Some(word) => format!(
                "Hangman game stopped by {}. The word was: `{}`",
                msg.author.mention(),
                word.to_uppercase()
            ),
            None => format!("Hangman game stopped by {}.", msg.author.mention()),
        };
        channel_id.say(&ctx.http, text).await?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Truth or Dare
    // ---------------------------------------------------------------------

    pub(super) async fn tod(&mut self, ctx: &Context, msg: &Message, action: TodAction) -> anyhow::Result<()> {
        let channel_id = msg.channel_id;
        let mention = msg.author.mention();
        let now = Utc::now();
        let games = &mut self.games.truth_or_dare;

        let text = match action {
            TodAction::Help => tod_help(&self.config.discord.prefix),
            TodAction::Start => {
                games.start(channel_id, TodSession::new(player(msg), now))?;
                info!("Truth or Dare started in {} by {}", channel_id, msg.author.name);
                format!(
                    "🎮 {} has started a new Truth or Dare game!\n\
                     Others can join using `!tod join`\n\
                     Start playing with `!tod play` once everyone has joined!",
                    mention
                )
            }
            TodAction::Join => {
                games.get_mut(channel_id)?.join(player(msg), now)?;
                format!("✅ {} has joined the game!", mention)
            }
            TodAction::Leave => {
                let empty = games.get_mut(channel_id)?.leave(msg.author.id, now)?;
                if empty {
                    games.end(channel_id);
                    format!(
                        "👋 {} has left the game!\nGame ended as there are no more players!",
                        mention
                    )
                } else {
                    format!("👋 {} has left the game!", mention)
                }
            }
            TodAction::Players => {
                let session = games.get(channel_id)?;
                format!(
                    "**Current Players ({}):**\n{}",
                    session.players().len(),
                    session.roster()
                )
            }
            TodAction::Play => {
                let turn = games.get_mut(channel_id)?.play(msg.author.id, now)?;
                info!("Truth or Dare in {} is now playing", channel_id);
                return self.announce_turn(&ctx.http, channel_id, turn).await;
            }
            TodAction::Truth | TodAction::Dare => {
                let choice = if action == TodAction::Truth {
                    Choice::Truth
                } else {
                    Choice::Dare
                };
                let seq = games.get_mut(channel_id)?.choose(msg.author.id, choice, now)?;
                self.fetch_prompt(channel_id, seq, choice);
                return Ok(());
            }
            TodAction::End => {
                let starter = games.get(channel_id)?.can_end(msg.author.id, false);
                if !starter && !self.moderator(ctx, msg).await {
                    return Err(GameError::NotPermitted.into());
                }
                self.games.truth_or_dare.end(channel_id);
                info!("Truth or Dare in {} ended by {}", channel_id, msg.author.name);
                "🎮 Truth or Dare game has been ended!".to_string()
            }
        };

        channel_id.say(&ctx.http, text).await?;
        Ok(())
    }

    pub(super) async fn tod_done(&mut self, ctx: &Context, msg: &Message) -> anyhow::Result<()> {
        let channel_id = msg.channel_id;
        let (choice, next) = self
            .games
            .truth_or_dare
            .get_mut(channel_id)?
            .done(msg.author.id, Utc::now())?;

        channel_id
            .say(
                &ctx.http,
                format!("✅ {} has completed their {}!", msg.author.mention(), choice),
            )
            .await?;
        self.announce_turn(&ctx.http, channel_id, next).await
    }

    /// Ask the current player to choose, and start the choice timer.
    async fn announce_turn(&self, http: &Arc<Http>, channel_id: ChannelId, turn: Turn) -> anyhow::Result<()> {
        let timeout = self.config.games.tod_choice_timeout();
        self.schedule(
            timeout,
            GameEvent::TodTimeout {
                channel_id,
                seq: turn.seq,
            },
        );
        channel_id
            .say(
                http,
                format!(
                    "🎮 {}'s turn! Choose: `!tod truth` 🤔 or `!tod dare` 😈 ({} seconds)",
                    turn.player.id.mention(),
                    timeout.as_secs()
                ),
            )
            .await?;
        Ok(())
    }

    fn fetch_prompt(&self, channel_id: ChannelId, seq: u64, choice: Choice) {
        let relay = self.relay.clone();
        let rating = self.config.games.tod_rating.clone();
        let tx = self.game_events_tx.clone();
        tokio::spawn(async move {
            let result = relay.question(choice.prompt_kind(), &rating).await;
            if tx
                .send(GameEvent::TodPrompt {
                    channel_id,
                    seq,
                    result,
                })
                .is_err()
            {
                debug!("Truth or Dare prompt dropped, event loop stopped");
            }
        });
    }

    // ---------------------------------------------------------------------
    // Never Have I Ever
    // ---------------------------------------------------------------------

    pub(super) fn nhie_start(&mut self, msg: &Message) -> anyhow::Result<()> {
        let channel_id = msg.channel_id;
        self.games
            .nhie
            .start(channel_id, NhieRound::new(msg.author.id, Utc::now()))?;

        let relay = self.relay.clone();
        let rating = self.config.games.nhie_rating.clone();
        let tx = self.game_events_tx.clone();
        tokio::spawn(async move {
            let result = relay.question(PromptKind::NeverHaveIEver, &rating).await;
            if tx.send(GameEvent::NhieStatement { channel_id, result }).is_err() {
                debug!("NHIE statement dropped, event loop stopped");
            }
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Background events
    // ---------------------------------------------------------------------

    pub async fn handle_game_event(&mut self, ctx: &Context, event: GameEvent) -> anyhow::Result<()> {
        match event {
            GameEvent::HangmanWord { channel_id, word } => {
                let Ok(session) = self.games.hangman.get_mut(channel_id) else {
                    debug!("Hangman in {} ended before its word arrived", channel_id);
                    return Ok(());
                };
                if session.is_in_progress() {
                    return Ok(());
                }
                session.begin(word, Utc::now());
                let embed = hangman_embed(session, "Hangman Game Started!", None).footer(
                    CreateEmbedFooter::new(format!(
                        "Game started by {}. Use !guess <letter> to play.",
                        session.host_name()
                    )),
                );
                send_embed(&ctx.http, channel_id, embed).await
            }

            GameEvent::TodPrompt {
                channel_id,
                seq,
                result,
            } => {
                let Ok(session) = self.games.truth_or_dare.get_mut(channel_id) else {
                    return Ok(());
                };
                match result {
                    Ok(question) => {
                        let Some((choice, turn)) = session.prompt_ready(seq) else {
                            debug!("Stale Truth or Dare prompt in {}", channel_id);
                            return Ok(());
                        };
                        let timeout = self.config.games.tod_done_timeout();
                        self.schedule(
                            timeout,
                            GameEvent::TodTimeout {
                                channel_id,
                                seq: turn.seq,
                            },
                        );
                        channel_id
                            .say(
                                &ctx.http,
                                format!(
                                    "{} {}: {}\nType `!done` when you've completed your {}! ({} minutes)",
                                    choice.emoji(),
                                    turn.player.id.mention(),
                                    question,
                                    choice,
                                    timeout.as_secs() / 60
                                ),
                            )
                            .await?;
                        Ok(())
                    }
                    Err(e) => {
                        warn!("Truth or Dare prompt fetch failed: {}", e);
                        let Some(next) = session.prompt_failed(seq) else {
                            return Ok(());
                        };
                        channel_id
                            .say(&ctx.http, "❌ Failed to get a question. Skipping this turn...")
                            .await?;
                        self.announce_turn(&ctx.http, channel_id, next).await
                    }
                }
            }

            GameEvent::TodTimeout { channel_id, seq } => {
                let timeout = self
                    .games
                    .truth_or_dare
                    .get_mut(channel_id)
                    .ok()
                    .and_then(|session| session.on_timeout(seq));
                let (text, next) = match timeout {
                    None => return Ok(()),
                    Some(TodTimeout::Choice { skipped, next }) => (
                        format!(
                            "❌ {} took too long to choose! Skipping...",
                            skipped.id.mention()
                        ),
                        next,
                    ),
                    Some(TodTimeout::Perform {
                        skipped,
                        choice,
                        next,
                    }) => (
                        format!(
                            "❌ {} took too long to complete their {}! Skipping...",
                            skipped.id.mention(),
                            choice
                        ),
                        next,
                    ),
                };
                channel_id.say(&ctx.http, text).await?;
                self.announce_turn(&ctx.http, channel_id, next).await
            }

            GameEvent::NhieStatement { channel_id, result } => {
                let statement = match result {
                    Ok(statement) => statement,
                    Err(e) => {
                        warn!("NHIE statement fetch failed: {}", e);
                        self.games.nhie.end(channel_id);
                        channel_id
                            .say(&ctx.http, relay_failure("statement", &e))
                            .await?;
                        return Ok(());
                    }
                };
                let Ok(round) = self.games.nhie.get_mut(channel_id) else {
                    return Ok(());
                };
                round.statement = Some(statement.clone());
                info!("NHIE round in {} opened by {}", channel_id, round.host);

                tokio::spawn(run_nhie_round(
                    ctx.http.clone(),
                    channel_id,
                    statement,
                    self.config.games.nhie_window(),
                    self.game_events_tx.clone(),
                ));
                Ok(())
            }

            GameEvent::NhieExpired {
                channel_id,
                message_id,
            } => {
                let Some(round) = self.games.nhie.end(channel_id) else {
                    return Ok(());
                };
                debug!(
                    "Closing NHIE round in {}: {}",
                    channel_id,
                    round.statement.as_deref().unwrap_or("<no statement>")
                );
                if let Some(message_id) = message_id {
                    tokio::spawn(tally_nhie_round(ctx.http.clone(), channel_id, message_id));
                }
                Ok(())
            }
        }
    }

    /// Discard sessions idle for too long and tell their channels.
    pub async fn sweep_idle(&mut self, ctx: &Context) {
        if self.games.is_empty() {
            return;
        }
        let limit = self.config.games.idle_timeout();
        let swept = self.games.sweep_idle(Utc::now(), limit);
        if swept.is_empty() {
            return;
        }

        let minutes = limit.num_minutes();
        let mut notices: Vec<(ChannelId, String)> = Vec::new();
        for (channel_id, session) in swept.hangman {
            let reveal = session
                .word()
                .map(|w| format!(" The word was: `{}`", w.to_uppercase()))
                .unwrap_or_default();
            notices.push((
                channel_id,
                format!(
                    "⌛ Hangman game ended after {} minutes of inactivity.{}",
                    minutes, reveal
                ),
            ));
        }
        for (channel_id, _) in swept.truth_or_dare {
            notices.push((
                channel_id,
                format!(
                    "⌛ Truth or Dare game ended after {} minutes of inactivity.",
                    minutes
                ),
            ));
        }
        for (channel_id, _) in swept.nhie {
            debug!("Discarded stale NHIE round in {}", channel_id);
        }

        info!("Idle sweep done, {} sessions still active", self.games.active());
        for (channel_id, text) in notices {
            info!("Idle session removed in {}", channel_id);
            if let Err(e) = channel_id.say(&ctx.http, text).await {
                warn!("Failed to send idle notice: {}", e);
            }
        }
    }

    async fn moderator(&self, ctx: &Context, msg: &Message) -> bool {
        match msg.guild_id {
            Some(guild_id) => is_moderator(ctx, guild_id, msg.channel_id, msg.author.id).await,
            None => false,
        }
    }
}

/// Post the statement, wait for reactions, then report back to the loop.
async fn run_nhie_round(
    http: Arc<Http>,
    channel_id: ChannelId,
    statement: String,
    window: std::time::Duration,
    tx: mpsc::UnboundedSender<GameEvent>,
) {
    let embed = CreateEmbed::new()
        .title("🙈 Never Have I Ever...")
        .description(format!(
            "{}\n\n**React with {} below if you have done this!**",
            statement, NHIE_REACTION
        ))
        .colour(Colour::PURPLE)
        .footer(CreateEmbedFooter::new(format!(
            "Results will be shown in {} seconds...",
            window.as_secs()
        )));

    let message_id = match channel_id
        .send_message(&http, CreateMessage::new().embed(embed))
        .await
    {
        Ok(message) => {
            if let Err(e) = message.react(&http, NHIE_REACTION).await {
                warn!("Failed to add NHIE reaction: {}", e);
            }
            tokio::time::sleep(window).await;
            Some(message.id)
        }
        Err(e) => {
            warn!("Failed to post NHIE statement: {}", e);
            None
        }
    };

    if tx
        .send(GameEvent::NhieExpired {
            channel_id,
            message_id,
        })
        .is_err()
    {
        debug!("NHIE expiry dropped, event loop stopped");
    }
}

/// Fetch pages keyed by user id, passing the last id of each page as the
/// cursor for the next, until a short or empty page.
async fn collect_pages<T, E, F, Fut>(
    page_size: u8,
    id: impl Fn(&T) -> UserId,
    mut fetch: F,
) -> Result<Vec<T>, E>
where
    F: FnMut(Option<UserId>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let mut items = Vec::new();
    let mut after = None;
    loop {
        let page = fetch(after).await?;
        let Some(last) = page.last() else {
            break;
        };
        after = Some(id(last));
        let full = page.len() >= usize::from(page_size);
        items.extend(page);
        if !full {
            break;
        }
    }
    Ok(items)
}

/// Read every reaction on a closed round and post the results.
async fn tally_nhie_round(http: Arc<Http>, channel_id: ChannelId, message_id: MessageId) {
    let http_ref = &http;
    let reactors = collect_pages(REACTION_PAGE, |u: &User| u.id, move |after| {
        channel_id.reaction_users(http_ref, message_id, NHIE_REACTION, Some(REACTION_PAGE), after)
    })
    .await;
    let users = match reactors {
        Ok(users) => users,
        Err(e) => {
            warn!("Failed to read NHIE reactions: {}", e);
            return;
        }
    };

    let names: Vec<String> = users
        .iter()
        .filter(|u| !u.bot)
        .map(|u| u.global_name.clone().unwrap_or_else(|| u.name.clone()))
        .collect();
    let colour = if names.is_empty() {
        Colour::BLUE
    } else {
        Colour::DARK_GREEN
    };
    let embed = CreateEmbed::new()
        .title("Results")
        .description(tally_summary(&names))
        .colour(colour);

    if let Err(e) = send_embed(&http, channel_id, embed).await {
        warn!("Failed to post NHIE results: {}", e);
    }
}
