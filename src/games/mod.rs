//! Per-channel game sessions.
//!
//! All sessions live in a [`GameRegistry`] owned by the Discord event loop,
//! so they are only ever touched from one task. Slow work (word lookups,
//! prompt fetches, timers) runs in spawned tasks that report back with a
//! [`GameEvent`], and the loop re-checks the session before applying it.

pub mod hangman;
pub mod never_have_i_ever;
pub mod truth_or_dare;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serenity::model::id::{ChannelId, MessageId};

use crate::common::error::{GameError, RelayError};

pub use hangman::{GuessOutcome, HangmanSession};
pub use never_have_i_ever::{tally_summary, NhieRound};
pub use truth_or_dare::{Choice, Player, TodSession, TodTimeout, Turn};

/// Common view of a session used by the idle sweep.
pub trait Session {
    fn last_activity(&self) -> DateTime<Utc>;
}

/// At most one session of a game per channel.
#[derive(Debug)]
pub struct SessionMap<S> {
    game: &'static str,
    /// Command that starts this game, used in "no session" replies.
    start_hint: &'static str,
    sessions: HashMap<ChannelId, S>,
}

impl<S: Session> SessionMap<S> {
    pub fn new(game: &'static str, start_hint: &'static str) -> Self {
        Self {
            game,
            start_hint,
            sessions: HashMap::new(),
        }
    }

    /// Register a new session. An existing one is left untouched.
    pub fn start(&mut self, channel_id: ChannelId, session: S) -> Result<&mut S, GameError> {
        use std::collections::hash_map::Entry;

        match self.sessions.entry(channel_id) {
            Entry::Occupied(_) => Err(GameError::AlreadyActive { game: self.game }),
            Entry::Vacant(slot) => Ok(slot.insert(session)),
        }
    }

    pub fn get(&self, channel_id: ChannelId) -> Result<&S, GameError> {
        self.sessions.get(&channel_id).ok_or(self.missing())
    }

    pub fn get_mut(&mut self, channel_id: ChannelId) -> Result<&mut S, GameError> {
        let missing = self.missing();
        self.sessions.get_mut(&channel_id).ok_or(missing)
    }

    /// Remove and return the session of a channel.
    pub fn end(&mut self, channel_id: ChannelId) -> Option<S> {
        self.sessions.remove(&channel_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove every session idle for longer than `limit`.
    pub fn sweep_idle(&mut self, now: DateTime<Utc>, limit: Duration) -> Vec<(ChannelId, S)> {
        let stale: Vec<ChannelId> = self
            .sessions
            .iter()
            .filter(|(_, s)| now - s.last_activity() > limit)
            .map(|(id, _)| *id)
            .collect();

        stale
            .into_iter()
            .filter_map(|id| self.sessions.remove(&id).map(|s| (id, s)))
            .collect()
    }

    fn missing(&self) -> GameError {
        GameError::NoSession {
            game: self.game,
            hint: self.start_hint,
        }
    }
}

/// Session maps of every game.
#[derive(Debug)]
pub struct GameRegistry {
    pub hangman: SessionMap<HangmanSession>,
    pub truth_or_dare: SessionMap<TodSession>,
    pub nhie: SessionMap<NhieRound>,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self {
            hangman: SessionMap::new("Hangman", "!hangman"),
            truth_or_dare: SessionMap::new("Truth or Dare", "!tod start"),
            nhie: SessionMap::new("Never Have I Ever", "!nhie"),
        }
    }
}

/// Channels whose sessions were dropped by the idle sweep, per game.
#[derive(Debug, Default)]
pub struct SweptSessions {
    pub hangman: Vec<(ChannelId, HangmanSession)>,
    pub truth_or_dare: Vec<(ChannelId, TodSession)>,
    pub nhie: Vec<(ChannelId, NhieRound)>,
}

impl SweptSessions {
    pub fn is_empty(&self) -> bool {
        self.hangman.is_empty() && self.truth_or_dare.is_empty() && self.nhie.is_empty()
    }
}

impl GameRegistry {
    /// Number of sessions across all games.
    pub fn active(&self) -> usize {
        self.hangman.len() + self.truth_or_dare.len() + self.nhie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hangman.is_empty() && self.truth_or_dare.is_empty() && self.nhie.is_empty()
    }

    pub fn sweep_idle(&mut self, now: DateTime<Utc>, limit: Duration) -> SweptSessions {
        SweptSessions {
            hangman: self.hangman.sweep_idle(now, limit),
            truth_or_dare: self.truth_or_dare.sweep_idle(now, limit),
            nhie: self.nhie.sweep_idle(now, limit),
        }
    }
}

/// Results of background work, fed back into the event loop.
#[derive(Debug)]
pub enum GameEvent {
    /// A hangman word was picked.
    HangmanWord { channel_id: ChannelId, word: String },
    /// A truth or dare prompt fetch finished.
    TodPrompt {
        channel_id: ChannelId,
        seq: u64,
        result: Result<String, RelayError>,
    },
    /// A truth or dare turn timer fired.
    TodTimeout { channel_id: ChannelId, seq: u64 },
    /// A never-have-I-ever statement fetch finished.
    NhieStatement {
        channel_id: ChannelId,
        result: Result<String, RelayError>,
    },
    /// A never-have-I-ever window closed. `message_id` is absent when the
    /// statement could not be posted.
    NhieExpired {
        channel_id: ChannelId,
        message_id: Option<MessageId>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dummy {
        id: u32,
        last: DateTime<Utc>,
    }

    impl Session for Dummy {
        fn last_activity(&self) -> DateTime<Utc> {
            self.last
        }
    }

    fn channel(id: u64) -> ChannelId {
        ChannelId::new(id)
    }

    #[test]
    fn test_duplicate_start_keeps_existing_session() {
        let now = Utc::now();
        let mut map = SessionMap::new("Hangman", "!hangman");
        map.start(channel(1), Dummy { id: 1, last: now }).unwrap();

        let err = map.start(channel(1), Dummy { id: 2, last: now }).unwrap_err();
        assert_eq!(err, GameError::AlreadyActive { game: "Hangman" });
        assert_eq!(map.get(channel(1)).unwrap().id, 1);

        // Other channels are independent
        assert!(map.start(channel(2), Dummy { id: 3, last: now }).is_ok());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_missing_session() {
        let mut map: SessionMap<Dummy> = SessionMap::new("Hangman", "!hangman");
        assert_eq!(
            map.get_mut(channel(9)).unwrap_err(),
            GameError::NoSession {
                game: "Hangman",
                hint: "!hangman"
            }
        );
        assert!(map.end(channel(9)).is_none());
    }

    #[test]
    fn test_end_removes_session() {
        let mut map = SessionMap::new("Hangman", "!hangman");
        map.start(channel(1), Dummy { id: 1, last: Utc::now() }).unwrap();
        assert_eq!(map.end(channel(1)).map(|d| d.id), Some(1));
        assert!(map.get(channel(1)).is_err());
        assert!(map.is_empty());
    }

    #[test]
    fn test_sweep_idle() {
        let now = Utc::now();
        let mut map = SessionMap::new("Hangman", "!hangman");
        map.start(
            channel(1),
            Dummy {
                id: 1,
                last: now - Duration::minutes(45),
            },
        )
        .unwrap();
        map.start(
            channel(2),
            Dummy {
                id: 2,
                last: now - Duration::minutes(5),
            },
        )
        .unwrap();

        let swept = map.sweep_idle(now, Duration::minutes(30));
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].0, channel(1));
        assert!(map.get(channel(2)).is_ok());
    }

    #[test]
    fn test_registry_names_games() {
        let mut registry = GameRegistry::default();
        assert!(registry.is_empty());
        let err = registry.truth_or_dare.get(channel(1)).unwrap_err();
        assert!(err.to_string().contains("`!tod start`"));
        assert!(registry
            .sweep_idle(Utc::now(), Duration::minutes(30))
            .is_empty());
    }
}
