//! Truth or Dare.
//!
//! A session starts in the waiting state where players join and leave.
//! `play` locks the roster and cycles turns in join order. Each turn moves
//! through three phases: the player picks truth or dare, the bot fetches a
//! prompt, the player performs it and answers `!done`.
//!
//! Every phase change bumps `seq`. Timers and prompt fetches carry the
//! `seq` they were started with, so results that arrive after the turn has
//! moved on are recognised as stale and dropped.

use std::fmt;

use chrono::{DateTime, Utc};
use serenity::model::id::UserId;

use super::Session;
use crate::common::error::GameError;
use crate::relay::PromptKind;

pub const MIN_PLAYERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Truth,
    Dare,
}

impl Choice {
    pub fn prompt_kind(self) -> PromptKind {
        match self {
            Choice::Truth => PromptKind::Truth,
            Choice::Dare => PromptKind::Dare,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Choice::Truth => "🤔",
            Choice::Dare => "😈",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Truth => f.write_str("truth"),
            Choice::Dare => f.write_str("dare"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Waiting,
    InProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Choosing,
    Fetching(Choice),
    Performing(Choice),
}

/// The player whose turn it is, and the sequence number of the phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub player: Player,
    pub seq: u64,
}

/// What a fired timer interrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodTimeout {
    /// The player never picked truth or dare.
    Choice { skipped: Player, next: Turn },
    /// The player never answered `!done`.
    Perform {
        skipped: Player,
        choice: Choice,
        next: Turn,
    },
}

#[derive(Debug, Clone)]
pub struct TodSession {
    starter: UserId,
    players: Vec<Player>,
    status: Status,
    turn: usize,
    phase: Phase,
    seq: u64,
    last_activity: DateTime<Utc>,
}

impl TodSession {
    /// New waiting session with the starter as first player.
    pub fn new(starter: Player, now: DateTime<Utc>) -> Self {
        Self {
            starter: starter.id,
            players: vec![starter],
            status: Status::Waiting,
            turn: 0,
            phase: Phase::Choosing,
            seq: 0,
            last_activity: now,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn join(&mut self, player: Player, now: DateTime<Utc>) -> Result<(), GameError> {
        if self.status != Status::Waiting {
            return Err(GameError::NotWaiting);
        }
        if self.players.iter().any(|p| p.id == player.id) {
            return Err(GameError::AlreadyJoined);
        }
        self.players.push(player);
        self.last_activity = now;
        Ok(())
    }

    /// Remove a player. Returns `true` when nobody is left.
    pub fn leave(&mut self, user: UserId, now: DateTime<Utc>) -> Result<bool, GameError> {
        if self.status != Status::Waiting {
            return Err(GameError::NotWaiting);
        }
        let index = self
            .players
            .iter()
            .position(|p| p.id == user)
            .ok_or(GameError::NotJoined)?;
        self.players.remove(index);
        self.last_activity = now;
        Ok(self.players.is_empty())
    }

    /// Lock the roster and hand the first turn to the first player.
    pub fn play(&mut self, user: UserId, now: DateTime<Utc>) -> Result<Turn, GameError> {
        if self.status != Status::Waiting {
            return Err(GameError::WrongPhase);
        }
        if !self.players.iter().any(|p| p.id == user) {
            return Err(GameError::NotJoined);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers { min: MIN_PLAYERS });
        }
        self.status = Status::InProgress;
        self.turn = 0;
        self.last_activity = now;
        Ok(self.enter(Phase::Choosing))
    }

    /// The current player picks truth or dare. Returns the fetch sequence.
    pub fn choose(
        &mut self,
        user: UserId,
        choice: Choice,
        now: DateTime<Utc>,
    ) -> Result<u64, GameError> {
        self.check_turn(user)?;
        if self.phase != Phase::Choosing {
            return Err(GameError::WrongPhase);
        }
        self.last_activity = now;
        Ok(self.enter(Phase::Fetching(choice)).seq)
    }

    /// A prompt fetch for `seq` succeeded. `None` when it is stale.
    pub fn prompt_ready(&mut self, seq: u64) -> Option<(Choice, Turn)> {
        match self.phase {
            Phase::Fetching(choice) if self.is_current(seq) => {
                Some((choice, self.enter(Phase::Performing(choice))))
            }
            _ => None,
        }
    }

    /// A prompt fetch for `seq` failed; the turn is skipped.
    pub fn prompt_failed(&mut self, seq: u64) -> Option<Turn> {
        match self.phase {
            Phase::Fetching(_) if self.is_current(seq) => Some(self.advance()),
            _ => None,
        }
    }

    /// The current player finished. Returns their choice and the next turn.
    pub fn done(&mut self, user: UserId, now: DateTime<Utc>) -> Result<(Choice, Turn), GameError> {
        self.check_turn(user)?;
        let Phase::Performing(choice) = self.phase else {
            return Err(GameError::WrongPhase);
        };
        self.last_activity = now;
        Ok((choice, self.advance()))
    }

    /// A timer started at `seq` fired. `None` when the turn already moved on.
    pub fn on_timeout(&mut self, seq: u64) -> Option<TodTimeout> {
        if !self.is_current(seq) {
            return None;
        }
        let skipped = self.current_player()?.clone();
        match self.phase {
            Phase::Choosing => Some(TodTimeout::Choice {
                skipped,
                next: self.advance(),
            }),
            Phase::Performing(choice) => Some(TodTimeout::Perform {
                skipped,
                choice,
                next: self.advance(),
            }),
            Phase::Fetching(_) => None,
        }
    }

    pub fn current_player(&self) -> Option<&Player> {
        match self.status {
            Status::InProgress => self.players.get(self.turn),
            Status::Waiting => None,
        }
    }

    pub fn can_end(&self, user: UserId, is_moderator: bool) -> bool {
        user == self.starter || is_moderator
    }

    /// Player list in join order, starter starred.
    pub fn roster(&self) -> String {
        self.players
            .iter()
            .map(|p| {
                let marker = if p.id == self.starter { "⭐" } else { "👤" };
                format!("{} {}", marker, p.name)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn is_current(&self, seq: u64) -> bool {
        self.status == Status::InProgress && seq == self.seq
    }

    fn check_turn(&self, user: UserId) -> Result<(), GameError> {
        match self.current_player() {
            None => Err(GameError::NotStarted),
            Some(p) if p.id != user => Err(GameError::NotYourTurn),
            Some(_) => Ok(()),
        }
    }

    fn advance(&mut self) -> Turn {
        self.turn = (self.turn + 1) % self.players.len().max(1);
        self.enter(Phase::Choosing)
    }

    fn enter(&mut self, phase: Phase) -> Turn {
        self.phase = phase;
        self.seq += 1;
        Turn {
            player: self.players[self.turn].clone(),
            seq: self.seq,
        }
    }
}

impl Session for TodSession {
    fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: u64, name: &str) -> Player {
        Player {
            id: UserId::new(id),
            name: name.to_string(),
        }
    }

    fn started() -> TodSession {
        let now = Utc::now();
        let mut s = TodSession::new(player(1, "alice"), now);
        s.join(player(2, "bob"), now).unwrap();
        s
    }

    #[test]
    fn test_players_listed_in_join_order() {
        let s = started();
        assert_eq!(s.players().len(), 2);
        assert_eq!(s.roster(), "⭐ alice\n👤 bob");
    }

    #[test]
    fn test_join_rules() {
        let now = Utc::now();
        let mut s = started();
        assert_eq!(s.join(player(2, "bob"), now), Err(GameError::AlreadyJoined));

        s.play(UserId::new(1), now).unwrap();
        assert_eq!(s.join(player(3, "carol"), now), Err(GameError::NotWaiting));
        assert_eq!(s.leave(UserId::new(2), now), Err(GameError::NotWaiting));
        assert_eq!(s.players().len(), 2);
    }

    #[test]
    fn test_leave() {
        let now = Utc::now();
        let mut s = started();
        assert_eq!(s.leave(UserId::new(3), now), Err(GameError::NotJoined));
        assert_eq!(s.leave(UserId::new(2), now), Ok(false));
        assert_eq!(s.leave(UserId::new(1), now), Ok(true));
    }

    #[test]
    fn test_play_needs_two_players() {
        let now = Utc::now();
        let mut s = TodSession::new(player(1, "alice"), now);
        assert_eq!(
            s.play(UserId::new(1), now),
            Err(GameError::NotEnoughPlayers { min: 2 })
        );
        assert!(s.current_player().is_none());
    }

    #[test]
    fn test_turns_cycle_in_join_order() {
        let now = Utc::now();
        let mut s = started();
        let first = s.play(UserId::new(2), now).unwrap();
        assert_eq!(first.player.name, "alice");

        assert_eq!(
            s.choose(UserId::new(2), Choice::Dare, now),
            Err(GameError::NotYourTurn)
        );
        let seq = s.choose(UserId::new(1), Choice::Truth, now).unwrap();
        let (choice, performing) = s.prompt_ready(seq).unwrap();
        assert_eq!(choice, Choice::Truth);
        assert_eq!(performing.player.name, "alice");

        let (done, next) = s.done(UserId::new(1), now).unwrap();
        assert_eq!(done, Choice::Truth);
        assert_eq!(next.player.name, "bob");

        let seq = s.choose(UserId::new(2), Choice::Dare, now).unwrap();
        let next = s.prompt_failed(seq).unwrap();
        assert_eq!(next.player.name, "alice");
    }

    #[test]
    fn test_done_outside_performing_phase() {
        let now = Utc::now();
        let mut s = started();
        assert_eq!(s.done(UserId::new(1), now), Err(GameError::NotStarted));
        s.play(UserId::new(1), now).unwrap();
        assert_eq!(s.done(UserId::new(1), now), Err(GameError::WrongPhase));
    }

    #[test]
    fn test_choice_timeout_skips_turn() {
        let now = Utc::now();
        let mut s = started();
        let turn = s.play(UserId::new(1), now).unwrap();

        match s.on_timeout(turn.seq) {
            Some(TodTimeout::Choice { skipped, next }) => {
                assert_eq!(skipped.name, "alice");
                assert_eq!(next.player.name, "bob");
            }
            other => panic!("unexpected timeout result: {:?}", other),
        }
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let now = Utc::now();
        let mut s = started();
        let turn = s.play(UserId::new(1), now).unwrap();
        let fetch_seq = s.choose(UserId::new(1), Choice::Dare, now).unwrap();

        // The choice timer of the finished phase fires late
        assert_eq!(s.on_timeout(turn.seq), None);
        // A fetch in flight is not interrupted by its own sequence either
        assert_eq!(s.on_timeout(fetch_seq), None);

        let (_, performing) = s.prompt_ready(fetch_seq).unwrap();
        assert_eq!(s.prompt_ready(fetch_seq), None);
        assert_eq!(s.prompt_failed(fetch_seq), None);

        s.done(UserId::new(1), now).unwrap();
        assert_eq!(s.on_timeout(performing.seq), None);
    }

    #[test]
    fn test_end_permission() {
        let s = started();
        assert!(s.can_end(UserId::new(1), false));
        assert!(!s.can_end(UserId::new(2), false));
        assert!(s.can_end(UserId::new(2), true));
    }
}
