//! Hangman.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serenity::model::id::UserId;

use super::Session;
use crate::common::error::GameError;

/// Result of one accepted guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Hit,
    Miss,
    /// Every letter of the word is revealed.
    Won,
    /// The miss limit was reached.
    Lost,
}

impl GuessOutcome {
    pub fn is_over(self) -> bool {
        matches!(self, GuessOutcome::Won | GuessOutcome::Lost)
    }
}

/// One hangman game. The word is `None` while it is still being picked.
#[derive(Debug, Clone)]
pub struct HangmanSession {
    host: UserId,
    host_name: String,
    word: Option<String>,
    hits: BTreeSet<char>,
    misses: BTreeSet<char>,
    max_misses: u8,
    last_activity: DateTime<Utc>,
}

impl HangmanSession {
    pub fn new(host: UserId, host_name: String, max_misses: u8, now: DateTime<Utc>) -> Self {
        Self {
            host,
            host_name,
            word: None,
            hits: BTreeSet::new(),
            misses: BTreeSet::new(),
            max_misses,
            last_activity: now,
        }
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    pub fn is_in_progress(&self) -> bool {
        self.word.is_some()
    }

    /// Set the word and start guessing.
    pub fn begin(&mut self, word: String, now: DateTime<Utc>) {
        self.word = Some(word.to_lowercase());
        self.last_activity = now;
    }

    pub fn max_misses(&self) -> u8 {
        self.max_misses
    }

    pub fn attempts_left(&self) -> u8 {
        self.max_misses
            .saturating_sub(self.misses.len().min(u8::MAX as usize) as u8)
    }

    pub fn can_stop(&self, user: UserId, is_moderator: bool) -> bool {
        user == self.host || is_moderator
    }

    /// Word with unguessed letters masked, e.g. `b _ n _ n _`.
    pub fn masked(&self) -> String {
        let Some(word) = &self.word else {
            return String::new();
        };
        word.chars()
            .map(|c| if self.hits.contains(&c) { c } else { '_' })
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// All guessed letters, sorted, or "None yet".
    pub fn guessed_letters(&self) -> String {
        let all: BTreeSet<char> = self.hits.union(&self.misses).copied().collect();
        if all.is_empty() {
            return "None yet".to_string();
        }
        all.iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Apply a guess already normalized by [`parse_guess`].
    pub fn guess(&mut self, letter: char, now: DateTime<Utc>) -> Result<GuessOutcome, GameError> {
        let word = self.word.as_deref().ok_or(GameError::NotInProgress)?;
        if self.hits.contains(&letter) || self.misses.contains(&letter) {
            return Err(GameError::AlreadyGuessed(letter));
        }
        self.last_activity = now;

        if word.contains(letter) {
            self.hits.insert(letter);
            if word.chars().all(|c| self.hits.contains(&c)) {
                return Ok(GuessOutcome::Won);
            }
            Ok(GuessOutcome::Hit)
        } else {
            self.misses.insert(letter);
            if self.attempts_left() == 0 {
                return Ok(GuessOutcome::Lost);
            }
            Ok(GuessOutcome::Miss)
        }
    }
}

impl Session for HangmanSession {
    fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }
}

/// Normalize guess input to one lowercase letter.
pub fn parse_guess(input: &str) -> Result<char, GameError> {
    let mut chars = input.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphabetic() => Ok(c.to_lowercase().next().unwrap_or(c)),
        _ => Err(GameError::InvalidGuess),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(word: &str) -> HangmanSession {
        let now = Utc::now();
        let mut s = HangmanSession::new(UserId::new(1), "host".to_string(), 6, now);
        s.begin(word.to_string(), now);
        s
    }

    #[test]
    fn test_parse_guess() {
        assert_eq!(parse_guess(" E "), Ok('e'));
        assert_eq!(parse_guess("ab"), Err(GameError::InvalidGuess));
        assert_eq!(parse_guess("7"), Err(GameError::InvalidGuess));
        assert_eq!(parse_guess(""), Err(GameError::InvalidGuess));
    }

    #[test]
    fn test_guess_before_word_is_rejected() {
        let mut s = HangmanSession::new(UserId::new(1), "host".to_string(), 6, Utc::now());
        assert!(!s.is_in_progress());
        assert_eq!(s.guess('a', Utc::now()), Err(GameError::NotInProgress));
    }

    #[test]
    fn test_win_exactly_when_all_letters_guessed() {
        let mut s = session("banana");
        let now = Utc::now();
        assert_eq!(s.guess('b', now), Ok(GuessOutcome::Hit));
        assert_eq!(s.guess('z', now), Ok(GuessOutcome::Miss));
        assert_eq!(s.guess('a', now), Ok(GuessOutcome::Hit));
        assert_eq!(s.masked(), "b a _ a _ a");
        assert_eq!(s.guess('n', now), Ok(GuessOutcome::Won));
        assert_eq!(s.masked(), "b a n a n a");
        assert_eq!(s.attempts_left(), 5);
    }

    #[test]
    fn test_six_misses_is_a_loss() {
        let mut s = session("python");
        let now = Utc::now();
        for letter in ['a', 'b', 'c', 'd', 'e'] {
            assert_eq!(s.guess(letter, now), Ok(GuessOutcome::Miss));
        }
        assert_eq!(s.attempts_left(), 1);
        assert_eq!(s.guess('f', now), Ok(GuessOutcome::Lost));
        assert_eq!(s.attempts_left(), 0);
        assert_eq!(s.word(), Some("python"));
    }

    #[test]
    fn test_repeated_letter_is_rejected() {
        let mut s = session("python");
        let now = Utc::now();
        s.guess('p', now).unwrap();
        s.guess('q', now).unwrap();
        assert_eq!(s.guess('p', now), Err(GameError::AlreadyGuessed('p')));
        assert_eq!(s.guess('q', now), Err(GameError::AlreadyGuessed('q')));
        assert_eq!(s.attempts_left(), 5);
        assert_eq!(s.guessed_letters(), "p, q");
    }

    #[test]
    fn test_stop_permission() {
        let s = session("python");
        assert!(s.can_stop(UserId::new(1), false));
        assert!(!s.can_stop(UserId::new(2), false));
        assert!(s.can_stop(UserId::new(2), true));
    }
}
