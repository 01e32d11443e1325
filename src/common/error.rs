//! Error types for the application.
//!
//! User-facing errors (`DiceError`, `GameError`) carry the text that is sent
//! back to the channel as their `Display` output.

use thiserror::Error;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors from third-party content APIs.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{feature} is not configured")]
    Disabled { feature: &'static str },

    #[error("request timed out")]
    Timeout,

    #[error("service answered with HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RelayError::Timeout
        } else if let Some(status) = error.status() {
            RelayError::Status(status.as_u16())
        } else {
            RelayError::Transport(error)
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        RelayError::Shape(error.to_string())
    }
}

/// Dice notation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice notation: `{0}`. Examples: `d6`, `2d10`, `d20+5`.")]
    InvalidNotation(String),

    #[error("Invalid numbers in dice notation.")]
    InvalidNumber,

    #[error("Number of dice must be between 1 and {max}.")]
    DiceCount { max: u32 },

    #[error("Number of sides must be between {min} and {max}.")]
    SideCount { min: u32, max: u32 },
}

/// Game session errors: bad input and state conflicts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("❌ A {game} game is already in progress in this channel!")]
    AlreadyActive { game: &'static str },

    #[error("❌ No active {game} game in this channel! Start one with `{hint}`.")]
    NoSession {
        game: &'static str,
        hint: &'static str,
    },

    #[error("❌ The game has already started, players can no longer join or leave.")]
    NotWaiting,

    #[error("⏳ The game is still being set up, hang on a second.")]
    NotInProgress,

    #[error("❌ The game hasn't started yet! Begin with `!tod play` once everyone has joined.")]
    NotStarted,

    #[error("❌ You're already in the game!")]
    AlreadyJoined,

    #[error("❌ You're not in the game!")]
    NotJoined,

    #[error("❌ Need at least {min} players to play! Others can join with `!tod join`")]
    NotEnoughPlayers { min: usize },

    #[error("This is not your turn!")]
    NotYourTurn,

    #[error("❌ That can't be done right now.")]
    WrongPhase,

    #[error("❌ Only the game starter or a moderator can do that!")]
    NotPermitted,

    #[error("Invalid guess. Please enter a single letter.")]
    InvalidGuess,

    #[error("You've already guessed the letter '{0}'. Try a different one.")]
    AlreadyGuessed(char),
}
