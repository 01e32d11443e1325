//! Discord bot integration.
//!
//! The gateway client, command parsing and the handlers that turn
//! commands into replies and game moves.

pub mod client;
pub mod commands;
pub mod fun;
pub mod games;
pub mod handler;
pub mod welcome;

pub use client::DiscordBotBuilder;
