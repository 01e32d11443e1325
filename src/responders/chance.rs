//! Coin flips and phrase picking.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

/// Side of a flipped coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinSide {
    Heads,
    Tails,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => f.write_str("Heads"),
            CoinSide::Tails => f.write_str("Tails"),
        }
    }
}

/// Flip a fair coin.
pub fn flip<R: Rng>(rng: &mut R) -> CoinSide {
    if rng.gen_bool(0.5) {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    }
}

/// Format a coin flip for the channel.
pub fn format_flip(author: &str, side: CoinSide) -> String {
    format!("{} flipped a coin and got: **{}** 🪙", author, side)
}

/// Pick a phrase uniformly at random.
pub fn pick<'a, R: Rng>(rng: &mut R, phrases: &[&'a str]) -> Option<&'a str> {
    phrases.choose(rng).copied()
}
