//! Stateless responders: dice, coin flips and phrase picking.

pub mod chance;
pub mod dice;

pub use chance::{flip, format_flip, pick};
pub use dice::{format_roll, DiceRoll, DEFAULT_NOTATION};
