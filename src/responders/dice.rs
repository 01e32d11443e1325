//! Dice notation parsing and rolling.
//!
//! Accepts `NdM`, `dM`, `NdM+K`, `NdM-K` and a bare `M` (one die of M sides).

use std::fmt;
use std::sync::LazyLock;

use fancy_regex::Regex;
use rand::Rng;

use crate::common::error::DiceError;

pub const DEFAULT_NOTATION: &str = "1d6";
pub const MAX_DICE: u32 = 100;
pub const MIN_SIDES: u32 = 2;
pub const MAX_SIDES: u32 = 1000;

/// Longest reply that still lists individual rolls.
const MAX_DETAILED_LEN: usize = 1900;

static DICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(\d+)?d)?(\d+)(?:([+-])(\d+))?$").expect("dice pattern is valid")
});

/// A parsed dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceRoll {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
}

/// Result of rolling a `DiceRoll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub rolls: Vec<u32>,
    pub modifier: i64,
    pub total: i64,
}

impl DiceRoll {
    /// Parse dice notation.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim();
        let invalid = || DiceError::InvalidNotation(notation.to_string());

        let captures = DICE_PATTERN
            .captures(notation)
            .map_err(|_| invalid())?
            .ok_or_else(invalid)?;

        let number = |index: usize| -> Result<Option<u32>, DiceError> {
            captures
                .get(index)
                .map(|m| m.as_str().parse::<u32>().map_err(|_| DiceError::InvalidNumber))
                .transpose()
        };

        let count = number(1)?.unwrap_or(1);
        let sides = number(2)?.ok_or_else(invalid)?;
        let modifier = match (captures.get(3), number(4)?) {
            (Some(sign), Some(value)) if sign.as_str() == "-" => -i64::from(value),
            (Some(_), Some(value)) => i64::from(value),
            _ => 0,
        };

        if !(1..=MAX_DICE).contains(&count) {
            return Err(DiceError::DiceCount { max: MAX_DICE });
        }
        if !(MIN_SIDES..=MAX_SIDES).contains(&sides) {
            return Err(DiceError::SideCount {
                min: MIN_SIDES,
                max: MAX_SIDES,
            });
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// Smallest possible total.
    pub fn min_total(&self) -> i64 {
        i64::from(self.count) + self.modifier
    }

    /// Largest possible total.
    pub fn max_total(&self) -> i64 {
        i64::from(self.count) * i64::from(self.sides) + self.modifier
    }

    /// Roll the dice.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> RollOutcome {
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.gen_range(1..=self.sides))
            .collect();
        let total = rolls.iter().map(|&r| i64::from(r)).sum::<i64>() + self.modifier;

        RollOutcome {
            rolls,
            modifier: self.modifier,
            total,
        }
    }

    fn is_simple(&self) -> bool {
        self.count == 1 && self.modifier == 0
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}

/// Format a roll result for the channel.
pub fn format_roll(author: &str, notation: &str, dice: &DiceRoll, outcome: &RollOutcome) -> String {
    let notation = notation.trim();
    let mut reply = format!("{} rolled `{}`", author, notation);

    if dice.is_simple() {
        reply.push_str(&format!(" and got: **{}** 🎲", outcome.total));
        return reply;
    }

    let rolls = outcome
        .rolls
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" + ");
    reply.push_str(&format!(":\nRolls: `{}`", rolls));
    if outcome.modifier != 0 {
        let sign = if outcome.modifier > 0 { '+' } else { '-' };
        reply.push_str(&format!(
            " (Modifier: `{}{}`)",
            sign,
            outcome.modifier.unsigned_abs()
        ));
    }
    reply.push_str(&format!("\nTotal: **{}** 🎲", outcome.total));

    if reply.len() > MAX_DETAILED_LEN {
        reply = format!(
            "{} rolled `{}`:\nTotal: **{}** 🎲\n(Individual rolls not shown due to length)",
            author, notation, outcome.total
        );
    }

    reply
}
