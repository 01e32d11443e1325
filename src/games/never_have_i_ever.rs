//! Never Have I Ever rounds.

use chrono::{DateTime, Utc};
use serenity::model::id::UserId;

use super::Session;

/// One open round. Removed from the registry when its window closes.
#[derive(Debug, Clone)]
pub struct NhieRound {
    pub host: UserId,
    /// `None` while the statement is being fetched.
    pub statement: Option<String>,
    pub opened_at: DateTime<Utc>,
}

impl NhieRound {
    pub fn new(host: UserId, now: DateTime<Utc>) -> Self {
        Self {
            host,
            statement: None,
            opened_at: now,
        }
    }
}

impl Session for NhieRound {
    fn last_activity(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

/// Result text for the users who reacted.
pub fn tally_summary(names: &[String]) -> String {
    match names.len() {
        0 => "Nobody has done this! 😇".to_string(),
        1 => format!("**1** person has done this!\n👥 Who did it: {}", names[0]),
        n => format!(
            "**{}** people have done this!\n👥 Who did it: {}",
            n,
            names.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_nobody() {
        assert_eq!(tally_summary(&[]), "Nobody has done this! 😇");
    }

    #[test]
    fn test_tally_one() {
        let text = tally_summary(&["alice".to_string()]);
        assert!(text.starts_with("**1** person has done this!"));
        assert!(text.ends_with("alice"));
    }

    #[test]
    fn test_tally_many() {
        let names = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
        assert_eq!(
            tally_summary(&names),
            "**3** people have done this!\n👥 Who did it: alice, bob, carol"
        );
    }
}
