//! Hangman word selection: AI, then the random word service, then the
//! local list.

use tracing::{debug, warn};

use super::RelayClient;
use crate::common::resources::FALLBACK_WORDS;
use crate::responders::pick;

/// Normalize a candidate word and check it is alphabetic and of a usable length.
fn suitable(word: &str, min: usize, max: usize) -> Option<String> {
    let word = word
        .trim()
        .trim_matches(|c: char| c == '\'' || c == '"' || c == '.')
        .to_lowercase();
    let len = word.chars().count();
    (len >= min && len <= max && word.chars().all(|c| c.is_ascii_alphabetic())).then_some(word)
}

fn fallback_word() -> String {
    pick(&mut rand::thread_rng(), FALLBACK_WORDS)
        .unwrap_or("hangman")
        .to_string()
}

/// Pick a hangman word. Never fails.
pub async fn hangman_word(relay: &RelayClient) -> String {
    if relay.has_gemini() {
        match relay.ai_word().await {
            Ok(raw) => match suitable(&raw, 5, 10) {
                Some(word) => {
                    debug!("Using AI hangman word");
                    return word;
                }
                None => warn!("AI returned an unsuitable hangman word: {:?}", raw),
            },
            Err(e) => warn!("AI hangman word failed: {}", e),
        }
    }

    match relay.random_word().await {
        Ok(raw) => match suitable(&raw, 3, 12) {
            Some(word) => {
                debug!("Using random word service hangman word");
                return word;
            }
            None => warn!("Random word service returned an unsuitable word: {:?}", raw),
        },
        Err(e) => warn!("Random word service failed: {}", e),
    }

    fallback_word()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::tests::unreachable_config;

    #[test]
    fn test_suitable() {
        assert_eq!(suitable(" Banana\n", 5, 10), Some("banana".to_string()));
        assert_eq!(suitable("'banana'", 5, 10), Some("banana".to_string()));
        assert_eq!(suitable("cat", 5, 10), None);
        assert_eq!(suitable("ice cream", 3, 12), None);
        assert_eq!(suitable("r2d2", 3, 12), None);
        assert_eq!(suitable("extraordinarily", 3, 12), None);
    }

    #[tokio::test]
    async fn test_falls_back_to_local_list() {
        let mut config = unreachable_config();
        config.gemini_api_key = Some("key".to_string());
        let relay = RelayClient::new(&config).unwrap();

        let word = hangman_word(&relay).await;
        assert!(FALLBACK_WORDS.contains(&word.as_str()));
    }
}
