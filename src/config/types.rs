//! Configuration type definitions.

use std::time::Duration;

use serde::Deserialize;

/// Longest accepted idle timeout, one week.
pub const MAX_IDLE_TIMEOUT_MINS: i64 = 7 * 24 * 60;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discord: DiscordConfig,
    pub apis: ApiConfig,
    pub games: GamesConfig,
    pub welcome: WelcomeConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub token: String,
    /// Command prefix, `!` unless configured otherwise.
    pub prefix: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            prefix: "!".to_string(),
        }
    }
}

/// Third-party API keys, timeouts and endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Google Gemini key; enables `!ask` and AI-picked hangman words.
    pub gemini_api_key: Option<String>,
    /// Tenor key; enables `!gif`.
    pub tenor_api_key: Option<String>,
    /// Giphy key; enables welcome stickers.
    pub giphy_api_key: Option<String>,
    pub timeout_secs: u64,
    pub ai_timeout_secs: u64,
    pub endpoints: EndpointsConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            tenor_api_key: None,
            giphy_api_key: None,
            timeout_secs: 10,
            ai_timeout_secs: 30,
            endpoints: EndpointsConfig::default(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }
}

/// Endpoint URLs of the content services.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub meme: String,
    pub joke: String,
    pub fact: String,
    pub compliment: String,
    pub roast: String,
    /// Base URL; `/truth`, `/dare` and `/nhie` are appended.
    pub truth_or_dare: String,
    pub random_word: String,
    pub tenor_search: String,
    pub giphy_search: String,
    pub giphy_translate: String,
    pub gemini: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            meme: "https://meme-api.com/gimme".to_string(),
            joke: "https://official-joke-api.appspot.com/jokes/random".to_string(),
            fact: "https://uselessfacts.jsph.pl/random.json?language=en".to_string(),
            compliment: "https://compliments-api.vercel.app/random".to_string(),
            roast: "https://evilinsult.com/generate_insult.php?lang=en&type=json".to_string(),
            truth_or_dare: "https://api.truthordarebot.xyz/v1".to_string(),
            random_word: "https://random-word-api.herokuapp.com/word".to_string(),
            tenor_search: "https://tenor.googleapis.com/v2/search".to_string(),
            giphy_search: "https://api.giphy.com/v1/stickers/search".to_string(),
            giphy_translate: "https://api.giphy.com/v1/stickers/translate".to_string(),
            gemini: "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
                .to_string(),
        }
    }
}

impl EndpointsConfig {
    /// All endpoints with their config key, for validation.
    pub fn all(&self) -> [(&'static str, &str); 11] {
        [
            ("meme", self.meme.as_str()),
            ("joke", self.joke.as_str()),
            ("fact", self.fact.as_str()),
            ("compliment", self.compliment.as_str()),
            ("roast", self.roast.as_str()),
            ("truth_or_dare", self.truth_or_dare.as_str()),
            ("random_word", self.random_word.as_str()),
            ("tenor_search", self.tenor_search.as_str()),
            ("giphy_search", self.giphy_search.as_str()),
            ("giphy_translate", self.giphy_translate.as_str()),
            ("gemini", self.gemini.as_str()),
        ]
    }
}

/// Game tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    /// Wrong guesses allowed before a hangman game is lost.
    pub hangman_max_misses: u8,
    /// Seconds a Never Have I Ever round stays open.
    pub nhie_window_secs: u64,
    /// Seconds a Truth or Dare player has to pick truth or dare.
    pub tod_choice_timeout_secs: u64,
    /// Seconds a Truth or Dare player has to answer with `!done`.
    pub tod_done_timeout_secs: u64,
    /// Minutes of inactivity after which a game is discarded.
    pub idle_timeout_mins: i64,
    pub tod_rating: String,
    pub nhie_rating: String,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            hangman_max_misses: 6,
            nhie_window_secs: 30,
            tod_choice_timeout_secs: 30,
            tod_done_timeout_secs: 300,
            idle_timeout_mins: 30,
            tod_rating: "pg".to_string(),
            nhie_rating: "pg13".to_string(),
        }
    }
}

impl GamesConfig {
    pub fn nhie_window(&self) -> Duration {
        Duration::from_secs(self.nhie_window_secs)
    }

    pub fn tod_choice_timeout(&self) -> Duration {
        Duration::from_secs(self.tod_choice_timeout_secs)
    }

    pub fn tod_done_timeout(&self) -> Duration {
        Duration::from_secs(self.tod_done_timeout_secs)
    }

    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.idle_timeout_mins.clamp(1, MAX_IDLE_TIMEOUT_MINS))
    }
}

/// Greeting settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WelcomeConfig {
    pub enabled: bool,
    /// Preferred channel name for member greetings.
    pub channel: String,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: "general".to_string(),
        }
    }
}
