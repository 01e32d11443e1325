//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use reqwest::Url;

use crate::common::error::ConfigError;
use crate::common::resources::HANGMAN_STAGES;
use crate::config::types::{Config, MAX_IDLE_TIMEOUT_MINS};

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Discord config
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.prefix.is_empty() {
        errors.push("discord.prefix must not be empty".to_string());
    }
    if config.discord.prefix.chars().any(char::is_whitespace) {
        errors.push(format!(
            "discord.prefix '{}' must not contain whitespace",
            config.discord.prefix
        ));
    }

    // Validate API settings
    if config.apis.timeout_secs == 0 {
        errors.push("apis.timeout_secs must be non-zero".to_string());
    }
    if config.apis.ai_timeout_secs == 0 {
        errors.push("apis.ai_timeout_secs must be non-zero".to_string());
    }
    for (name, url) in config.apis.endpoints.all() {
        if Url::parse(url).is_err() {
            errors.push(format!(
                "apis.endpoints.{} is not a valid URL: '{}'",
                name, url
            ));
        }
    }

    // Validate game settings
    let max_misses = HANGMAN_STAGES.len() - 1;
    let misses = usize::from(config.games.hangman_max_misses);
    if misses == 0 || misses > max_misses {
        errors.push(format!(
            "games.hangman_max_misses must be 1-{} (got {})",
            max_misses, misses
        ));
    }
    if config.games.nhie_window_secs == 0 {
        errors.push("games.nhie_window_secs must be non-zero".to_string());
    }
    if config.games.tod_choice_timeout_secs == 0 {
        errors.push("games.tod_choice_timeout_secs must be non-zero".to_string());
    }
    if config.games.tod_done_timeout_secs == 0 {
        errors.push("games.tod_done_timeout_secs must be non-zero".to_string());
    }
    let idle_mins = config.games.idle_timeout_mins;
    if idle_mins <= 0 || idle_mins > MAX_IDLE_TIMEOUT_MINS {
        errors.push(format!(
            "games.idle_timeout_mins must be 1-{} (got {})",
            MAX_IDLE_TIMEOUT_MINS, idle_mins
        ));
    }

    if config.welcome.enabled && config.welcome.channel.is_empty() {
        errors.push("welcome.channel is required when welcome messages are enabled".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_valid_config() -> Config {
        let mut config = Config::default();
        config.discord.token = "valid_token_here".to_string();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = String::new();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("discord.token"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = "YOUR_DISCORD_TOKEN_HERE".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_prefix_with_whitespace_fails() {
        let mut config = make_valid_config();
        config.discord.prefix = "! ".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("whitespace"));
    }

    #[test]
    fn test_miss_limit_bounds() {
        let mut config = make_valid_config();
        config.games.hangman_max_misses = 0;
        assert!(validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("hangman_max_misses"));

        config.games.hangman_max_misses = 7;
        assert!(validate_config(&config).is_err());

        config.games.hangman_max_misses = 6;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_idle_timeout_bounds() {
        let mut config = make_valid_config();
        config.games.idle_timeout_mins = i64::MAX;
        assert!(validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("idle_timeout_mins"));
        assert_eq!(
            config.games.idle_timeout(),
            chrono::Duration::minutes(MAX_IDLE_TIMEOUT_MINS)
        );

        config.games.idle_timeout_mins = 0;
        assert!(validate_config(&config).is_err());

        config.games.idle_timeout_mins = MAX_IDLE_TIMEOUT_MINS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_endpoint_fails() {
        let mut config = make_valid_config();
        config.apis.endpoints.joke = "not a url".to_string();

        let result = validate_config(&config);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("apis.endpoints.joke"));
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = Config::default();
        config.games.nhie_window_secs = 0;

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("discord.token"));
        assert!(message.contains("nhie_window_secs"));
    }
}
