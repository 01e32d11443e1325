//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `FUNCTOPUS_DISCORD_TOKEN` - Discord bot token
//! - `FUNCTOPUS_PREFIX` - Command prefix
//! - `FUNCTOPUS_GEMINI_API_KEY` - Gemini key for `!ask`
//! - `FUNCTOPUS_TENOR_API_KEY` - Tenor key for `!gif`
//! - `FUNCTOPUS_GIPHY_API_KEY` - Giphy key for welcome stickers
//! - `FUNCTOPUS_WELCOME_CHANNEL` - Preferred welcome channel name
//!
//! Empty values are treated as unset.

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "FUNCTOPUS";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, |name| env::var(name).ok())
}

/// Apply overrides using `lookup` to resolve variable names.
pub fn apply_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    let get = |suffix: &str| {
        lookup(&format!("{}_{}", ENV_PREFIX, suffix)).filter(|value| !value.trim().is_empty())
    };

    if let Some(token) = get("DISCORD_TOKEN") {
        config.discord.token = token;
    }
    if let Some(prefix) = get("PREFIX") {
        config.discord.prefix = prefix;
    }

    if let Some(key) = get("GEMINI_API_KEY") {
        config.apis.gemini_api_key = Some(key);
    }
    if let Some(key) = get("TENOR_API_KEY") {
        config.apis.tenor_api_key = Some(key);
    }
    if let Some(key) = get("GIPHY_API_KEY") {
        config.apis.giphy_api_key = Some(key);
    }

    if let Some(channel) = get("WELCOME_CHANNEL") {
        config.welcome.channel = channel;
    }

    // A key configured as "" in the file disables the feature
    for key in [
        &mut config.apis.gemini_api_key,
        &mut config.apis.tenor_api_key,
        &mut config.apis.giphy_api_key,
    ] {
        if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            *key = None;
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `FUNCTOPUS_CONFIG` environment variable, otherwise returns "functopus.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "functopus.conf".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "FUNCTOPUS");
    }

    #[test]
    fn test_no_vars_leaves_config_unchanged() {
        let mut config = Config::default();
        config.discord.token = "original_token".to_string();

        let result = apply_overrides(config, lookup_from(&[]));
        assert_eq!(result.discord.token, "original_token");
        assert_eq!(result.discord.prefix, "!");
        assert!(result.apis.gemini_api_key.is_none());
    }

    #[test]
    fn test_overrides_applied() {
        let result = apply_overrides(
            Config::default(),
            lookup_from(&[
                ("FUNCTOPUS_DISCORD_TOKEN", "tok"),
                ("FUNCTOPUS_GEMINI_API_KEY", "gem"),
                ("FUNCTOPUS_TENOR_API_KEY", "ten"),
                ("FUNCTOPUS_WELCOME_CHANNEL", "lobby"),
            ]),
        );
        assert_eq!(result.discord.token, "tok");
        assert_eq!(result.apis.gemini_api_key.as_deref(), Some("gem"));
        assert_eq!(result.apis.tenor_api_key.as_deref(), Some("ten"));
        assert!(result.apis.giphy_api_key.is_none());
        assert_eq!(result.welcome.channel, "lobby");
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let mut config = Config::default();
        config.apis.giphy_api_key = Some("  ".to_string());

        let result = apply_overrides(
            config,
            lookup_from(&[("FUNCTOPUS_GEMINI_API_KEY", ""), ("FUNCTOPUS_PREFIX", "")]),
        );
        assert!(result.apis.gemini_api_key.is_none());
        assert!(result.apis.giphy_api_key.is_none());
        assert_eq!(result.discord.prefix, "!");
    }
}
