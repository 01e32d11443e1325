//! Configuration file parsing (HOCON format).

use std::path::Path;

use hocon::HoconLoader;
use tracing::info;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON file, or use defaults when it doesn't exist.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        info!(
            "No config file at {}, using defaults and environment",
            path.display()
        );
        Ok(Config::default())
    }
}

/// Load configuration from a HOCON string.
#[cfg(test)]
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_str_partial() {
        let config = load_config_str(
            r#"
            discord {
                token = "abc"
                prefix = "?"
            }
            games {
                hangman_max_misses = 4
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.token, "abc");
        assert_eq!(config.discord.prefix, "?");
        assert_eq!(config.games.hangman_max_misses, 4);
        // Untouched sections keep their defaults
        assert_eq!(config.games.nhie_window_secs, 30);
        assert_eq!(config.welcome.channel, "general");
        assert!(config.apis.gemini_api_key.is_none());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config_or_default("/nonexistent/functopus.conf").unwrap();
        assert_eq!(config.discord.prefix, "!");
        assert!(config.discord.token.is_empty());
    }
}
