//! Clients for the third-party content services.
//!
//! Every relay issues a single request, decodes the body into an explicit
//! response struct and hands back the few fields the bot formats. Any
//! mismatch with the expected shape is a `RelayError::Shape`.

pub mod ai;
pub mod content;
pub mod media;
pub mod words;

use std::sync::Arc;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::common::error::RelayError;
use crate::config::types::{ApiConfig, EndpointsConfig};

pub use ai::{chunk_message, AiReply, DISCORD_MESSAGE_LIMIT};
pub use content::PromptKind;

/// Shared client for all content services. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
}

impl RelayClient {
    /// Build the client with the configured request timeout.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .user_agent(concat!("functopus/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config.clone()),
        })
    }

    pub fn has_gemini(&self) -> bool {
        self.config.gemini_api_key.is_some()
    }

    pub fn has_tenor(&self) -> bool {
        self.config.tenor_api_key.is_some()
    }

    pub fn has_giphy(&self) -> bool {
        self.config.giphy_api_key.is_some()
    }

    fn endpoints(&self) -> &EndpointsConfig {
        &self.config.endpoints
    }

    fn key(key: &Option<String>, feature: &'static str) -> Result<String, RelayError> {
        key.clone().ok_or(RelayError::Disabled { feature })
    }

    /// Send a request and decode its JSON body.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RelayError> {
        let response = request.send().await?.error_for_status()?;
        let body = response.bytes().await?;
        decode(&body)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, RelayError> {
        self.fetch(self.http.get(url)).await
    }
}

/// Decode a response body into its expected shape.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, RelayError> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    /// Endpoints that refuse connections immediately.
    pub(crate) fn unreachable_config() -> ApiConfig {
        let mut config = ApiConfig::default();
        config.timeout_secs = 2;
        let dead = "http://127.0.0.1:1/";
        let endpoints = &mut config.endpoints;
        for url in [
            &mut endpoints.meme,
            &mut endpoints.joke,
            &mut endpoints.fact,
            &mut endpoints.compliment,
            &mut endpoints.roast,
            &mut endpoints.truth_or_dare,
            &mut endpoints.random_word,
            &mut endpoints.tenor_search,
            &mut endpoints.giphy_search,
            &mut endpoints.giphy_translate,
            &mut endpoints.gemini,
        ] {
            *url = dead.to_string();
        }
        config
    }

    #[test]
    fn test_feature_flags_follow_keys() {
        let mut config = ApiConfig::default();
        config.tenor_api_key = Some("t".to_string());
        let client = assert_ok!(RelayClient::new(&config));

        assert!(client.has_tenor());
        assert!(!client.has_gemini());
        assert!(!client.has_giphy());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let client = assert_ok!(RelayClient::new(&unreachable_config()));
        let err = assert_err!(client.joke().await);
        assert!(matches!(err, RelayError::Transport(_) | RelayError::Timeout));
    }

    #[tokio::test]
    async fn test_missing_key_is_disabled() {
        let client = assert_ok!(RelayClient::new(&unreachable_config()));
        let err = assert_err!(client.gif("cats").await);
        assert!(matches!(err, RelayError::Disabled { feature: "GIF search" }));
    }
}
