//! AI chat completions (Google Gemini).

use serde::Deserialize;
use serde_json::json;

use super::RelayClient;
use crate::common::error::RelayError;

/// Discord's per-message character limit.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

const CHAT_TEMPERATURE: f64 = 0.7;
const CHAT_MAX_TOKENS: u32 = 1024;

const WORD_PROMPT: &str = "Provide a single, common, lowercase English word between 5 and 10 letters long, suitable for a game of Hangman. \
The word must be purely alphabetic. Do not include any other text, numbers, or punctuation, just the word itself. Example: 'banana'";
const WORD_TEMPERATURE: f64 = 0.8;
const WORD_MAX_TOKENS: u32 = 10;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

/// What the model answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiReply {
    Text(String),
    /// The prompt was refused, with the reported reason.
    Blocked(String),
}

impl GenerateResponse {
    fn into_reply(self) -> Result<AiReply, RelayError> {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);

        match (text, self.prompt_feedback) {
            (Some(text), _) => Ok(AiReply::Text(text)),
            (None, Some(feedback)) => Ok(AiReply::Blocked(
                feedback
                    .block_reason
                    .unwrap_or_else(|| "No specific reason provided.".to_string()),
            )),
            (None, None) => Err(RelayError::Shape(
                "response has neither candidates nor prompt feedback".to_string(),
            )),
        }
    }
}

impl RelayClient {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        timeout: std::time::Duration,
    ) -> Result<AiReply, RelayError> {
        let key = Self::key(&self.config.gemini_api_key, "AI chat")?;
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_tokens,
            }
        });

        let request = self
            .http
            .post(&self.endpoints().gemini)
            .query(&[("key", key.as_str())])
            .timeout(timeout)
            .json(&payload);
        let response: GenerateResponse = self.fetch(request).await?;
        response.into_reply()
    }

    /// Ask the model a free-form question.
    pub async fn ask(&self, prompt: &str) -> Result<AiReply, RelayError> {
        self.generate(
            prompt,
            CHAT_TEMPERATURE,
            CHAT_MAX_TOKENS,
            self.config.ai_timeout(),
        )
        .await
    }

    /// Ask the model for a hangman word. The word is not validated here.
    pub async fn ai_word(&self) -> Result<String, RelayError> {
        match self
            .generate(
                WORD_PROMPT,
                WORD_TEMPERATURE,
                WORD_MAX_TOKENS,
                self.config.timeout(),
            )
            .await?
        {
            AiReply::Text(text) => Ok(text),
            AiReply::Blocked(reason) => Err(RelayError::Shape(format!(
                "word prompt blocked: {}",
                reason
            ))),
        }
    }
}

/// Split text into chunks of at most `limit` characters.
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}
