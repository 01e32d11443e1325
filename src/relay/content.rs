//! Text content relays: memes, jokes, facts, compliments, roasts and
//! party-game prompts.

use serde::Deserialize;

use super::RelayClient;
use crate::common::error::RelayError;

#[derive(Debug, Clone, Deserialize)]
pub struct Meme {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Joke {
    pub setup: String,
    pub punchline: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Fact {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Compliment {
    compliment: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Insult {
    insult: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Question {
    question: String,
}

/// Kinds of prompts served by the truth-or-dare service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Truth,
    Dare,
    NeverHaveIEver,
}

impl PromptKind {
    fn path(self) -> &'static str {
        match self {
            PromptKind::Truth => "truth",
            PromptKind::Dare => "dare",
            PromptKind::NeverHaveIEver => "nhie",
        }
    }
}

impl Joke {
    pub fn format(&self) -> String {
        format!("**{}**\n\n{}", self.setup, self.punchline)
    }
}

impl Fact {
    pub fn format(&self) -> String {
        format!("🤯 **Useless Fact:**\n{}", self.text)
    }
}

impl Meme {
    pub fn format(&self) -> String {
        match self.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => format!("**{}**\n{}", title, self.url),
            None => self.url.clone(),
        }
    }
}

impl RelayClient {
    pub async fn meme(&self) -> Result<Meme, RelayError> {
        self.get(&self.endpoints().meme).await
    }

    pub async fn joke(&self) -> Result<Joke, RelayError> {
        self.get(&self.endpoints().joke).await
    }

    pub async fn fact(&self) -> Result<Fact, RelayError> {
        self.get(&self.endpoints().fact).await
    }

    pub async fn compliment(&self) -> Result<String, RelayError> {
        let body: Compliment = self.get(&self.endpoints().compliment).await?;
        Ok(body.compliment)
    }

    pub async fn roast(&self) -> Result<String, RelayError> {
        let body: Insult = self.get(&self.endpoints().roast).await?;
        Ok(body.insult)
    }

    /// Fetch a truth, dare or never-have-I-ever prompt with the given rating.
    pub async fn question(&self, kind: PromptKind, rating: &str) -> Result<String, RelayError> {
        let url = format!(
            "{}/{}",
            self.endpoints().truth_or_dare.trim_end_matches('/'),
            kind.path()
        );
        let body: Question = self
            .fetch(self.http.get(url).query(&[("rating", rating)]))
            .await?;
        Ok(body.question)
    }

    /// Fetch one random English word.
    pub async fn random_word(&self) -> Result<String, RelayError> {
        let words: Vec<String> = self.get(&self.endpoints().random_word).await?;
        words
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::Shape("empty word list".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::decode;

    #[test]
    fn test_meme_shape() {
        let meme: Meme = decode(
            br#"{"postLink":"https://redd.it/x","subreddit":"memes","title":"Cat",
                "url":"https://i.redd.it/cat.png","nsfw":false,"ups":10}"#,
        )
        .unwrap();
        assert_eq!(meme.format(), "**Cat**\nhttps://i.redd.it/cat.png");

        let bare: Meme = decode(br#"{"url":"https://i.redd.it/dog.png"}"#).unwrap();
        assert_eq!(bare.format(), "https://i.redd.it/dog.png");
    }

    #[test]
    fn test_joke_shape() {
        let joke: Joke = decode(
            br#"{"type":"general","setup":"Why?","punchline":"Because.","id":1}"#,
        )
        .unwrap();
        assert_eq!(joke.format(), "**Why?**\n\nBecause.");
    }

    #[test]
    fn test_joke_missing_field_is_shape_error() {
        let result = decode::<Joke>(br#"{"setup":"Why?"}"#);
        assert!(matches!(result, Err(RelayError::Shape(_))));
    }

    #[test]
    fn test_fact_shape() {
        let fact: Fact = decode(br#"{"id":"1","text":"Bananas are berries.","language":"en"}"#)
            .unwrap();
        assert_eq!(fact.format(), "🤯 **Useless Fact:**\nBananas are berries.");
    }

    #[test]
    fn test_compliment_and_insult_shapes() {
        let c: Compliment = decode(br#"{"compliment":"You rock."}"#).unwrap();
        assert_eq!(c.compliment, "You rock.");
        let i: Insult = decode(br#"{"number":"1","insult":"You smell.","created":"x"}"#).unwrap();
        assert_eq!(i.insult, "You smell.");
        assert!(decode::<Insult>(br#"{"text":"nope"}"#).is_err());
    }

    #[test]
    fn test_question_shape() {
        let q: Question = decode(
            br#"{"id":"a","type":"TRUTH","rating":"PG","question":"What is your fear?"}"#,
        )
        .unwrap();
        assert_eq!(q.question, "What is your fear?");
    }

    #[test]
    fn test_prompt_paths() {
        assert_eq!(PromptKind::Truth.path(), "truth");
        assert_eq!(PromptKind::Dare.path(), "dare");
        assert_eq!(PromptKind::NeverHaveIEver.path(), "nhie");
    }
}
