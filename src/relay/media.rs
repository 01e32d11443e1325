//! GIF search (Tenor) and welcome stickers (Giphy).

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use super::RelayClient;
use crate::common::error::RelayError;

const TENOR_CLIENT_KEY: &str = "functopus_discord_bot";
const TENOR_LIMIT: &str = "20";

const STICKER_SEARCH_QUERY: &str = "welcome wave hi hello greeting";
const STICKER_TRANSLATE_PHRASE: &str = "welcome wave hi";
const STICKER_BUNDLE: &str = "messaging_non_clips";
/// Giphy only serves the first results of a search.
const STICKER_MAX_OFFSET: u64 = 1000;

#[derive(Debug, Deserialize)]
struct TenorSearch {
    #[serde(default)]
    results: Vec<TenorResult>,
}

#[derive(Debug, Deserialize)]
struct TenorResult {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    media_formats: HashMap<String, TenorMedia>,
}

#[derive(Debug, Deserialize)]
struct TenorMedia {
    url: String,
}

impl TenorResult {
    fn gif_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.media_formats.get("gif").map(|m| m.url.as_str()))
    }
}

#[derive(Debug, Deserialize)]
struct GiphySearch {
    pagination: GiphyPagination,
}

#[derive(Debug, Deserialize)]
struct GiphyPagination {
    #[serde(default)]
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct GiphyTranslate {
    data: GiphySticker,
}

#[derive(Debug, Deserialize)]
struct GiphySticker {
    images: GiphyImages,
}

#[derive(Debug, Deserialize)]
struct GiphyImages {
    original: GiphyImage,
}

#[derive(Debug, Deserialize)]
struct GiphyImage {
    url: String,
}

/// Pick a random usable GIF URL from a Tenor search.
///
/// `Ok(None)` when the search had no results.
fn pick_gif<R: Rng>(search: &TenorSearch, rng: &mut R) -> Result<Option<String>, RelayError> {
    let Some(choice) = search.results.choose(rng) else {
        return Ok(None);
    };
    choice
        .gif_url()
        .map(|url| Some(url.to_string()))
        .ok_or_else(|| RelayError::Shape("GIF result without a URL".to_string()))
}

impl RelayClient {
    /// Search Tenor and return one random GIF URL.
    pub async fn gif(&self, term: &str) -> Result<Option<String>, RelayError> {
        let key = Self::key(&self.config.tenor_api_key, "GIF search")?;
        let request = self.http.get(&self.endpoints().tenor_search).query(&[
            ("q", term),
            ("key", key.as_str()),
            ("client_key", TENOR_CLIENT_KEY),
            ("limit", TENOR_LIMIT),
            ("media_filter", "minimal"),
            ("contentfilter", "medium"),
        ]);
        let search: TenorSearch = self.fetch(request).await?;
        pick_gif(&search, &mut rand::thread_rng())
    }

    /// Fetch a random welcome sticker URL from Giphy.
    ///
    /// `Ok(None)` when the search finds nothing.
    pub async fn welcome_sticker(&self) -> Result<Option<String>, RelayError> {
        let key = Self::key(&self.config.giphy_api_key, "Welcome stickers")?;

        let request = self.http.get(&self.endpoints().giphy_search).query(&[
            ("api_key", key.as_str()),
            ("q", STICKER_SEARCH_QUERY),
            ("limit", "1"),
            ("rating", "g"),
            ("lang", "en"),
            ("bundle", STICKER_BUNDLE),
        ]);
        let search: GiphySearch = self.fetch(request).await?;
        let total = search.pagination.total_count;
        if total == 0 {
            return Ok(None);
        }

        let offset = rand::thread_rng().gen_range(0..total).min(STICKER_MAX_OFFSET);
        let request = self.http.get(&self.endpoints().giphy_translate).query(&[
            ("api_key", key.as_str()),
            ("s", STICKER_TRANSLATE_PHRASE),
            ("weirdness", "5"),
            ("rating", "g"),
            ("bundle", STICKER_BUNDLE),
            ("offset", offset.to_string().as_str()),
        ]);
        let sticker: GiphyTranslate = self.fetch(request).await?;
        let url = sticker.data.images.original.url;

        Ok(Some(url).filter(|u| !u.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::relay::decode;

    #[test]
    fn test_tenor_prefers_direct_url() {
        let search: TenorSearch = decode(
            br#"{"results":[{"id":"1","url":"https://tenor.com/view/1",
                "media_formats":{"gif":{"url":"https://media.tenor.com/1.gif","dims":[1,1]}}}],
                "next":"20"}"#,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            pick_gif(&search, &mut rng).unwrap().as_deref(),
            Some("https://tenor.com/view/1")
        );
    }

    #[test]
    fn test_tenor_falls_back_to_media_gif() {
        let search: TenorSearch = decode(
            br#"{"results":[{"id":"1","media_formats":{"gif":{"url":"https://media.tenor.com/1.gif"}}}]}"#,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            pick_gif(&search, &mut rng).unwrap().as_deref(),
            Some("https://media.tenor.com/1.gif")
        );
    }

    #[test]
    fn test_tenor_no_results() {
        let search: TenorSearch = decode(br#"{"results":[],"next":""}"#).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(pick_gif(&search, &mut rng).unwrap(), None);
    }

    #[test]
    fn test_tenor_result_without_url_is_shape_error() {
        let search: TenorSearch = decode(br#"{"results":[{"id":"1"}]}"#).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            pick_gif(&search, &mut rng),
            Err(RelayError::Shape(_))
        ));
    }

    #[test]
    fn test_giphy_shapes() {
        let search: GiphySearch = decode(
            br#"{"data":[],"pagination":{"total_count":4321,"count":1,"offset":0},"meta":{}}"#,
        )
        .unwrap();
        assert_eq!(search.pagination.total_count, 4321);

        let sticker: GiphyTranslate = decode(
            br#"{"data":{"id":"x","images":{"original":{"url":"https://media.giphy.com/x.gif","width":"200"}}}}"#,
        )
        .unwrap();
        assert_eq!(sticker.data.images.original.url, "https://media.giphy.com/x.gif");

        // Giphy answers an empty list when the phrase translates to nothing
        assert!(decode::<GiphyTranslate>(br#"{"data":[]}"#).is_err());
    }
}
