use super::http::{self, enc};
use super::{wrong_continuation, LyricsProvider, ProviderId};
use crate::error::LyricsError;
use crate::lyrics::{syllable, LyricsOptions, ProviderContinuation, SearchHit, SongQuery, TrackInfo};
use crate::token::{TokenCache, TokenKind};
use async_trait::async_trait;
use reqwest::header::ORIGIN;
use serde::Deserialize;
use std::sync::Arc;

const ARTWORK_SIZE: &str = "500";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Option<Results>,
}

#[derive(Debug, Deserialize)]
struct Results {
    songs: Option<SongPage>,
}

#[derive(Debug, Deserialize)]
struct SongPage {
    #[serde(default)]
    data: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct Song {
    id: String,
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
struct Attributes {
    name: String,
    #[serde(rename = "artistName", default)]
    artist_name: String,
    #[serde(default)]
    url: String,
    artwork: Option<Artwork>,
}

#[derive(Debug, Deserialize)]
struct Artwork {
    url: String,
}

/// Apple Music catalog search (scraped web-player bearer token) with
/// word-level lyrics from the syllable proxy.
pub struct AppleProvider {
    client: reqwest::Client,
    tokens: Arc<TokenCache>,
    api_url: String,
    storefront: String,
    proxy_url: String,
}

impl AppleProvider {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<TokenCache>,
        api_url: &str,
        storefront: &str,
        proxy_url: &str,
    ) -> Self {
        Self {
            client,
            tokens,
            api_url: api_url.trim_end_matches('/').to_string(),
            storefront: storefront.to_string(),
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
        }
    }
}

fn artwork_link(template: &str) -> String {
    template.replace("{w}", ARTWORK_SIZE).replace("{h}", ARTWORK_SIZE)
}

#[async_trait]
impl LyricsProvider for AppleProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Apple
    }

    async fn search(&self, query: &SongQuery, offset: u32) -> Result<SearchHit, LyricsError> {
        let text = query.search_text()?;
        let url = format!(
            "{}/v1/catalog/{}/search?term={}&types=songs&limit=1&offset={}",
            self.api_url,
            self.storefront,
            enc(&text),
            offset
        );
        tracing::debug!("apple search: {url}");

        let response: SearchResponse =
            http::get_json_authorized(&self.tokens, TokenKind::Scraped, |token| {
                self.client
                    .get(&url)
                    .bearer_auth(token)
                    .header(ORIGIN, "https://music.apple.com")
            })
            .await?
            .ok_or(LyricsError::NoTrackFound)?;

        let song = response
            .results
            .and_then(|r| r.songs)
            .and_then(|s| s.data.into_iter().next())
            .ok_or(LyricsError::NoTrackFound)?;
        let id: i64 = song
            .id
            .parse()
            .map_err(|_| LyricsError::internal(format!("non-numeric catalog id `{}`", song.id)))?;

        let attrs = song.attributes;
        Ok(SearchHit {
            track: TrackInfo {
                song_name: attrs.name,
                artist_name: attrs.artist_name,
                song_link: attrs.url,
                album_cover_link: attrs.artwork.map(|a| artwork_link(&a.url)).unwrap_or_default(),
            },
            continuation: ProviderContinuation::Apple(id),
        })
    }

    async fn fetch_lyrics(
        &self,
        continuation: &ProviderContinuation,
        options: &LyricsOptions,
    ) -> Result<Option<String>, LyricsError> {
        let ProviderContinuation::Apple(id) = continuation else {
            return Err(wrong_continuation(self.id(), continuation));
        };

        let url = format!("{}/apple-music/lyrics?id={}", self.proxy_url, id);
        match http::get_text(self.client.get(&url)).await? {
            Some(body) => syllable::convert(&body, options),
            None => Ok(None),
        }
    }
}
