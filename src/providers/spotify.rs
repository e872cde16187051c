use super::http::{self, enc};
use super::{wrong_continuation, LyricsProvider, ProviderId};
use crate::error::LyricsError;
use crate::lyrics::{
    timestamp, LrcDocument, LrcLine, LyricsOptions, ProviderContinuation, SearchHit, SongQuery,
    TrackInfo,
};
use crate::token::{TokenCache, TokenKind};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    items: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<Named>,
    album: Option<Album>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LyricsResponse {
    #[serde(default)]
    error: bool,
    #[serde(rename = "syncType")]
    sync_type: Option<String>,
    #[serde(default)]
    lines: Vec<TimedLine>,
}

#[derive(Debug, Deserialize)]
struct TimedLine {
    #[serde(rename = "timeTag")]
    time_tag: String,
    #[serde(default)]
    words: String,
}

/// Spotify catalog search with the anonymous web-player session token, plus
/// a line-synced lyrics endpoint keyed by track id.
pub struct SpotifyProvider {
    client: reqwest::Client,
    tokens: Arc<TokenCache>,
    api_url: String,
    lyrics_url: String,
}

impl SpotifyProvider {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<TokenCache>,
        api_url: &str,
        lyrics_url: &str,
    ) -> Self {
        Self {
            client,
            tokens,
            api_url: api_url.trim_end_matches('/').to_string(),
            lyrics_url: lyrics_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LyricsProvider for SpotifyProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Spotify
    }

    async fn search(&self, query: &SongQuery, offset: u32) -> Result<SearchHit, LyricsError> {
        let text = query.search_text()?;
        let url = format!(
            "{}/search?q={}&type=track&limit=1&offset={}",
            self.api_url,
            enc(&text),
            offset
        );
        tracing::debug!("spotify search: {url}");

        let response: SearchResponse =
            http::get_json_authorized(&self.tokens, TokenKind::Session, |token| {
                self.client.get(&url).bearer_auth(token)
            })
            .await?
            .ok_or(LyricsError::NoTrackFound)?;

        let track = response
            .tracks
            .and_then(|t| t.items.into_iter().next())
            .ok_or(LyricsError::NoTrackFound)?;

        let artist_name = track
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let song_link = track
            .external_urls
            .and_then(|u| u.spotify)
            .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", track.id));
        let album_cover_link = track
            .album
            .and_then(|a| a.images.into_iter().next())
            .map(|i| i.url)
            .unwrap_or_default();

        Ok(SearchHit {
            track: TrackInfo {
                song_name: track.name,
                artist_name,
                song_link,
                album_cover_link,
            },
            continuation: ProviderContinuation::SpotifyTrack(track.id),
        })
    }

    async fn fetch_lyrics(
        &self,
        continuation: &ProviderContinuation,
        _options: &LyricsOptions,
    ) -> Result<Option<String>, LyricsError> {
        let ProviderContinuation::SpotifyTrack(id) = continuation else {
            return Err(wrong_continuation(self.id(), continuation));
        };

        let url = format!("{}/?trackid={}&format=lrc", self.lyrics_url, enc(id));
        let Some(response) = http::get_json::<LyricsResponse>(self.client.get(&url)).await? else {
            return Ok(None);
        };
        if response.error || response.sync_type.as_deref() != Some("LINE_SYNCED") {
            return Ok(None);
        }

        let lines: Vec<LrcLine> = response
            .lines
            .into_iter()
            .filter_map(|l| timestamp::decode(&l.time_tag).map(|ms| LrcLine::plain(ms, l.words)))
            .collect();
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(LrcDocument::new(lines).encode(false)))
    }
}
