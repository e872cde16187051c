//! LRCLIB adapter
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use super::http::{self, enc};
use super::{wrong_continuation, LyricsProvider, ProviderId};
use crate::error::LyricsError;
use crate::lyrics::{
    parse_lrc, LyricsOptions, ProviderContinuation, SearchHit, SongQuery, TrackInfo,
};
use async_trait::async_trait;
use serde::Deserialize;

/// LRCLIB API record
#[derive(Debug, Deserialize, Clone)]
pub struct LrclibRecord {
    id: i64,
    #[serde(rename = "trackName", default)]
    track_name: String,
    #[serde(rename = "artistName", default)]
    artist_name: String,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

impl LrclibRecord {
    fn has_synced(&self) -> bool {
        self.synced_lyrics.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct LrclibProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibProvider {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, query: &SongQuery, text: &str) -> String {
        match (query.song(), query.artist()) {
            (song, artist) if !song.is_empty() && !artist.is_empty() => format!(
                "{}/search?track_name={}&artist_name={}",
                self.base_url,
                enc(song),
                enc(artist)
            ),
            _ => format!("{}/search?q={}", self.base_url, enc(text)),
        }
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn id(&self) -> ProviderId {
        ProviderId::LrcLib
    }

    async fn search(&self, query: &SongQuery, offset: u32) -> Result<SearchHit, LyricsError> {
        let text = query.search_text()?;
        let url = self.search_url(query, &text);
        tracing::debug!("lrclib search: {url}");

        let results: Vec<LrclibRecord> = http::get_json(self.client.get(&url))
            .await?
            .ok_or(LyricsError::NoTrackFound)?;

        // Prefer records with synced lyrics, keep provider order otherwise
        let (mut ranked, unsynced): (Vec<_>, Vec<_>) =
            results.into_iter().partition(LrclibRecord::has_synced);
        ranked.extend(unsynced);

        let record = ranked.into_iter().nth(offset as usize).ok_or(LyricsError::NoTrackFound)?;
        Ok(SearchHit {
            track: TrackInfo {
                song_link: format!("{}/get/{}", self.base_url, record.id),
                song_name: record.track_name,
                artist_name: record.artist_name,
                album_cover_link: String::new(),
            },
            continuation: ProviderContinuation::LrcLib(record.id),
        })
    }

    async fn fetch_lyrics(
        &self,
        continuation: &ProviderContinuation,
        _options: &LyricsOptions,
    ) -> Result<Option<String>, LyricsError> {
        let ProviderContinuation::LrcLib(id) = continuation else {
            return Err(wrong_continuation(self.id(), continuation));
        };

        let url = format!("{}/get/{}", self.base_url, id);
        let Some(record) = http::get_json::<LrclibRecord>(self.client.get(&url)).await? else {
            return Ok(None);
        };

        let Some(synced) = record.synced_lyrics.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        let doc = parse_lrc(&synced);
        if doc.is_empty() {
            return Ok(None);
        }
        Ok(Some(doc.encode(false)))
    }
}
