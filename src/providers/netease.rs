use super::http::{self, enc};
use super::{wrong_continuation, LyricsProvider, ProviderId};
use crate::error::LyricsError;
use crate::lyrics::{
    parse_lrc, LyricsOptions, ProviderContinuation, SearchHit, SongQuery, TrackInfo,
};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    songs: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct Song {
    id: i64,
    name: String,
    #[serde(default, alias = "ar")]
    artists: Vec<Named>,
    #[serde(default, alias = "al")]
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(rename = "picUrl")]
    pic_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LyricResponse {
    lrc: Option<LyricBody>,
}

#[derive(Debug, Deserialize)]
struct LyricBody {
    lyric: Option<String>,
}

/// NetEase Cloud Music, through a public API mirror that pages by offset.
#[derive(Debug, Clone)]
pub struct NeteaseProvider {
    client: reqwest::Client,
    base_url: String,
}

impl NeteaseProvider {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LyricsProvider for NeteaseProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Netease
    }

    async fn search(&self, query: &SongQuery, offset: u32) -> Result<SearchHit, LyricsError> {
        let text = query.search_text()?;
        let url = format!(
            "{}/search?limit=1&type=1&offset={}&keywords={}",
            self.base_url,
            offset,
            enc(&text)
        );
        tracing::debug!("netease search: {url}");

        let response: SearchResponse = http::get_json(self.client.get(&url))
            .await?
            .ok_or(LyricsError::NoTrackFound)?;
        let song = response
            .result
            .and_then(|r| r.songs.into_iter().next())
            .ok_or(LyricsError::NoTrackFound)?;

        let artist_name = song
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(SearchHit {
            track: TrackInfo {
                song_name: song.name,
                artist_name,
                song_link: format!("https://music.163.com/#/song?id={}", song.id),
                album_cover_link: song.album.and_then(|a| a.pic_url).unwrap_or_default(),
            },
            continuation: ProviderContinuation::Netease(song.id),
        })
    }

    async fn fetch_lyrics(
        &self,
        continuation: &ProviderContinuation,
        _options: &LyricsOptions,
    ) -> Result<Option<String>, LyricsError> {
        let ProviderContinuation::Netease(id) = continuation else {
            return Err(wrong_continuation(self.id(), continuation));
        };

        let url = format!("{}/lyric?id={}", self.base_url, id);
        let Some(response) = http::get_json::<LyricResponse>(self.client.get(&url)).await? else {
            return Ok(None);
        };
        let Some(lyric) = response.lrc.and_then(|l| l.lyric) else {
            return Ok(None);
        };

        let doc = parse_lrc(&lyric);
        if doc.is_empty() {
            return Ok(None);
        }
        Ok(Some(doc.encode(false)))
    }
}
