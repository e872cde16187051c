//! Lyrics data model and LRC codecs
//!
//! This module provides:
//! - Query and match types shared by every provider
//! - Millisecond <-> `mm:ss.xx` timestamp conversion
//! - An LRC text parser for line-synced provider bodies
//! - The syllable payload codec for word-level lyrics

pub mod document;
pub mod parser;
pub mod syllable;
pub mod timestamp;

pub use document::{LrcDocument, LrcLine, Syllable, SyllableLine};
pub use parser::parse_lrc;

use crate::error::LyricsError;
use serde::{Deserialize, Serialize};

/// Search input. Either field may be blank, but not both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongQuery {
    pub song_name: String,
    pub artist_name: String,
}

impl SongQuery {
    pub fn new(song_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            song_name: song_name.into(),
            artist_name: artist_name.into(),
        }
    }

    pub fn song(&self) -> &str {
        self.song_name.trim()
    }

    pub fn artist(&self) -> &str {
        self.artist_name.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.song().is_empty() && self.artist().is_empty()
    }

    /// Combined "song artist" text, or `EmptyQuery` when nothing is left after
    /// trimming. Adapters call this before building any request.
    pub fn search_text(&self) -> Result<String, LyricsError> {
        if self.is_blank() {
            return Err(LyricsError::EmptyQuery);
        }
        let text = match (self.song(), self.artist()) {
            (song, "") => song.to_string(),
            ("", artist) => artist.to_string(),
            (song, artist) => format!("{song} {artist}"),
        };
        Ok(text)
    }
}

/// Provider-specific id needed for the lyrics call that follows a search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderContinuation {
    SpotifyTrack(String),
    LrcLib(i64),
    Netease(i64),
    Apple(i64),
    Qq(String),
    Musixmatch(i64),
}

impl ProviderContinuation {
    /// Stable string form used as the lyrics cache key.
    pub fn cache_key(&self) -> String {
        match self {
            Self::SpotifyTrack(id) => format!("spotify:{id}"),
            Self::LrcLib(id) => format!("lrclib:{id}"),
            Self::Netease(id) => format!("netease:{id}"),
            Self::Apple(id) => format!("apple:{id}"),
            Self::Qq(payload) => format!("qq:{payload}"),
            Self::Musixmatch(id) => format!("musixmatch:{id}"),
        }
    }
}

/// Normalized track metadata as returned by an adapter search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub song_name: String,
    pub artist_name: String,
    pub song_link: String,
    pub album_cover_link: String,
}

/// Raw adapter search result: track metadata plus the id for the lyrics call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub track: TrackInfo,
    pub continuation: ProviderContinuation,
}

/// A resolved match. Built by the resolver from a `SearchHit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMatch {
    pub song_name: String,
    pub artist_name: String,
    pub song_link: String,
    pub album_cover_link: String,
    pub continuation: ProviderContinuation,
}

impl From<SearchHit> for SongMatch {
    fn from(hit: SearchHit) -> Self {
        let SearchHit { track, continuation } = hit;
        Self {
            song_name: track.song_name,
            artist_name: track.artist_name,
            song_link: track.song_link,
            album_cover_link: track.album_cover_link,
            continuation,
        }
    }
}

/// Encoding switches for a lyrics fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LyricsOptions {
    /// Emit `v1:`/`v2:` speaker prefixes and `[bg:...]` blocks.
    pub multi_person_word_by_word: bool,
}

impl Default for LyricsOptions {
    fn default() -> Self {
        Self {
            multi_person_word_by_word: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_text_combines_fields() {
        let q = SongQuery::new("  Hello ", "Adele");
        assert_eq!(q.search_text().unwrap(), "Hello Adele");
        assert_eq!(SongQuery::new("Hello", "").search_text().unwrap(), "Hello");
        assert_eq!(SongQuery::new("", "Adele").search_text().unwrap(), "Adele");
    }

    #[test]
    fn test_blank_query_is_rejected() {
        assert_eq!(SongQuery::new("", "").search_text(), Err(LyricsError::EmptyQuery));
        assert_eq!(SongQuery::new("  ", "\t").search_text(), Err(LyricsError::EmptyQuery));
    }

    #[test]
    fn test_cache_key_is_provider_scoped() {
        assert_eq!(ProviderContinuation::LrcLib(7).cache_key(), "lrclib:7");
        assert_ne!(
            ProviderContinuation::Netease(7).cache_key(),
            ProviderContinuation::Apple(7).cache_key()
        );
    }
}
