//! Lyrics provider adapters
//!
//! Every adapter implements [`LyricsProvider`]: a ranked search that yields a
//! [`SearchHit`], then a lyrics fetch keyed by the hit's continuation id.
//! Adapters classify all failures into [`LyricsError`] before returning.

pub mod apple;
pub mod http;
pub mod lrclib;
pub mod musixmatch;
pub mod netease;
pub mod qq;
pub mod spotify;

use crate::config::Config;
use crate::error::LyricsError;
use crate::lyrics::{LyricsOptions, ProviderContinuation, SearchHit, SongQuery};
use crate::token::sources::{ScrapedTokenSource, SessionTokenSource};
use crate::token::{SystemClock, TokenCache};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Spotify,
    LrcLib,
    Netease,
    Apple,
    Qq,
    Musixmatch,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        ProviderId::Spotify,
        ProviderId::LrcLib,
        ProviderId::Netease,
        ProviderId::Apple,
        ProviderId::Qq,
        ProviderId::Musixmatch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spotify => "spotify",
            Self::LrcLib => "lrclib",
            Self::Netease => "netease",
            Self::Apple => "apple",
            Self::Qq => "qq",
            Self::Musixmatch => "musixmatch",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown provider `{s}`"))
    }
}

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Find the `offset`-th ranked match (0-based) for `query`.
    async fn search(&self, query: &SongQuery, offset: u32) -> Result<SearchHit, LyricsError>;

    /// Fetch and encode lyrics. `Ok(None)` means the track has none.
    async fn fetch_lyrics(
        &self,
        continuation: &ProviderContinuation,
        options: &LyricsOptions,
    ) -> Result<Option<String>, LyricsError>;
}

/// Continuation handed to the wrong adapter.
pub(crate) fn wrong_continuation(provider: ProviderId, got: &ProviderContinuation) -> LyricsError {
    LyricsError::internal(format!("{provider} cannot fetch lyrics for {got:?}"))
}

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, Arc<dyn LyricsProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn LyricsProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn with(mut self, provider: Arc<dyn LyricsProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<&Arc<dyn LyricsProvider>> {
        self.providers.get(&id)
    }

    pub fn ids(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.providers.contains_key(id))
            .collect()
    }

    /// All six adapters wired to the configured endpoints with one shared
    /// HTTP client and token cache.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let http = http::build_client(&cfg.http.user_agent, cfg.timeout())?;
        let p = &cfg.providers;

        let tokens = Arc::new(TokenCache::new(
            Arc::new(SystemClock),
            Arc::new(SessionTokenSource::new(http.clone(), &p.spotify_token_url)),
            Arc::new(ScrapedTokenSource::new(http.clone(), &p.apple_page_url)),
        ));

        Ok(Self::new()
            .with(Arc::new(spotify::SpotifyProvider::new(
                http.clone(),
                tokens.clone(),
                &p.spotify_api_url,
                &p.spotify_lyrics_url,
            )))
            .with(Arc::new(lrclib::LrclibProvider::new(http.clone(), &p.lrclib_url)))
            .with(Arc::new(netease::NeteaseProvider::new(http.clone(), &p.netease_url)))
            .with(Arc::new(apple::AppleProvider::new(
                http.clone(),
                tokens,
                &p.apple_api_url,
                &p.apple_storefront,
                &p.proxy_url,
            )))
            .with(Arc::new(qq::QqProvider::new(http.clone(), &p.proxy_url)))
            .with(Arc::new(musixmatch::MusixmatchProvider::new(http, &p.proxy_url))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_parse() {
        assert_eq!("lrclib".parse::<ProviderId>(), Ok(ProviderId::LrcLib));
        assert_eq!("Apple".parse::<ProviderId>(), Ok(ProviderId::Apple));
        assert!("genius".parse::<ProviderId>().is_err());
        for id in ProviderId::ALL {
            assert_eq!(id.to_string().parse::<ProviderId>(), Ok(id));
        }
    }

    #[test]
    fn test_registry_from_config_has_every_provider() {
        let registry = ProviderRegistry::from_config(&Config::default()).unwrap();
        assert_eq!(registry.ids(), ProviderId::ALL.to_vec());
    }
}
