//! Resolution orchestrator
//!
//! Routes a query to the selected adapter, keeps the continuation returned by
//! the search for the lyrics call that follows, and narrows adapter errors to
//! the caller-facing set.

mod state;

pub use state::ResolutionState;

use crate::error::LyricsError;
use crate::lyrics::{LyricsOptions, ProviderContinuation, SongMatch, SongQuery};
use crate::providers::{LyricsProvider, ProviderId, ProviderRegistry};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation, polled between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { song: SongMatch, lyrics: Option<String> },
    Cancelled,
}

#[derive(Debug, Clone)]
struct LastRequest {
    query: SongQuery,
    offset: u32,
    provider: ProviderId,
}

pub struct Resolver {
    registry: ProviderRegistry,
    state: ResolutionState,
    current: Option<SongMatch>,
    last: Option<LastRequest>,
}

impl Resolver {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            state: ResolutionState::NotSubmitted,
            current: None,
            last: None,
        }
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    /// Match held from the last successful search, if any.
    pub fn current_match(&self) -> Option<&SongMatch> {
        self.current.as_ref()
    }

    pub fn continuation(&self) -> Option<&ProviderContinuation> {
        self.current.as_ref().map(|m| &m.continuation)
    }

    fn provider(&self, id: ProviderId) -> Result<Arc<dyn LyricsProvider>, LyricsError> {
        self.registry
            .get(id)
            .cloned()
            .ok_or_else(|| LyricsError::internal(format!("provider {id} is not registered")))
    }

    /// Search `provider` for the `offset`-th match of `query`.
    ///
    /// Errors are one of `EmptyQuery`, `NoTrackFound`, `NoConnection` or
    /// `Internal`; anything else an adapter returns is folded into `Internal`.
    pub async fn resolve_song(
        &mut self,
        query: &SongQuery,
        offset: u32,
        provider: ProviderId,
    ) -> Result<SongMatch, LyricsError> {
        self.current = None;
        self.state = ResolutionState::Pending;
        self.last = Some(LastRequest {
            query: query.clone(),
            offset,
            provider,
        });

        let result = self.search(query, offset, provider).await;
        match &result {
            Ok(found) => {
                tracing::info!(
                    "{provider}: matched `{}` by `{}`",
                    found.song_name,
                    found.artist_name
                );
                self.current = Some(found.clone());
                self.state = ResolutionState::Success;
            }
            Err(e) => self.state = ResolutionState::from(e),
        }
        result
    }

    async fn search(
        &self,
        query: &SongQuery,
        offset: u32,
        provider: ProviderId,
    ) -> Result<SongMatch, LyricsError> {
        if query.is_blank() {
            return Err(LyricsError::EmptyQuery);
        }
        let adapter = self.provider(provider)?;
        match adapter.search(query, offset).await {
            Ok(hit) => Ok(SongMatch::from(hit)),
            Err(e) => Err(narrow(provider, e)),
        }
    }

    /// Fetch lyrics for a continuation. Every failure reads as "no lyrics".
    pub async fn resolve_lyrics(
        &self,
        continuation: &ProviderContinuation,
        provider: ProviderId,
        options: &LyricsOptions,
    ) -> Option<String> {
        let adapter = match self.provider(provider) {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::warn!("{e}");
                return None;
            }
        };
        match adapter.fetch_lyrics(continuation, options).await {
            Ok(Some(lrc)) => Some(lrc),
            Ok(None) => {
                tracing::info!("{provider}: no lyrics for {}", continuation.cache_key());
                None
            }
            Err(e) => {
                let key = continuation.cache_key();
                tracing::warn!("{provider}: lyrics fetch failed for {key}: {e}");
                None
            }
        }
    }

    /// Repeat the last search one rank further down.
    pub async fn retry_next_match(&mut self) -> Result<SongMatch, LyricsError> {
        let Some(last) = self.last.clone() else {
            return Err(LyricsError::internal("no previous search to retry"));
        };
        let offset = last.offset.saturating_add(1);
        self.resolve_song(&last.query, offset, last.provider).await
    }

    /// Search then fetch, checking `cancel` before each phase.
    pub async fn resolve(
        &mut self,
        query: &SongQuery,
        offset: u32,
        provider: ProviderId,
        options: &LyricsOptions,
        cancel: &CancelFlag,
    ) -> Result<Resolution, LyricsError> {
        if cancel.is_cancelled() {
            return Ok(Resolution::Cancelled);
        }
        let song = self.resolve_song(query, offset, provider).await?;
        if cancel.is_cancelled() {
            return Ok(Resolution::Cancelled);
        }
        let lyrics = self.resolve_lyrics(&song.continuation, provider, options).await;
        Ok(Resolution::Resolved { song, lyrics })
    }
}

fn narrow(provider: ProviderId, err: LyricsError) -> LyricsError {
    match err {
        LyricsError::EmptyQuery
        | LyricsError::NoTrackFound
        | LyricsError::Internal(_)
        | LyricsError::NoConnection(_) => err,
        other => {
            tracing::warn!("{provider}: search failed: {other}");
            LyricsError::Internal(other.to_string())
        }
    }
}
