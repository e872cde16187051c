//! Provider credential cache
//!
//! Two kinds of credential are held:
//! - a session token with a fixed 30 minute lifetime, refreshed lazily on use
//! - a scraped bearer token with no known expiry, kept until a caller reports
//!   that it was rejected
//!
//! Each kind sits behind its own async mutex that is held across the fetch,
//! so concurrent callers with nothing cached share one fetch.

pub mod sources;

use crate::error::LyricsError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const SESSION_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Source of "now" in unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Performs one credential fetch sequence.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self) -> Result<String, LyricsError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Session,
    Scraped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub value: String,
    pub obtained_at_ms: u64,
    pub ttl_ms: Option<u64>,
}

impl TokenRecord {
    /// A TTL-bearing record is stale once `now - obtained > ttl`.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        match self.ttl_ms {
            Some(ttl) => now_ms.saturating_sub(self.obtained_at_ms) <= ttl,
            None => true,
        }
    }
}

struct TokenSlot {
    record: Mutex<Option<TokenRecord>>,
    source: Arc<dyn TokenSource>,
    ttl_ms: Option<u64>,
}

impl TokenSlot {
    fn new(source: Arc<dyn TokenSource>, ttl: Option<Duration>) -> Self {
        Self {
            record: Mutex::new(None),
            source,
            ttl_ms: ttl.map(|d| d.as_millis() as u64),
        }
    }

    async fn get(&self, clock: &dyn Clock) -> Result<String, LyricsError> {
        let mut guard = self.record.lock().await;
        if let Some(record) = guard.as_ref()
            && record.is_fresh(clock.now_ms())
        {
            return Ok(record.value.clone());
        }

        let value = self.source.fetch().await?;
        *guard = Some(TokenRecord {
            value: value.clone(),
            obtained_at_ms: clock.now_ms(),
            ttl_ms: self.ttl_ms,
        });
        Ok(value)
    }

    async fn clear(&self) {
        *self.record.lock().await = None;
    }
}

pub struct TokenCache {
    clock: Arc<dyn Clock>,
    session: TokenSlot,
    scraped: TokenSlot,
}

impl TokenCache {
    pub fn new(
        clock: Arc<dyn Clock>,
        session_source: Arc<dyn TokenSource>,
        scraped_source: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            clock,
            session: TokenSlot::new(session_source, Some(SESSION_TOKEN_TTL)),
            scraped: TokenSlot::new(scraped_source, None),
        }
    }

    pub async fn session_token(&self) -> Result<String, LyricsError> {
        self.session.get(self.clock.as_ref()).await
    }

    pub async fn scraped_token(&self) -> Result<String, LyricsError> {
        self.scraped.get(self.clock.as_ref()).await
    }

    pub async fn token(&self, kind: TokenKind) -> Result<String, LyricsError> {
        match kind {
            TokenKind::Session => self.session_token().await,
            TokenKind::Scraped => self.scraped_token().await,
        }
    }

    /// Drop a cached credential after the provider rejected it.
    pub async fn invalidate(&self, kind: TokenKind) {
        tracing::debug!("invalidating {kind:?} token");
        match kind {
            TokenKind::Session => self.session.clear().await,
            TokenKind::Scraped => self.scraped.clear().await,
        }
    }
}
