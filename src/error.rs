use thiserror::Error;

/// Shared failure taxonomy for every provider adapter and the resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LyricsError {
    /// Title and artist were both blank.
    #[error("search query is empty")]
    EmptyQuery,

    /// The search ran but matched nothing at the requested offset.
    #[error("no track found")]
    NoTrackFound,

    /// Unexpected adapter failure; carries the original diagnostic.
    #[error("internal error: {0}")]
    Internal(String),

    /// DNS, connect or timeout failure.
    #[error("no connection: {0}")]
    NoConnection(String),

    /// The batch driver saw too many consecutive misses.
    #[error("provider is rate limiting requests")]
    RateLimited,

    /// A credential could not be fetched or extracted.
    #[error("token unavailable: {0}")]
    TokenUnavailable(String),
}

impl LyricsError {
    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }

    /// Classify a transport error. Only connect and timeout failures count as
    /// connectivity problems; everything else is an adapter failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::NoConnection(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }

    /// Outcomes the batch driver counts towards its rate-limit heuristic.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoTrackFound)
    }
}

pub type Result<T> = std::result::Result<T, LyricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_keeps_message() {
        let err = LyricsError::internal("unexpected field `foo`");
        assert_eq!(err, LyricsError::Internal("unexpected field `foo`".into()));
        assert!(err.to_string().contains("unexpected field"));
    }

    #[test]
    fn test_only_no_track_found_is_not_found() {
        assert!(LyricsError::NoTrackFound.is_not_found());
        assert!(!LyricsError::EmptyQuery.is_not_found());
        assert!(!LyricsError::NoConnection("dns".into()).is_not_found());
        assert!(!LyricsError::internal("x").is_not_found());
    }
}
