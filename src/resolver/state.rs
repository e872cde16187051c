use crate::error::LyricsError;

/// Where a single song resolution currently stands.
///
/// `NotSubmitted -> Pending -> {Success, NoTrackFound, EmptyQuery,
/// InternalError, NoConnection}`. A retry from `Success` goes back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionState {
    #[default]
    NotSubmitted,
    Pending,
    Success,
    NoTrackFound,
    EmptyQuery,
    InternalError,
    NoConnection,
}

impl ResolutionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::NotSubmitted => "not submitted",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::NoTrackFound => "no track found",
            Self::EmptyQuery => "empty query",
            Self::InternalError => "internal error",
            Self::NoConnection => "no connection",
        }
    }
}

impl From<&LyricsError> for ResolutionState {
    fn from(err: &LyricsError) -> Self {
        match err {
            LyricsError::EmptyQuery => Self::EmptyQuery,
            LyricsError::NoTrackFound => Self::NoTrackFound,
            LyricsError::NoConnection(_) => Self::NoConnection,
            LyricsError::Internal(_)
            | LyricsError::RateLimited
            | LyricsError::TokenUnavailable(_) => Self::InternalError,
        }
    }
}
