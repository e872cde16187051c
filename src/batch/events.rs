use crate::lyrics::SongQuery;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub success: usize,
    pub no_lyrics: usize,
    pub failed: usize,
}

impl BatchCounts {
    pub fn total(&self) -> usize {
        self.success + self.no_lyrics + self.failed
    }

    pub(crate) fn record(&mut self, outcome: &SongOutcome) {
        match outcome {
            SongOutcome::Success => self.success += 1,
            SongOutcome::NoLyrics => self.no_lyrics += 1,
            SongOutcome::Failed(_) => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongOutcome {
    Success,
    /// A match was found but it has no synced lyrics.
    NoLyrics,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Completed,
    Cancelled,
    RateLimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub counts: BatchCounts,
    pub status: BatchStatus,
}

#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started { total: usize },
    SongStarted { index: usize, query: SongQuery },
    SongFinished { index: usize, outcome: SongOutcome, counts: BatchCounts },
    Finished(BatchSummary),
}
