//! Sequential bulk downloader
//!
//! Songs are resolved strictly one after another. A run of consecutive
//! `NoTrackFound` results is read as provider throttling and stops the batch.

mod events;

pub use events::{BatchCounts, BatchEvent, BatchStatus, BatchSummary, SongOutcome};

use crate::error::LyricsError;
use crate::lyrics::{LyricsOptions, SongMatch, SongQuery};
use crate::providers::ProviderId;
use crate::resolver::{CancelFlag, Resolver};
use std::path::PathBuf;
use tokio::sync::mpsc;

pub const DEFAULT_NOT_FOUND_THRESHOLD: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub query: SongQuery,
    pub audio_path: Option<PathBuf>,
}

impl BatchItem {
    pub fn new(query: SongQuery, audio_path: Option<PathBuf>) -> Self {
        Self { query, audio_path }
    }
}

/// Destination for lyrics found during a batch.
pub trait LrcSink: Send + Sync {
    fn write(&self, item: &BatchItem, song: &SongMatch, lrc: &str) -> anyhow::Result<()>;
}

pub struct BatchDownloader {
    resolver: Resolver,
    provider: ProviderId,
    options: LyricsOptions,
    not_found_threshold: usize,
    events: Option<mpsc::Sender<BatchEvent>>,
}

impl BatchDownloader {
    pub fn new(resolver: Resolver, provider: ProviderId, options: LyricsOptions) -> Self {
        Self {
            resolver,
            provider,
            options,
            not_found_threshold: DEFAULT_NOT_FOUND_THRESHOLD,
            events: None,
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.not_found_threshold = threshold.max(1);
        self
    }

    pub fn with_events(mut self, tx: mpsc::Sender<BatchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    async fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }

    pub async fn run(
        &mut self,
        items: &[BatchItem],
        sink: &dyn LrcSink,
        cancel: &CancelFlag,
    ) -> BatchSummary {
        let mut counts = BatchCounts::default();
        let mut consecutive_not_found = 0usize;
        let mut status = BatchStatus::Completed;

        self.emit(BatchEvent::Started { total: items.len() }).await;

        for (index, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!("batch cancelled before song {}", index + 1);
                status = BatchStatus::Cancelled;
                break;
            }
            self.emit(BatchEvent::SongStarted {
                index,
                query: item.query.clone(),
            })
            .await;

            let (outcome, not_found) = self.process(item, sink).await;
            if not_found {
                consecutive_not_found += 1;
            } else {
                consecutive_not_found = 0;
            }
            counts.record(&outcome);
            tracing::debug!("song {}: {outcome:?}", index + 1);
            self.emit(BatchEvent::SongFinished { index, outcome, counts }).await;

            if consecutive_not_found >= self.not_found_threshold {
                tracing::warn!(
                    "{}: {consecutive_not_found} songs in a row not found, stopping batch",
                    self.provider
                );
                status = BatchStatus::RateLimited;
                break;
            }
        }

        let summary = BatchSummary { counts, status };
        self.emit(BatchEvent::Finished(summary)).await;
        summary
    }

    /// Resolve one song. The flag is true when the miss counts towards the
    /// rate-limit heuristic.
    async fn process(&mut self, item: &BatchItem, sink: &dyn LrcSink) -> (SongOutcome, bool) {
        let song = match self.resolver.resolve_song(&item.query, 0, self.provider).await {
            Ok(song) => song,
            Err(e) => {
                let not_found = e.is_not_found();
                return (SongOutcome::Failed(e.to_string()), not_found);
            }
        };

        let Some(lrc) = self
            .resolver
            .resolve_lyrics(&song.continuation, self.provider, &self.options)
            .await
        else {
            return (SongOutcome::NoLyrics, false);
        };

        match sink.write(item, &song, &lrc) {
            Ok(()) => (SongOutcome::Success, false),
            Err(e) => {
                tracing::warn!("saving lyrics for `{}` failed: {e:#}", song.song_name);
                (SongOutcome::Failed(format!("{e:#}")), false)
            }
        }
    }
}

impl BatchSummary {
    /// The batch-level error, when the run was stopped by throttling.
    pub fn error(&self) -> Option<LyricsError> {
        (self.status == BatchStatus::RateLimited).then_some(LyricsError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderRegistry;
    use crate::resolver::tests::FakeProvider;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        written: Mutex<Vec<String>>,
        fail: bool,
    }

    impl LrcSink for RecordingSink {
        fn write(&self, _item: &BatchItem, song: &SongMatch, _lrc: &str) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("disk full");
            }
            self.written.lock().unwrap().push(song.song_name.clone());
            Ok(())
        }
    }

    fn items(n: usize) -> Vec<BatchItem> {
        (1..=n)
            .map(|i| BatchItem::new(SongQuery::new(format!("{i}"), "artist"), None))
            .collect()
    }

    fn numbered(query: &SongQuery) -> usize {
        query.song().parse().unwrap()
    }

    fn downloader(fake: &std::sync::Arc<FakeProvider>) -> BatchDownloader {
        let resolver = Resolver::new(ProviderRegistry::new().with(fake.clone()));
        BatchDownloader::new(resolver, ProviderId::LrcLib, LyricsOptions::default())
    }

    #[tokio::test]
    async fn test_five_consecutive_misses_stop_the_batch() {
        let fake = FakeProvider::new(
            |q, o| match numbered(q) {
                3..=7 => Err(LyricsError::NoTrackFound),
                _ => Ok(FakeProvider::hit(q, o)),
            },
            Ok(Some("[00:00.00]la".into())),
        );
        let sink = RecordingSink::default();

        let summary = downloader(&fake).run(&items(10), &sink, &CancelFlag::new()).await;
        assert_eq!(summary.status, BatchStatus::RateLimited);
        assert_eq!(summary.counts.total(), 7);
        assert_eq!(summary.counts, BatchCounts { success: 2, no_lyrics: 0, failed: 5 });
        assert_eq!(summary.error(), Some(LyricsError::RateLimited));
        assert_eq!(fake.searches(), 7);
    }

    #[tokio::test]
    async fn test_other_outcomes_reset_the_miss_counter() {
        let fake = FakeProvider::new(
            |q, o| match numbered(q) {
                1..=4 | 6..=9 => Err(LyricsError::NoTrackFound),
                _ => Ok(FakeProvider::hit(q, o)),
            },
            Ok(None),
        );
        let sink = RecordingSink::default();

        let summary = downloader(&fake).run(&items(10), &sink, &CancelFlag::new()).await;
        assert_eq!(summary.status, BatchStatus::Completed);
        assert_eq!(summary.counts, BatchCounts { success: 0, no_lyrics: 2, failed: 8 });
    }

    #[tokio::test]
    async fn test_connection_errors_do_not_trip_rate_limit() {
        let fake =
            FakeProvider::new(|_, _| Err(LyricsError::NoConnection("offline".into())), Ok(None));
        let sink = RecordingSink::default();

        let summary = downloader(&fake).run(&items(6), &sink, &CancelFlag::new()).await;
        assert_eq!(summary.status, BatchStatus::Completed);
        assert_eq!(summary.counts.failed, 6);
    }

    #[tokio::test]
    async fn test_sink_failure_counts_as_failed() {
        let fake =
            FakeProvider::new(|q, o| Ok(FakeProvider::hit(q, o)), Ok(Some("[00:00.00]la".into())));
        let sink = RecordingSink { fail: true, ..Default::default() };

        let summary = downloader(&fake).run(&items(2), &sink, &CancelFlag::new()).await;
        assert_eq!(summary.counts, BatchCounts { success: 0, no_lyrics: 0, failed: 2 });
    }

    #[tokio::test]
    async fn test_cancel_stops_at_song_boundary() {
        let fake =
            FakeProvider::new(|q, o| Ok(FakeProvider::hit(q, o)), Ok(Some("[00:00.00]la".into())));
        let sink = RecordingSink::default();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let summary = downloader(&fake).run(&items(3), &sink, &cancel).await;
        assert_eq!(summary.status, BatchStatus::Cancelled);
        assert_eq!(summary.counts.total(), 0);
        assert_eq!(fake.searches(), 0);
        assert!(summary.error().is_none());
    }

    #[tokio::test]
    async fn test_progress_reported_after_every_song() {
        let fake =
            FakeProvider::new(|q, o| Ok(FakeProvider::hit(q, o)), Ok(Some("[00:00.00]la".into())));
        let sink = RecordingSink::default();
        let (tx, mut rx) = mpsc::channel(64);

        let summary = downloader(&fake)
            .with_events(tx)
            .run(&items(3), &sink, &CancelFlag::new())
            .await;
        assert_eq!(summary.counts.success, 3);
        assert_eq!(*sink.written.lock().unwrap(), vec!["1", "2", "3"]);

        let mut progress = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let BatchEvent::SongFinished { counts, .. } = event {
                progress.push(counts.total());
            }
        }
        assert_eq!(progress, vec![1, 2, 3]);
    }
}
