use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use time::OffsetDateTime;

pub const DB_FILE: &str = "cache.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedLyrics {
    pub lrc_content: String,
    pub fetched_at: i64,
}

pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    #[cfg(test)]
    fn open_in_memory() -> anyhow::Result<Self> {
        let s = Self {
            conn: Connection::open_in_memory()?,
        };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS lyrics_cache (
  provider TEXT NOT NULL,
  track_key TEXT NOT NULL,
  lrc_content TEXT NOT NULL,
  fetched_at INTEGER NOT NULL,
  PRIMARY KEY (provider, track_key)
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    /// Cache lyrics for a provider track
    pub fn cache_lyrics(
        &self,
        provider: &str,
        track_key: &str,
        lrc_content: &str,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO lyrics_cache(provider, track_key, lrc_content, fetched_at)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(provider, track_key) DO UPDATE SET
  lrc_content=excluded.lrc_content,
  fetched_at=excluded.fetched_at
"#,
                params![provider, track_key, lrc_content, now_unix],
            )
            .context("cache lyrics")?;
        Ok(())
    }

    /// Get cached lyrics
    pub fn get_lyrics(
        &self,
        provider: &str,
        track_key: &str,
    ) -> anyhow::Result<Option<CachedLyrics>> {
        self.conn
            .query_row(
                "SELECT lrc_content, fetched_at FROM lyrics_cache
                 WHERE provider=?1 AND track_key=?2",
                params![provider, track_key],
                |row| {
                    Ok(CachedLyrics {
                        lrc_content: row.get(0)?,
                        fetched_at: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("read cached lyrics")
    }

    pub fn clear_lyrics(&self) -> anyhow::Result<usize> {
        self.conn
            .execute("DELETE FROM lyrics_cache", [])
            .context("clear lyrics cache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lyrics_round_trip_and_upsert() {
        let s = Storage::open_in_memory().unwrap();
        assert_eq!(s.get_lyrics("lrclib", "lrclib:2").unwrap(), None);

        s.cache_lyrics("lrclib", "lrclib:2", "[00:01.00]old", 100).unwrap();
        s.cache_lyrics("lrclib", "lrclib:2", "[00:01.00]new", 200).unwrap();
        assert_eq!(
            s.get_lyrics("lrclib", "lrclib:2").unwrap(),
            Some(CachedLyrics {
                lrc_content: "[00:01.00]new".into(),
                fetched_at: 200
            })
        );
    }

    #[test]
    fn test_entries_are_per_provider() {
        let s = Storage::open_in_memory().unwrap();
        s.cache_lyrics("netease", "netease:7", "a", 1).unwrap();
        assert_eq!(s.get_lyrics("apple", "netease:7").unwrap(), None);
        assert_eq!(s.clear_lyrics().unwrap(), 1);
        assert_eq!(s.get_lyrics("netease", "netease:7").unwrap(), None);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(DB_FILE);
        let s = Storage::open(&path).unwrap();
        s.cache_lyrics("qq", "qq:{}", "x", now_unix()).unwrap();
        assert!(path.exists());
        assert!(now_unix() > 1_600_000_000);
    }
}
