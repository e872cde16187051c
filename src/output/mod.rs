//! LRC artifacts on disk
//!
//! A rendered artifact is three header tags followed by the encoded body. It
//! is written beside the audio file as `<name>.lrc`, or embedded in the audio
//! file's own tag under the lyrics key.

use crate::batch::{BatchItem, LrcSink};
use crate::lyrics::{SongMatch, SongQuery};
use anyhow::Context;
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::prelude::Accessor;
use lofty::read_from_path;
use lofty::tag::{ItemKey, Tag};
use std::path::{Path, PathBuf};

pub fn render(song: &str, artist: &str, generator: &str, body: &str) -> String {
    format!("[ti:{song}]\n[ar:{artist}]\n[by:{generator}]\n{body}")
}

pub fn sidecar_path(audio: &Path) -> PathBuf {
    audio.with_extension("lrc")
}

pub fn write_sidecar(audio: &Path, content: &str) -> anyhow::Result<PathBuf> {
    let path = sidecar_path(audio);
    std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
    tracing::info!("saved {}", path.display());
    Ok(path)
}

pub fn embed_lyrics(audio: &Path, content: &str) -> anyhow::Result<()> {
    let mut tagged_file =
        read_from_path(audio).with_context(|| format!("read tags of {}", audio.display()))?;
    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .tag_mut(tag_type)
        .with_context(|| format!("no writable {tag_type:?} tag in {}", audio.display()))?;
    tag.insert_text(ItemKey::Lyrics, content.to_string());

    tagged_file
        .save_to_path(audio, WriteOptions::default())
        .with_context(|| format!("write tags of {}", audio.display()))?;
    tracing::info!("embedded lyrics into {}", audio.display());
    Ok(())
}

/// Search query for an audio file: its title and artist tags, with the file
/// stem standing in for a missing title.
pub fn query_from_audio(path: &Path) -> SongQuery {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (title, artist) = match read_from_path(path) {
        Ok(tagged_file) => {
            let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());
            let title = tag.and_then(|t| t.title().map(|v| v.trim().to_string()));
            let artist = tag.and_then(|t| t.artist().map(|v| v.trim().to_string()));
            (title, artist)
        }
        Err(e) => {
            tracing::debug!("no readable tags in {}: {e}", path.display());
            (None, None)
        }
    };

    SongQuery::new(
        title.filter(|t| !t.is_empty()).unwrap_or(stem),
        artist.unwrap_or_default(),
    )
}

/// Writes batch results next to (or into) each item's audio file.
#[derive(Debug, Clone)]
pub struct FileSink {
    generator: String,
    embed: bool,
}

impl FileSink {
    pub fn new(generator: impl Into<String>, embed: bool) -> Self {
        Self {
            generator: generator.into(),
            embed,
        }
    }
}

impl LrcSink for FileSink {
    fn write(&self, item: &BatchItem, song: &SongMatch, lrc: &str) -> anyhow::Result<()> {
        let audio = item
            .audio_path
            .as_deref()
            .with_context(|| format!("no audio file for `{}`", item.query.song()))?;
        let content = render(&song.song_name, &song.artist_name, &self.generator, lrc);
        if self.embed {
            embed_lyrics(audio, &content)
        } else {
            write_sidecar(audio, &content).map(|_| ())
        }
    }
}
