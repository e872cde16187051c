//! In-memory LRC document and its text encoding
//!
//! Line-synced rows encode as `[mm:ss.xx]text`. Word-level rows encode as
//!
//! ```text
//! [00:01.00]v1:<00:01.00>Hel<00:01.20>lo <00:01.50>world<00:02.00>
//! [bg:<00:01.10>(ooh)<00:01.90>]
//! ```
//!
//! Lines are written in the order they were received.

use super::timestamp;
use std::fmt::Write as _;

/// One timed syllable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Syllable {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    /// The next syllable belongs to the same word; no space is written after.
    pub is_word_continuation: bool,
}

impl Syllable {
    pub fn new(
        text: impl Into<String>,
        start_ms: u64,
        end_ms: u64,
        is_word_continuation: bool,
    ) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms,
            is_word_continuation,
        }
    }
}

/// A word-level lyric line, optionally with a background vocal track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyllableLine {
    pub syllables: Vec<Syllable>,
    pub start_ms: u64,
    pub end_ms: u64,
    pub is_opposite_speaker: bool,
    pub has_background_vocals: bool,
    pub background_syllables: Vec<Syllable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LrcLine {
    Plain { time_ms: u64, text: String },
    Syllabic(SyllableLine),
}

impl LrcLine {
    pub fn plain(time_ms: u64, text: impl Into<String>) -> Self {
        Self::Plain {
            time_ms,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LrcDocument {
    pub lines: Vec<LrcLine>,
}

impl LrcDocument {
    pub fn new(lines: Vec<LrcLine>) -> Self {
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render the LRC body. `multi_person` enables speaker prefixes and
    /// background blocks on word-level lines. No trailing newline.
    pub fn encode(&self, multi_person: bool) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                LrcLine::Plain { time_ms, text } => {
                    let _ = write!(out, "[{}]{}", timestamp::encode(*time_ms), text);
                }
                LrcLine::Syllabic(line) => write_syllable_line(&mut out, line, multi_person),
            }
            out.push('\n');
        }
        while out.ends_with('\n') {
            out.pop();
        }
        out
    }
}

fn write_syllable_line(out: &mut String, line: &SyllableLine, multi_person: bool) {
    let _ = write!(out, "[{}]", timestamp::encode(line.start_ms));
    if multi_person {
        out.push_str(if line.is_opposite_speaker { "v2:" } else { "v1:" });
    }
    write_syllables(out, &line.syllables);

    if multi_person && line.has_background_vocals {
        out.push_str("\n[bg:");
        write_syllables(out, &line.background_syllables);
        out.push(']');
    }
}

fn write_syllables(out: &mut String, syllables: &[Syllable]) {
    // Time of the last written (or merged) closing boundary.
    let mut boundary: Option<String> = None;

    for (i, syl) in syllables.iter().enumerate() {
        let next = syllables.get(i + 1);
        let start = timestamp::encode(syl.start_ms);
        let end = timestamp::encode(syl.end_ms);

        if boundary.as_deref() != Some(start.as_str()) {
            let _ = write!(out, "<{start}>");
        }
        out.push_str(&syl.text);
        if !syl.is_word_continuation && next.is_some() {
            out.push(' ');
        }

        // A continuation that runs straight into the next syllable is one word.
        let joins_next = syl.is_word_continuation
            && next.is_some_and(|n| timestamp::encode(n.start_ms) == end);
        if !joins_next {
            let _ = write!(out, "<{end}>");
        }
        boundary = Some(end);
    }
}
