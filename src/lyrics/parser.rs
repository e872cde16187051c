//! LRC format parser
//!
//! Turns line-synced LRC text from providers into an [`LrcDocument`]:
//! [mm:ss.xx] Lyrics line here
//!
//! Metadata tags (`[ti:...]`, `[by:...]`) and untimed lines are dropped.
//! Lines carrying several timestamps are expanded in place; nothing is
//! re-sorted.

use super::document::{LrcDocument, LrcLine};
use super::timestamp;

/// Parse LRC text into timed plain lines.
pub fn parse_lrc(content: &str) -> LrcDocument {
    let mut lines = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || is_metadata(line) {
            continue;
        }
        if let Some(parsed) = parse_timed_line(line) {
            lines.extend(parsed);
        }
    }

    LrcDocument::new(lines)
}

/// Metadata tag like [ti:Title]
fn is_metadata(line: &str) -> bool {
    if !line.starts_with('[') {
        return false;
    }
    let Some(end) = line.find(']') else {
        return false;
    };
    let tag_content = &line[1..end];
    let Some(colon_pos) = tag_content.find(':') else {
        return false;
    };
    let tag = &tag_content[..colon_pos];

    // Metadata tags are short alphabetic keys; timestamps start with digits
    !tag.is_empty() && tag.len() <= 6 && tag.chars().all(|c| c.is_ascii_alphabetic())
}

/// Parse a timed line like [00:12.34]Lyrics or [00:12.34][00:15.00]Lyrics
fn parse_timed_line(line: &str) -> Option<Vec<LrcLine>> {
    let mut stamps = Vec::new();
    let mut pos = 0;

    while line[pos..].starts_with('[') {
        let Some(end) = line[pos..].find(']') else {
            break;
        };
        match timestamp::decode(&line[pos + 1..pos + end]) {
            Some(ms) => {
                stamps.push(ms);
                pos += end + 1;
            }
            None => break,
        }
    }

    if stamps.is_empty() {
        return None;
    }

    let text = line[pos..].trim();
    Some(stamps.into_iter().map(|ms| LrcLine::plain(ms, text)).collect())
}
