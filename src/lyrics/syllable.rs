//! Word-level lyrics payload codec
//!
//! Providers return JSON tagged `"Syllable"` (per-syllable timing) or
//! `"Line"` (line timing only). Decoding tries the strict typed shape first
//! and silently falls back to a looser reading of the same payload; only when
//! both fail is an error returned.

use super::document::{LrcDocument, LrcLine, Syllable, SyllableLine};
use super::LyricsOptions;
use crate::error::LyricsError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PayloadKind {
    Syllable,
    Line,
}

#[derive(Debug, Deserialize)]
struct StrictPayload {
    #[serde(rename = "type")]
    kind: PayloadKind,
    content: Vec<StrictLine>,
}

#[derive(Debug, Deserialize)]
struct StrictLine {
    text: Vec<StrictSyllable>,
    timestamp: u64,
    endtime: u64,
    #[serde(rename = "oppositeTurn")]
    opposite_turn: bool,
    background: bool,
    #[serde(rename = "backgroundText")]
    background_text: Vec<StrictSyllable>,
}

#[derive(Debug, Deserialize)]
struct StrictSyllable {
    text: String,
    part: bool,
    timestamp: u64,
    endtime: u64,
}

impl From<StrictSyllable> for Syllable {
    fn from(s: StrictSyllable) -> Self {
        Syllable::new(s.text, s.timestamp, s.endtime, s.part)
    }
}

impl StrictLine {
    fn into_line(self, kind: PayloadKind) -> LrcLine {
        match kind {
            PayloadKind::Line => {
                let text = self.text.into_iter().next().map(|s| s.text).unwrap_or_default();
                LrcLine::plain(self.timestamp, text)
            }
            PayloadKind::Syllable => LrcLine::Syllabic(SyllableLine {
                syllables: self.text.into_iter().map(Syllable::from).collect(),
                start_ms: self.timestamp,
                end_ms: self.endtime,
                is_opposite_speaker: self.opposite_turn,
                has_background_vocals: self.background,
                background_syllables: self
                    .background_text
                    .into_iter()
                    .map(Syllable::from)
                    .collect(),
            }),
        }
    }
}

/// Decode a provider payload into a document.
pub fn decode(payload: &str) -> Result<LrcDocument, LyricsError> {
    match serde_json::from_str::<StrictPayload>(payload) {
        Ok(strict) => {
            let kind = strict.kind;
            Ok(LrcDocument::new(
                strict.content.into_iter().map(|l| l.into_line(kind)).collect(),
            ))
        }
        Err(strict_err) => {
            tracing::debug!("strict lyrics payload rejected ({strict_err}), trying loose shape");
            decode_loose(payload)
        }
    }
}

/// Decode and encode in one step. `Ok(None)` means the payload held no lines.
pub fn convert(payload: &str, options: &LyricsOptions) -> Result<Option<String>, LyricsError> {
    let doc = decode(payload)?;
    if doc.is_empty() {
        return Ok(None);
    }
    Ok(Some(doc.encode(options.multi_person_word_by_word)))
}

fn decode_loose(payload: &str) -> Result<LrcDocument, LyricsError> {
    let root: Value = serde_json::from_str(payload)
        .map_err(|e| LyricsError::internal(format!("lyrics payload is not JSON: {e}")))?;

    let kind = match root.get("type").and_then(Value::as_str) {
        Some(t) if t.eq_ignore_ascii_case("syllable") => PayloadKind::Syllable,
        _ => PayloadKind::Line,
    };
    let content = root
        .get("content")
        .or_else(|| root.get("lines"))
        .or(Some(&root))
        .and_then(Value::as_array)
        .ok_or_else(|| LyricsError::internal("lyrics payload has no content array"))?;

    let lines = content.iter().filter_map(|l| loose_line(l, kind)).collect();
    Ok(LrcDocument::new(lines))
}

fn loose_line(v: &Value, kind: PayloadKind) -> Option<LrcLine> {
    let line_start = v.get("timestamp").and_then(millis);
    let line_end = v.get("endtime").and_then(millis);
    let syllables = loose_syllables(v.get("text"), line_start, line_end);
    let start_ms = line_start.or_else(|| syllables.first().map(|s| s.start_ms))?;
    let end_ms = line_end
        .or_else(|| syllables.last().map(|s| s.end_ms))
        .unwrap_or(start_ms);

    match kind {
        PayloadKind::Line => {
            let text = syllables.into_iter().next().map(|s| s.text).unwrap_or_default();
            Some(LrcLine::plain(start_ms, text))
        }
        PayloadKind::Syllable => {
            let background_syllables =
                loose_syllables(v.get("backgroundText"), Some(start_ms), Some(end_ms));
            let has_background_vocals = v
                .get("background")
                .and_then(Value::as_bool)
                .unwrap_or(!background_syllables.is_empty());
            let is_opposite_speaker = v
                .get("oppositeTurn")
                .or_else(|| v.get("opposite_turn"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            Some(LrcLine::Syllabic(SyllableLine {
                syllables,
                start_ms,
                end_ms,
                is_opposite_speaker,
                has_background_vocals,
                background_syllables,
            }))
        }
    }
}

/// A plain-string `text` becomes one syllable spanning the line's own timing.
fn loose_syllables(
    v: Option<&Value>,
    line_start: Option<u64>,
    line_end: Option<u64>,
) -> Vec<Syllable> {
    match v {
        Some(Value::String(text)) => {
            let start_ms = line_start.unwrap_or(0);
            let end_ms = line_end.unwrap_or(start_ms);
            vec![Syllable::new(text.clone(), start_ms, end_ms, false)]
        }
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|s| {
                let text = s.get("text").and_then(Value::as_str)?.to_string();
                let start_ms = s.get("timestamp").and_then(millis).unwrap_or(0);
                let end_ms = s.get("endtime").and_then(millis).unwrap_or(start_ms);
                let part = s.get("part").and_then(Value::as_bool).unwrap_or(false);
                Some(Syllable::new(text, start_ms, end_ms, part))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Milliseconds given as an integer, a float, or a numeric string.
fn millis(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT_SYLLABLE: &str = r#"{
        "type": "Syllable",
        "content": [
            {
                "text": [
                    {"text": "Hel", "part": true, "timestamp": 0, "endtime": 300},
                    {"text": "lo", "part": false, "timestamp": 300, "endtime": 600}
                ],
                "timestamp": 0,
                "endtime": 600,
                "oppositeTurn": true,
                "background": true,
                "backgroundText": [
                    {"text": "(hey)", "part": false, "timestamp": 100, "endtime": 500}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_strict_syllable_payload() {
        let multi = LyricsOptions { multi_person_word_by_word: true };
        let lrc = convert(STRICT_SYLLABLE, &multi).unwrap().unwrap();
        assert_eq!(
            lrc,
            "[00:00.00]v2:<00:00.00>Hello<00:00.60>\n[bg:<00:00.10>(hey)<00:00.50>]"
        );

        let single = LyricsOptions { multi_person_word_by_word: false };
        let lrc = convert(STRICT_SYLLABLE, &single).unwrap().unwrap();
        assert_eq!(lrc, "[00:00.00]<00:00.00>Hello<00:00.60>");
    }

    #[test]
    fn test_line_payload_uses_first_segment() {
        let payload = r#"{"type":"Line","content":[
            {"text":[{"text":"a","timestamp":0}],"timestamp":0},
            {"text":[{"text":"b","timestamp":1500},{"text":"ignored"}],"timestamp":1500}
        ]}"#;
        let lrc = convert(payload, &LyricsOptions::default()).unwrap().unwrap();
        assert_eq!(lrc, "[00:00.00]a\n[00:01.50]b");
    }

    #[test]
    fn test_loose_shape_accepts_strings_and_floats() {
        let payload = r#"{"type":"Syllable","content":[
            {"text":[{"text":"Hi","timestamp":"1000","endtime":1499.6}],"timestamp":"1000"}
        ]}"#;
        let doc = decode(payload).unwrap();
        let LrcLine::Syllabic(line) = &doc.lines[0] else {
            panic!("expected syllable line");
        };
        assert_eq!(line.start_ms, 1000);
        assert_eq!(line.end_ms, 1500);
        assert!(!line.has_background_vocals);
        assert_eq!(line.syllables[0], Syllable::new("Hi", 1000, 1500, false));
    }

    #[test]
    fn test_loose_top_level_array_defaults_to_line() {
        let doc = decode(r#"[{"text":"only line","timestamp":2000}]"#).unwrap();
        assert_eq!(doc.lines, vec![LrcLine::plain(2000, "only line")]);
    }

    #[test]
    fn test_plain_string_syllable_line_keeps_line_timing() {
        let payload = r#"{"type":"Syllable","content":[
            {"text":"whole line","timestamp":61000,"endtime":63500}
        ]}"#;
        let single = LyricsOptions { multi_person_word_by_word: false };
        let lrc = convert(payload, &single).unwrap().unwrap();
        assert_eq!(lrc, "[01:01.00]<01:01.00>whole line<01:03.50>");
    }

    #[test]
    fn test_empty_content_is_no_lyrics() {
        assert_eq!(convert(r#"{"type":"Line","content":[]}"#, &LyricsOptions::default()), Ok(None));
    }

    #[test]
    fn test_unrecognized_payload_is_an_error() {
        assert!(matches!(decode(r#"{"error":"nope"}"#), Err(LyricsError::Internal(_))));
        assert!(matches!(decode("<html>"), Err(LyricsError::Internal(_))));
    }
}
