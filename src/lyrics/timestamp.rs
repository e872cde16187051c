//! Millisecond <-> `mm:ss.xx` conversion
//!
//! LRC timestamps carry centisecond precision, so encoding floors to the
//! nearest 10ms. Minutes are not capped at 99.

/// Format milliseconds as `mm:ss.xx`, e.g. 61234 -> `01:01.23`.
pub fn encode(ms: u64) -> String {
    let min = ms / 60_000;
    let sec = (ms % 60_000) / 1000;
    let centi = (ms % 1000) / 10;
    format!("{min:02}:{sec:02}.{centi:02}")
}

/// Parse `mm:ss`, `mm:ss.x`, `mm:ss.xx`, `mm:ss.xxx` or `mm:ss:xx` into
/// milliseconds.
pub fn decode(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.trim().split([':', '.']).collect();

    match parts.len() {
        2 => {
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            to_ms(min, sec, 0)
        }
        3 => {
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            let frac = parts[2];
            // "3" is tenths, "34" centiseconds, "340" milliseconds
            let ms: u64 = match frac.len() {
                1 => frac.parse::<u64>().ok()? * 100,
                2 => frac.parse::<u64>().ok()? * 10,
                3 => frac.parse().ok()?,
                _ => return None,
            };
            to_ms(min, sec, ms)
        }
        _ => None,
    }
}

/// `None` when the stamp does not fit in a `u64`.
fn to_ms(min: u64, sec: u64, ms: u64) -> Option<u64> {
    min.checked_mul(60_000)?
        .checked_add(sec.checked_mul(1000)?)?
        .checked_add(ms)
}
