//! Normalization helpers shared by the structural parser.
//!
//! Real-world feeds omit, mangle, and mis-declare fields constantly; these
//! helpers fold every malformed value into a documented default instead of
//! failing the parse.

/// Collapses all internal whitespace runs to single spaces and trims.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a playback duration into seconds.
///
/// Accepts a raw-seconds integer or colon-separated `H:M:S` / `M:S`.
/// Anything else is 0.
pub fn parse_duration(s: &str) -> u32 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }

    if let Ok(secs) = s.parse::<u32>() {
        return secs;
    }

    parse_colon_format(s).unwrap_or(0)
}

fn parse_colon_format(s: &str) -> Option<u32> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.len() {
        2 => {
            let mins: u32 = parts[0].trim().parse().ok()?;
            let secs: u32 = parts[1].trim().parse().ok()?;
            mins.checked_mul(60)?.checked_add(secs)
        }
        3 => {
            let hours: u32 = parts[0].trim().parse().ok()?;
            let mins: u32 = parts[1].trim().parse().ok()?;
            let secs: u32 = parts[2].trim().parse().ok()?;
            hours
                .checked_mul(3600)?
                .checked_add(mins.checked_mul(60)?)?
                .checked_add(secs)
        }
        _ => None,
    }
}

/// Parses an enclosure `length` attribute into a byte count.
///
/// Non-numeric or negative values normalize to -1 ("unknown"), never 0.
pub fn parse_file_size(s: &str) -> i64 {
    match s.trim().parse::<i64>() {
        Ok(n) if n >= 0 => n,
        _ => -1,
    }
}

/// Generic binary MIME type used when a feed omits or mangles the real one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Normalizes an enclosure MIME type.
///
/// Empty values and values without a `/` are replaced with
/// [`DEFAULT_MIME_TYPE`] to tolerate feeds that omit or mis-declare it.
pub fn normalize_mime_type(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() || !s.contains('/') {
        DEFAULT_MIME_TYPE.to_owned()
    } else {
        s.to_owned()
    }
}
