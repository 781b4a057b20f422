//! Lenient numeric and duration parsing for platform-formatted fields.
//!
//! Counts arrive as bare digits from the API ("123456"), with thousands
//! separators ("1,234"), or abbreviated from scraped pages ("12.3M").
//! Anything unparseable coerces to 0 — except live-viewer counts, where the
//! caller preserves None as "unknown".

use regex::Regex;
use std::sync::OnceLock;

/// Parse counts like "1,234", "500K", "12.3M", "1.2B" into integers.
/// Returns 0 for empty or non-numeric input.
pub fn parse_count(text: &str) -> u64 {
    let cleaned = text.trim().replace(',', "").to_uppercase();
    if cleaned.is_empty() {
        return 0;
    }

    let (number_part, multiplier) = match cleaned.chars().last() {
        Some('K') => (&cleaned[..cleaned.len() - 1], 1_000.0),
        Some('M') => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        Some('B') => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };

    match number_part.parse::<f64>() {
        Ok(n) if n >= 0.0 => (n * multiplier) as u64,
        _ => 0,
    }
}

/// Parse an optional count, keeping None for missing or non-numeric values.
/// Used for live-viewer counts where "unknown" must stay distinguishable
/// from zero.
pub fn parse_count_opt(text: Option<&str>) -> Option<u64> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    text.replace(',', "").parse::<u64>().ok()
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid duration regex")
    })
}

/// Parse an ISO-8601 duration of the form the video platform emits
/// (PT#H#M#S). Returns None for empty or malformed input.
pub fn duration_seconds(duration: &str) -> Option<u32> {
    if duration.is_empty() {
        return None;
    }
    let caps = duration_re().captures(duration)?;
    let group = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str().parse::<u32>().unwrap_or(0))
            .unwrap_or(0)
    };
    Some(group(1) * 3600 + group(2) * 60 + group(3))
}

/// Parse a platform timestamp. The API emits RFC 3339; scraped pages often
/// carry a bare date. Anything else is None.
pub fn parse_timestamp(text: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&chrono::Utc));
    }
    chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
