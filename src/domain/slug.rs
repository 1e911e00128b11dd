//! Preset identifiers: a human-readable slug derived from the title plus a
//! base36 creation-timestamp suffix, unique by construction.

use slug::slugify;
use time::OffsetDateTime;

/// Base used when the title slugifies to nothing (all symbols, for example);
/// the timestamp suffix still keeps the id unique.
const FALLBACK_BASE: &str = "preset";

/// Derive the preset id from its title and creation time.
///
/// `"A vs B"` created at unix-millis `m` becomes `a-vs-b-<m in base36>`.
pub fn preset_slug(title: &str, created_at: OffsetDateTime) -> String {
    let base = slugify(title);
    let base = if base.is_empty() { FALLBACK_BASE } else { &base };
    let millis = (created_at.unix_timestamp_nanos() / 1_000_000).max(0) as u128;
    format!("{base}-{}", to_base36(millis))
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ascii")
}
