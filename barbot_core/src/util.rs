//! Common time helpers for barbot_core.
use std::time::Duration;

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
#[inline]
pub fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// `elapsed / total` clamped to `[0, 1]`. A zero total counts as finished.
#[inline]
pub fn fraction(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

/// Render as "M minutes S seconds", truncating fractional seconds.
pub fn format_minutes_seconds(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{} minutes {} seconds", secs / 60, secs % 60)
}
