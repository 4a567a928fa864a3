//! Small shared helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Convert epoch milliseconds to fractional seconds (recording-event unit).
pub(crate) fn ms_to_sec(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// Convert fractional seconds back to epoch milliseconds.
pub(crate) fn sec_to_ms(sec: f64) -> u64 {
    if sec.is_finite() && sec > 0.0 {
        (sec * 1000.0) as u64
    } else {
        0
    }
}
