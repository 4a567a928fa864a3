//! Pure session lifecycle rules: expiry, idle-pause and sampling.
//!
//! All functions take explicit `now` timestamps (epoch ms) so callers
//! and tests control the clock.

use super::session::{Sampled, Session};
use crate::config::Timeouts;

/// True once more than `timeout` ms have passed since `since`.
pub fn is_expired(since: u64, timeout: u64, now: u64) -> bool {
    now.saturating_sub(since) > timeout
}

/// A session expires when idle past `session_idle_expire` or older than
/// `max_session_life` overall.
pub fn is_session_expired(session: &Session, timeouts: &Timeouts, now: u64) -> bool {
    is_expired(session.started_at, timeouts.max_session_life, now)
        || is_expired(session.last_activity, timeouts.session_idle_expire, now)
}

/// Separate, shorter threshold that pauses recording without rotating
/// the session id.
pub fn is_idle_past_pause(last_activity: u64, timeouts: &Timeouts, now: u64) -> bool {
    is_expired(last_activity, timeouts.session_idle_pause, now)
}

/// Draw the sampling decision for a new session. A session-rate hit
/// wins; otherwise buffering applies when an error sample rate policy
/// is active.
pub fn sample(session_sample_rate: f64, allow_buffering: bool) -> Sampled {
    if sample_rate_hit(session_sample_rate) {
        Sampled::Session
    } else if allow_buffering {
        Sampled::Buffer
    } else {
        Sampled::No
    }
}

fn sample_rate_hit(rate: f64) -> bool {
    if rate <= 0.0 {
        return false;
    }
    if rate >= 1.0 {
        return true;
    }
    rand::random::<f64>() < rate
}
