//! Explicit debounce timer state.
//!
//! Replaces callback-library debounce semantics with a plain struct and
//! a pure firing decision: the deadline is the earlier of
//! `last_request + min_delay` and `first_request + max_delay`, so a
//! steady stream of requests cannot postpone a flush past the max
//! delay.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct DebounceState {
    first_request_at: Option<Instant>,
    last_request_at: Option<Instant>,
}

impl DebounceState {
    /// Record a flush request at `now`, arming (or re-arming) the timer.
    pub fn note_request(&mut self, now: Instant) {
        if self.first_request_at.is_none() {
            self.first_request_at = Some(now);
        }
        self.last_request_at = Some(now);
    }

    pub fn is_armed(&self) -> bool {
        self.first_request_at.is_some()
    }

    /// When the pending request should fire, if one is armed.
    pub fn deadline(&self, min_delay: Duration, max_delay: Duration) -> Option<Instant> {
        let first = self.first_request_at?;
        let last = self.last_request_at.unwrap_or(first);
        Some((last + min_delay).min(first + max_delay))
    }

    /// Pure firing decision for `now`.
    pub fn should_fire(&self, now: Instant, min_delay: Duration, max_delay: Duration) -> bool {
        self.deadline(min_delay, max_delay)
            .is_some_and(|deadline| now >= deadline)
    }

    /// Disarm without firing.
    pub fn reset(&mut self) {
        self.first_request_at = None;
        self.last_request_at = None;
    }
}
