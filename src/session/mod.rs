//! Session identity, lifecycle policy and persistence.

pub mod policy;
pub mod session;
pub mod store;

pub use session::{Sampled, Session};
pub use store::{InMemorySessionStore, SessionStore, SESSION_STORAGE_KEY};

use crate::config::Timeouts;
use crate::error::ReplayError;

/// Inputs for loading or creating a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Load/persist the session through the store.
    pub sticky: bool,
    pub session_sample_rate: f64,
    /// An error-sample-rate policy is active, so unsampled sessions
    /// fall back to buffer mode instead of not recording.
    pub allow_buffering: bool,
}

/// Whether the returned session was freshly created or restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    New,
    Saved,
}

/// Create a fresh session, drawing a sampling decision and persisting
/// it when sticky.
pub fn create_session(
    store: &dyn SessionStore,
    options: &SessionOptions,
    now_ms: u64,
) -> Result<Session, ReplayError> {
    let sampled = policy::sample(options.session_sample_rate, options.allow_buffering);
    let session = Session::new(sampled, now_ms);
    if options.sticky {
        store.save(&session)?;
    }
    Ok(session)
}

/// Load a valid persisted session or create a new one.
///
/// An expired session with `should_refresh == false` is not renewed:
/// the caller gets an unsampled placeholder and is expected to stop.
pub fn get_or_create_session(
    store: &dyn SessionStore,
    timeouts: &Timeouts,
    current: Option<&Session>,
    options: &SessionOptions,
    now_ms: u64,
) -> Result<(Session, SessionOrigin), ReplayError> {
    let existing = match current {
        Some(session) => Some(session.clone()),
        None if options.sticky => store.load()?,
        None => None,
    };

    if let Some(session) = existing {
        if !policy::is_session_expired(&session, timeouts, now_ms) {
            return Ok((session, SessionOrigin::Saved));
        }
        if !session.should_refresh {
            // Ended a promoted buffer-mode session; never renew it.
            return Ok((Session::new(Sampled::No, now_ms), SessionOrigin::New));
        }
    }

    let session = create_session(store, options, now_ms)?;
    Ok((session, SessionOrigin::New))
}
