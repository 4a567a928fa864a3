//! Session persistence trait and the in-memory implementation.
//!
//! The browser host backs this with session storage; here the store is
//! a string key/value seam so hosts can plug in whatever persistence
//! they have. Corrupted records load as `None` rather than erroring.

use parking_lot::Mutex;
use std::collections::HashMap;

use super::session::Session;
use crate::error::ReplayError;

/// Storage key for the sticky session record.
pub const SESSION_STORAGE_KEY: &str = "sentryReplaySession";

/// Persistent storage for the current session record.
pub trait SessionStore: Send + Sync {
    /// Persist the session, replacing any existing record.
    fn save(&self, session: &Session) -> Result<(), ReplayError>;

    /// Load the persisted session, if any. Unparseable records are
    /// treated as absent.
    fn load(&self) -> Result<Option<Session>, ReplayError>;

    /// Remove the persisted session.
    fn clear(&self) -> Result<(), ReplayError>;

    /// The name of this session store implementation.
    fn name(&self) -> &str;
}

/// A session store backed by a mutex-protected string map, mirroring
/// the shape of browser session storage.
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&self, session: &Session) -> Result<(), ReplayError> {
        let json = serde_json::to_string(session)?;
        let mut entries = self.entries.lock();
        entries.insert(SESSION_STORAGE_KEY.to_string(), json);
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>, ReplayError> {
        let entries = self.entries.lock();
        let Some(raw) = entries.get(SESSION_STORAGE_KEY) else {
            return Ok(None);
        };
        Ok(serde_json::from_str(raw).ok())
    }

    fn clear(&self) -> Result<(), ReplayError> {
        let mut entries = self.entries.lock();
        entries.remove(SESSION_STORAGE_KEY);
        Ok(())
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
