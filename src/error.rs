//! Error taxonomy for the replay pipeline.
//!
//! Transient delivery failures are retried inside [`crate::delivery`];
//! everything surfaced through this type is terminal for the operation
//! that produced it.

use crate::buffer::BufferError;
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// `start()` was called while a session-mode recording is running.
    #[error("replay recording is already in progress")]
    AlreadyRecording,

    /// `start()`/`startBuffering()` was called while buffering.
    #[error("replay buffering is in progress, call `flush()` to send the buffered replay")]
    AlreadyBuffering,

    /// The event buffer backend failed; fatal for the current flush.
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// The transport failed in a way that is not retried.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// All delivery attempts for a segment were exhausted.
    #[error("max retries exceeded sending replay segment")]
    MaxRetriesExceeded,

    /// The backend rate-limited the delivery. Not retried.
    #[error("replay delivery was rate limited")]
    RateLimited,

    /// Definitive non-retryable rejection from the backend.
    #[error("replay delivery rejected with status {0}")]
    Rejected(u16),

    #[error("failed to serialize replay payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("session store error: {0}")]
    SessionStore(String),

    #[error("recorder error: {0}")]
    Recorder(String),
}

impl ReplayError {
    /// True for failures that must disable the whole replay: stop
    /// recording, drop the session, attempt no further segments.
    pub fn is_terminal_for_replay(&self) -> bool {
        matches!(
            self,
            Self::MaxRetriesExceeded | Self::RateLimited | Self::Rejected(_) | Self::Buffer(_)
        )
    }
}
