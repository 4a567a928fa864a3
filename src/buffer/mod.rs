//! Append-only holder of serialized recording events.
//!
//! Two interchangeable backends sit behind the [`EventBuffer`] trait:
//! a synchronous in-memory array and a worker-delegated streaming
//! compressor. `finish()` is destructive: it atomically extracts and
//! clears buffered content, and concurrent `add` calls are serialized
//! against it by the backend itself, never by callers.

pub mod compressed;
pub mod simple;

pub use compressed::CompressedEventBuffer;
pub use simple::SimpleEventBuffer;

use crate::recording::RecordingEvent;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// The backend's worker is gone. Fatal for the current flush
    /// attempt, not locally retryable.
    #[error("event buffer worker is unavailable")]
    WorkerUnavailable,

    #[error("failed to serialize recording event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

/// A finished recording payload, ready for delivery as one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingPayload {
    /// Plain JSON array of recording events.
    Json(String),
    /// Zlib-compressed JSON array of recording events.
    Compressed(Vec<u8>),
}

impl RecordingPayload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Json(s) => s.as_bytes(),
            Self::Compressed(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed(_))
    }
}

/// Capability contract shared by both buffer backends.
#[async_trait]
pub trait EventBuffer: Send + Sync {
    /// Append an event. With `trim_to_checkout`, the event begins a new
    /// rolling window and everything buffered before it is dropped
    /// (used on checkouts in buffer mode). May be asynchronous; callers
    /// must await before assuming durability.
    async fn add(&self, event: RecordingEvent, trim_to_checkout: bool) -> Result<(), BufferError>;

    /// Extract and clear all buffered events as one serialized payload.
    async fn finish(&self) -> Result<RecordingPayload, BufferError>;

    fn has_events(&self) -> bool;

    /// Timestamp (fractional seconds) of the earliest buffered event.
    fn earliest_timestamp(&self) -> Option<f64>;

    /// Release backend resources. Must be invoked on every
    /// container-stop path.
    fn destroy(&self);

    /// The name of this buffer implementation.
    fn name(&self) -> &str;
}

/// Factory: pick the backend from config.
pub fn create_event_buffer(use_compression: bool) -> Arc<dyn EventBuffer> {
    if use_compression {
        Arc::new(CompressedEventBuffer::new())
    } else {
        Arc::new(SimpleEventBuffer::new())
    }
}
