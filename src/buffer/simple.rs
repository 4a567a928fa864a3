//! Uncompressed in-memory event buffer backend.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{BufferError, EventBuffer, RecordingPayload};
use crate::recording::RecordingEvent;

/// An event buffer backed by a mutex-protected vector. Adds and
/// `finish` serialize on the lock, so no add can be lost mid-finish.
pub struct SimpleEventBuffer {
    events: Mutex<Vec<RecordingEvent>>,
}

impl SimpleEventBuffer {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

impl Default for SimpleEventBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBuffer for SimpleEventBuffer {
    async fn add(&self, event: RecordingEvent, trim_to_checkout: bool) -> Result<(), BufferError> {
        let mut events = self.events.lock();
        if trim_to_checkout {
            events.clear();
        }
        events.push(event);
        Ok(())
    }

    async fn finish(&self) -> Result<RecordingPayload, BufferError> {
        let drained: Vec<RecordingEvent> = {
            let mut events = self.events.lock();
            std::mem::take(&mut *events)
        };
        let json = serde_json::to_string(&drained)?;
        Ok(RecordingPayload::Json(json))
    }

    fn has_events(&self) -> bool {
        !self.events.lock().is_empty()
    }

    fn earliest_timestamp(&self) -> Option<f64> {
        let events = self.events.lock();
        events
            .iter()
            .map(|e| e.timestamp)
            .min_by(|a, b| a.total_cmp(b))
    }

    fn destroy(&self) {
        self.events.lock().clear();
    }

    fn name(&self) -> &str {
        "simple"
    }
}
