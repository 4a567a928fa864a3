//! Recording event model and the black-box recorder contract.
//!
//! The DOM mutation recorder itself is an external collaborator: it
//! produces timestamped [`RecordingEvent`]s over a channel and this
//! crate never looks inside their `data` payload. Recording events
//! carry timestamps in fractional **seconds**; sessions and config use
//! milliseconds. Conversions live in `crate::util`.

use crate::error::ReplayError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;

/// Recording event type discriminator. Numeric codes are part of the
/// recording wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EventType {
    DomContentLoaded,
    Load,
    /// Full-state snapshot marking the start of a segment's replayable
    /// state (a "checkout").
    FullSnapshot,
    IncrementalSnapshot,
    Meta,
    /// Breadcrumbs, performance spans and other sidecar records.
    Custom,
}

impl From<EventType> for u8 {
    fn from(value: EventType) -> Self {
        match value {
            EventType::DomContentLoaded => 0,
            EventType::Load => 1,
            EventType::FullSnapshot => 2,
            EventType::IncrementalSnapshot => 3,
            EventType::Meta => 4,
            EventType::Custom => 5,
        }
    }
}

impl TryFrom<u8> for EventType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::DomContentLoaded),
            1 => Ok(Self::Load),
            2 => Ok(Self::FullSnapshot),
            3 => Ok(Self::IncrementalSnapshot),
            4 => Ok(Self::Meta),
            5 => Ok(Self::Custom),
            other => Err(format!("unknown recording event type {other}")),
        }
    }
}

/// One recorded event. Immutable once created, consumed exactly once by
/// the event buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Fractional seconds since the Unix epoch.
    pub timestamp: f64,
    /// Opaque payload specific to `event_type`.
    pub data: serde_json::Value,
}

impl RecordingEvent {
    /// Wrap a breadcrumb into a custom recording event.
    pub fn breadcrumb(category: &str, timestamp_sec: f64, data: Option<serde_json::Value>) -> Self {
        let mut payload = json!({
            "type": "default",
            "category": category,
            "timestamp": timestamp_sec,
        });
        if let Some(data) = data {
            payload["data"] = data;
        }
        Self {
            event_type: EventType::Custom,
            timestamp: timestamp_sec,
            data: json!({
                "tag": "breadcrumb",
                "payload": payload,
            }),
        }
    }

    /// Wrap a performance span into a custom recording event.
    pub fn performance_span(timestamp_sec: f64, span: serde_json::Value) -> Self {
        Self {
            event_type: EventType::Custom,
            timestamp: timestamp_sec,
            data: json!({
                "tag": "performanceSpan",
                "payload": span,
            }),
        }
    }

    pub fn is_checkout(&self) -> bool {
        self.event_type == EventType::FullSnapshot
    }
}

/// An event as emitted by the recorder, with its checkout flag.
#[derive(Debug, Clone)]
pub struct EmittedEvent {
    pub event: RecordingEvent,
    pub is_checkout: bool,
}

/// Options handed to the recorder on start.
#[derive(Debug, Clone, Default)]
pub struct RecorderOptions {
    /// Force a checkout every N milliseconds. Set while recording in
    /// buffer mode so the rolling window stays bounded.
    pub checkout_every_ms: Option<u64>,
}

/// Black-box DOM recorder collaborator. Implementations emit events on
/// the channel returned by `start`; the container consumes them and
/// never inspects payloads.
pub trait Recorder: Send + Sync {
    /// Begin recording. The first event on the returned channel must be
    /// a checkout (full snapshot).
    fn start(
        &self,
        options: RecorderOptions,
    ) -> Result<mpsc::UnboundedReceiver<EmittedEvent>, ReplayError>;

    /// Stop recording and close the emit channel.
    fn stop(&self) -> Result<(), ReplayError>;

    /// Force a full snapshot. With `checkout`, the snapshot starts a
    /// new replayable segment window.
    fn take_full_snapshot(&self, checkout: bool) -> Result<(), ReplayError>;

    /// The name of this recorder implementation.
    fn name(&self) -> &str;
}
