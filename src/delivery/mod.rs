//! Segment delivery: envelope building and bounded-retry sending.
//!
//! Transient failures (network errors, 5xx) are retried with an
//! escalating backoff; rate limits and other definitive rejections
//! abort immediately without consuming a retry slot. Exhausting the
//! retry budget is terminal for the whole replay; the container stops
//! recording when it sees [`ReplayError::MaxRetriesExceeded`].

use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::buffer::RecordingPayload;
use crate::error::ReplayError;
use crate::session::Sampled;
use crate::transport::{Transport, TransportResponse};
use crate::util::ms_to_sec;

/// Base retry interval; the escalating sequence below derives from it.
pub const RETRY_BASE_INTERVAL: u64 = 5_000;

/// Maximum retries after the initial attempt (4 total attempts).
pub const RETRY_MAX_COUNT: u32 = 3;

/// Backoff before each retry, in order.
const RETRY_BACKOFF_MS: [u64; RETRY_MAX_COUNT as usize] =
    [RETRY_BASE_INTERVAL, 2 * RETRY_BASE_INTERVAL, 6 * RETRY_BASE_INTERVAL];

/// Context captured for one segment, read-and-cleared from the
/// container when a flush consumes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentContext {
    /// Milliseconds; converted to seconds on the wire.
    pub initial_timestamp_ms: u64,
    pub initial_url: String,
    pub error_ids: BTreeSet<String>,
    pub trace_ids: BTreeSet<String>,
    pub urls: Vec<String>,
}

/// The JSON half of a delivery: one replay event describing a segment.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub replay_id: String,
    pub segment_id: u64,
    /// Fractional seconds.
    pub replay_start_timestamp: f64,
    /// Fractional seconds.
    pub timestamp: f64,
    pub error_ids: Vec<String>,
    pub trace_ids: Vec<String>,
    pub urls: Vec<String>,
    pub replay_type: &'static str,
}

/// Everything needed to deliver one segment.
#[derive(Debug, Clone)]
pub struct SendReplayRequest {
    pub replay_id: String,
    pub recording_data: RecordingPayload,
    pub segment_id: u64,
    pub context: SegmentContext,
    pub replay_type: Sampled,
    /// Milliseconds; when this delivery was initiated.
    pub timestamp_ms: u64,
}

/// A two-part wire payload: replay event JSON plus the recording data
/// as a companion item, newline-delimited.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub event: ReplayEvent,
    pub recording: RecordingPayload,
}

impl Envelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let header = serde_json::json!({
            "event_id": self.event.replay_id,
            "sent_at": chrono::Utc::now().to_rfc3339(),
        });
        let event_json = serde_json::to_vec(&self.event)?;
        let recording_header = serde_json::json!({
            "type": "replay_recording",
            "length": self.recording.len(),
        });

        let mut out = Vec::new();
        out.extend_from_slice(&serde_json::to_vec(&header)?);
        out.push(b'\n');
        out.extend_from_slice(br#"{"type":"replay_event"}"#);
        out.push(b'\n');
        out.extend_from_slice(&event_json);
        out.push(b'\n');
        out.extend_from_slice(&serde_json::to_vec(&recording_header)?);
        out.push(b'\n');
        out.extend_from_slice(self.recording.as_bytes());
        Ok(out)
    }
}

/// Build the replay event for a segment.
pub fn create_replay_event(request: &SendReplayRequest) -> ReplayEvent {
    ReplayEvent {
        event_type: "replay_event",
        replay_id: request.replay_id.clone(),
        segment_id: request.segment_id,
        replay_start_timestamp: ms_to_sec(request.context.initial_timestamp_ms),
        timestamp: ms_to_sec(request.timestamp_ms),
        error_ids: request.context.error_ids.iter().cloned().collect(),
        trace_ids: request.context.trace_ids.iter().cloned().collect(),
        urls: request.context.urls.clone(),
        replay_type: match request.replay_type {
            Sampled::Buffer => "buffer",
            // A promoted or unsampled session still reports as session.
            Sampled::Session | Sampled::No => "session",
        },
    }
}

/// Deliver one segment with bounded retries.
pub async fn send_replay(
    request: SendReplayRequest,
    transport: &dyn Transport,
) -> Result<(), ReplayError> {
    let envelope = Envelope {
        event: create_replay_event(&request),
        recording: request.recording_data.clone(),
    };

    let mut attempt: u32 = 0;
    loop {
        let outcome = transport.send(&envelope).await;
        match outcome {
            Ok(TransportResponse::Success { .. }) => {
                tracing::debug!(
                    replay_id = %request.replay_id,
                    segment_id = request.segment_id,
                    "replay segment delivered"
                );
                return Ok(());
            }
            Ok(TransportResponse::RateLimited { .. }) => {
                tracing::warn!(replay_id = %request.replay_id, "replay delivery rate limited");
                return Err(ReplayError::RateLimited);
            }
            Ok(TransportResponse::Rejected { status }) => {
                tracing::warn!(
                    replay_id = %request.replay_id,
                    status,
                    "replay delivery rejected"
                );
                return Err(ReplayError::Rejected(status));
            }
            Ok(TransportResponse::ServerError { status }) => {
                tracing::debug!(
                    replay_id = %request.replay_id,
                    status,
                    attempt,
                    "transient replay delivery failure"
                );
            }
            Err(err) => {
                tracing::debug!(
                    replay_id = %request.replay_id,
                    error = %err,
                    attempt,
                    "transient replay delivery failure"
                );
            }
        }

        if attempt >= RETRY_MAX_COUNT {
            return Err(ReplayError::MaxRetriesExceeded);
        }
        tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS[attempt as usize])).await;
        attempt += 1;
    }
}
