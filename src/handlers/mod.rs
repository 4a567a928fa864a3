//! Host-facing hooks: user activity classification, event throttling,
//! mutation-burst guards and enrichment of SDK/network callbacks.
//!
//! Everything here is pure decision logic; the container owns the state
//! transitions these decisions drive.

use serde_json::json;
use std::collections::BTreeMap;
use std::collections::VecDeque;

use crate::config::{Experiments, NetworkCaptureConfig};
use crate::network::performance::{make_network_span, ReplaySpan, SpanOp};
use crate::network::{
    build_request_or_response, build_skipped_request_or_response, get_allowed_headers,
    get_body_size, get_body_string, get_network_body, parse_content_length, url_matches,
    RequestBody,
};
use crate::recording::RecordingEvent;
use crate::util::ms_to_sec;

/// Default event throttle: at most this many custom events per window.
pub const THROTTLE_LIMIT: usize = 300;

/// Default throttle window, ms.
pub const THROTTLE_WINDOW: u64 = 5_000;

// ── User activity ─────────────────────────────────────────────────

/// Interactions that count as user activity and extend the idle
/// deadline. Visibility, focus and blur are deliberately absent: a tab
/// coming to the foreground is not the user doing something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySource {
    Click,
    Keypress,
    Input,
}

impl ActivitySource {
    /// Map a DOM-style event name onto an activity source, if it is one.
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "click" => Some(Self::Click),
            "keypress" => Some(Self::Keypress),
            "input" => Some(Self::Input),
            _ => None,
        }
    }
}

// ── Throttling ────────────────────────────────────────────────────

/// Outcome of offering one event to the throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleResult {
    Accepted,
    /// First rejection of this episode; the caller records a
    /// `replay.throttled` breadcrumb exactly once.
    ThrottledFirst,
    Throttled,
}

/// Sliding-window event throttle.
#[derive(Debug)]
pub struct Throttle {
    limit: usize,
    window_ms: u64,
    accepted_at: VecDeque<u64>,
    throttled: bool,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(THROTTLE_LIMIT, THROTTLE_WINDOW)
    }
}

impl Throttle {
    pub fn new(limit: usize, window_ms: u64) -> Self {
        Self {
            limit,
            window_ms,
            accepted_at: VecDeque::new(),
            throttled: false,
        }
    }

    /// Offer one event at `now_ms`.
    pub fn offer(&mut self, now_ms: u64) -> ThrottleResult {
        let horizon = now_ms.saturating_sub(self.window_ms);
        while self
            .accepted_at
            .front()
            .is_some_and(|&at| at <= horizon)
        {
            self.accepted_at.pop_front();
        }

        if self.accepted_at.len() >= self.limit {
            let first = !self.throttled;
            self.throttled = true;
            return if first {
                ThrottleResult::ThrottledFirst
            } else {
                ThrottleResult::Throttled
            };
        }

        self.throttled = false;
        self.accepted_at.push_back(now_ms);
        ThrottleResult::Accepted
    }
}

// ── Breadcrumb constructors ───────────────────────────────────────

pub fn focus_breadcrumb(now_ms: u64) -> RecordingEvent {
    RecordingEvent::breadcrumb("ui.focus", ms_to_sec(now_ms), None)
}

pub fn blur_breadcrumb(now_ms: u64) -> RecordingEvent {
    RecordingEvent::breadcrumb("ui.blur", ms_to_sec(now_ms), None)
}

pub fn throttled_breadcrumb(now_ms: u64) -> RecordingEvent {
    RecordingEvent::breadcrumb("replay.throttled", ms_to_sec(now_ms), None)
}

pub fn mutations_breadcrumb(now_ms: u64, count: usize) -> RecordingEvent {
    RecordingEvent::breadcrumb("replay.mutations", ms_to_sec(now_ms), Some(json!({ "count": count })))
}

// ── Mutation bursts ───────────────────────────────────────────────

/// What to do with one batch of DOM mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationDecision {
    Record,
    /// Record the batch and emit a `replay.mutations` breadcrumb.
    RecordWithBreadcrumb,
    /// Suppress the incremental diff and force a full snapshot instead.
    ForceSnapshot,
}

pub fn on_mutation(count: usize, experiments: &Experiments) -> MutationDecision {
    if experiments.mutation_limit > 0 && count > experiments.mutation_limit {
        return MutationDecision::ForceSnapshot;
    }
    if experiments.mutation_breadcrumb_limit > 0 && count > experiments.mutation_breadcrumb_limit {
        return MutationDecision::RecordWithBreadcrumb;
    }
    MutationDecision::Record
}

// ── After-send SDK hook ───────────────────────────────────────────

/// The subset of an SDK event the replay pipeline inspects after the
/// host transport reports on it.
#[derive(Debug, Clone)]
pub enum SdkEvent {
    Error {
        event_id: String,
        /// The replay id the event was tagged with, if any.
        replay_tag: Option<String>,
    },
    Transaction {
        trace_id: Option<String>,
    },
}

/// What the container should do with a delivered SDK event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterSendAction {
    /// Record the error id on the current segment context. `promote` is
    /// set when the event was tagged with `replay_id`, which in buffer
    /// mode upgrades the replay to a full session.
    CollectError { event_id: String, promote: bool },
    CollectTrace { trace_id: String },
    Ignore,
}

/// Classify a delivered SDK event. Only events the host transport
/// accepted (2xx, or no status at all for transports that do not
/// report one) contribute ids.
pub fn after_send_event(event: &SdkEvent, status: Option<u16>, replay_id: &str) -> AfterSendAction {
    if let Some(status) = status {
        if !(200..300).contains(&status) {
            return AfterSendAction::Ignore;
        }
    }

    match event {
        SdkEvent::Error {
            event_id,
            replay_tag,
        } => AfterSendAction::CollectError {
            event_id: event_id.clone(),
            promote: replay_tag.as_deref() == Some(replay_id),
        },
        SdkEvent::Transaction {
            trace_id: Some(trace_id),
        } => AfterSendAction::CollectTrace {
            trace_id: trace_id.clone(),
        },
        SdkEvent::Transaction { trace_id: None } => AfterSendAction::Ignore,
    }
}

// ── Network capture ───────────────────────────────────────────────

/// A fetch/XHR exchange as observed by the host instrumentation.
/// Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Default)]
pub struct NetworkRequestInfo {
    pub url: String,
    pub method: Option<String>,
    pub status_code: Option<u16>,
    pub start_ms: f64,
    pub end_ms: f64,
    pub request_headers: BTreeMap<String, String>,
    pub response_headers: BTreeMap<String, String>,
    pub request_body: Option<RequestBody>,
    pub response_body_text: Option<String>,
    /// True for `fetch`, false for XHR; selects the span op.
    pub is_fetch: bool,
}

/// Enrich one network exchange into a performance span.
///
/// URLs outside the configured target set keep a minimal span whose
/// request and response are both tagged `URL_SKIPPED`.
pub fn capture_network_request(
    info: &NetworkRequestInfo,
    config: &NetworkCaptureConfig,
) -> ReplaySpan {
    let op = if info.is_fetch {
        SpanOp::ResourceFetch
    } else {
        SpanOp::ResourceXhr
    };

    if !url_matches(&info.url, &config.url_targets) {
        return make_network_span(
            op,
            &info.url,
            info.method.as_deref(),
            info.status_code,
            info.start_ms,
            info.end_ms,
            Some(build_skipped_request_or_response()),
            Some(build_skipped_request_or_response()),
        );
    }

    let request_size = info.request_body.as_ref().and_then(get_body_size).or_else(|| {
        parse_content_length(header_value(&info.request_headers, "content-length"))
    });
    let request_body = if config.capture_bodies {
        info.request_body
            .as_ref()
            .and_then(|body| get_network_body(get_body_string(body).as_deref()))
    } else {
        None
    };
    let request = build_request_or_response(
        get_allowed_headers(&info.request_headers, &config.allowed_headers),
        request_size,
        request_body,
    );

    let response_size = info
        .response_body_text
        .as_ref()
        .map(|text| text.len() as u64)
        .or_else(|| parse_content_length(header_value(&info.response_headers, "content-length")));
    let response_body = if config.capture_bodies {
        get_network_body(info.response_body_text.as_deref())
    } else {
        None
    };
    let response = build_request_or_response(
        get_allowed_headers(&info.response_headers, &config.allowed_headers),
        response_size,
        response_body,
    );

    make_network_span(
        op,
        &info.url,
        info.method.as_deref(),
        info.status_code,
        info.start_ms,
        info.end_ms,
        request,
        response,
    )
}

fn header_value<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
