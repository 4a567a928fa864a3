//! Conversion of raw performance/network entries into replay
//! performance spans.
//!
//! Spans are the unit the replay UI consumes; their timestamps are
//! fractional **seconds**, while raw entries arrive in milliseconds.
//! The conversion happens here, per call, and nowhere else.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::NetworkRequestOrResponse;

/// Fixed vocabulary of span operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanOp {
    #[serde(rename = "resource.fetch")]
    ResourceFetch,
    #[serde(rename = "resource.xhr")]
    ResourceXhr,
    #[serde(rename = "resource.link")]
    ResourceLink,
    #[serde(rename = "resource.script")]
    ResourceScript,
    #[serde(rename = "resource.img")]
    ResourceImg,
    #[serde(rename = "navigation.navigate")]
    Navigate,
    #[serde(rename = "paint")]
    Paint,
    #[serde(rename = "largest-contentful-paint")]
    LargestContentfulPaint,
    #[serde(rename = "memory")]
    Memory,
}

/// One replay performance span, attached to a segment as a custom
/// recording event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySpan {
    pub op: SpanOp,
    /// URL or resource identifier.
    pub description: String,
    /// Fractional seconds since epoch.
    pub start_timestamp: f64,
    /// Fractional seconds since epoch.
    pub end_timestamp: f64,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

/// A raw performance entry as observed by the host instrumentation.
/// Timestamps are epoch milliseconds.
#[derive(Debug, Clone)]
pub enum PerformanceEntry {
    Navigation {
        url: String,
        start_ms: f64,
        end_ms: f64,
        duration_ms: f64,
    },
    Paint {
        name: String,
        start_ms: f64,
    },
    Resource {
        url: String,
        initiator: ResourceInitiator,
        start_ms: f64,
        end_ms: f64,
        size: Option<u64>,
    },
    LargestContentfulPaint {
        start_ms: f64,
        size: u64,
    },
    Memory {
        at_ms: f64,
        used_heap: u64,
        total_heap: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceInitiator {
    Fetch,
    Xhr,
    Link,
    Script,
    Img,
}

impl ResourceInitiator {
    fn op(self) -> SpanOp {
        match self {
            Self::Fetch => SpanOp::ResourceFetch,
            Self::Xhr => SpanOp::ResourceXhr,
            Self::Link => SpanOp::ResourceLink,
            Self::Script => SpanOp::ResourceScript,
            Self::Img => SpanOp::ResourceImg,
        }
    }
}

/// Convert buffered raw entries to spans, preserving arrival order.
pub fn create_performance_spans(entries: &[PerformanceEntry]) -> Vec<ReplaySpan> {
    entries.iter().map(create_performance_span).collect()
}

fn create_performance_span(entry: &PerformanceEntry) -> ReplaySpan {
    match entry {
        PerformanceEntry::Navigation {
            url,
            start_ms,
            end_ms,
            duration_ms,
        } => ReplaySpan {
            op: SpanOp::Navigate,
            description: url.clone(),
            start_timestamp: sec(*start_ms),
            end_timestamp: sec(*end_ms),
            data: json!({ "duration": duration_ms }),
        },
        PerformanceEntry::Paint { name, start_ms } => ReplaySpan {
            op: SpanOp::Paint,
            description: name.clone(),
            start_timestamp: sec(*start_ms),
            end_timestamp: sec(*start_ms),
            data: serde_json::Value::Null,
        },
        PerformanceEntry::Resource {
            url,
            initiator,
            start_ms,
            end_ms,
            size,
        } => ReplaySpan {
            op: initiator.op(),
            description: url.clone(),
            start_timestamp: sec(*start_ms),
            end_timestamp: sec(*end_ms),
            data: match size {
                Some(size) => json!({ "size": size }),
                None => serde_json::Value::Null,
            },
        },
        PerformanceEntry::LargestContentfulPaint { start_ms, size } => ReplaySpan {
            op: SpanOp::LargestContentfulPaint,
            description: "largest-contentful-paint".to_string(),
            start_timestamp: sec(*start_ms),
            end_timestamp: sec(*start_ms),
            data: json!({ "size": size }),
        },
        PerformanceEntry::Memory {
            at_ms,
            used_heap,
            total_heap,
        } => ReplaySpan {
            op: SpanOp::Memory,
            description: "memory".to_string(),
            start_timestamp: sec(*at_ms),
            end_timestamp: sec(*at_ms),
            data: json!({
                "memory": {
                    "usedJSHeapSize": used_heap,
                    "totalJSHeapSize": total_heap,
                }
            }),
        },
    }
}

/// Build a memory span for "now"; appended right before a flush so each
/// segment carries a heap sample.
pub fn memory_span(now_ms: u64, used_heap: u64, total_heap: u64) -> ReplaySpan {
    create_performance_span(&PerformanceEntry::Memory {
        at_ms: now_ms as f64,
        used_heap,
        total_heap,
    })
}

/// Convert an enriched network capture into a span.
pub fn make_network_span(
    op: SpanOp,
    url: &str,
    method: Option<&str>,
    status_code: Option<u16>,
    start_ms: f64,
    end_ms: f64,
    request: Option<NetworkRequestOrResponse>,
    response: Option<NetworkRequestOrResponse>,
) -> ReplaySpan {
    let mut data = json!({});
    if let Some(method) = method {
        data["method"] = json!(method);
    }
    if let Some(status) = status_code {
        data["statusCode"] = json!(status);
    }
    if let Some(request) = request {
        data["request"] = serde_json::to_value(request).unwrap_or(serde_json::Value::Null);
    }
    if let Some(response) = response {
        data["response"] = serde_json::to_value(response).unwrap_or(serde_json::Value::Null);
    }
    ReplaySpan {
        op,
        description: url.to_string(),
        start_timestamp: sec(start_ms),
        end_timestamp: sec(end_ms),
        data,
    }
}

fn sec(ms: f64) -> f64 {
    if ms.is_finite() && ms > 0.0 {
        ms / 1000.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_normalized_to_seconds() {
        let spans = create_performance_spans(&[PerformanceEntry::Resource {
            url: "https://example.com/app.js".into(),
            initiator: ResourceInitiator::Script,
            start_ms: 10_000.0,
            end_ms: 12_500.0,
            size: Some(1024),
        }]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start_timestamp, 10.0);
        assert_eq!(spans[0].end_timestamp, 12.5);
        assert_eq!(spans[0].op, SpanOp::ResourceScript);
    }

    #[test]
    fn sub_millisecond_precision_survives_conversion() {
        let spans = create_performance_spans(&[PerformanceEntry::Paint {
            name: "first-contentful-paint".into(),
            start_ms: 10_000.5,
        }]);
        assert_eq!(spans[0].start_timestamp, 10.0005);

        let span = make_network_span(
            SpanOp::ResourceXhr,
            "https://example.com/api",
            None,
            None,
            1_234.25,
            1_500.75,
            None,
            None,
        );
        assert_eq!(span.start_timestamp, 1.23425);
        assert_eq!(span.end_timestamp, 1.50075);
    }

    #[test]
    fn span_ops_serialize_to_wire_names() {
        assert_eq!(
            serde_json::to_value(SpanOp::ResourceFetch).unwrap(),
            "resource.fetch"
        );
        assert_eq!(serde_json::to_value(SpanOp::ResourceXhr).unwrap(), "resource.xhr");
        assert_eq!(
            serde_json::to_value(SpanOp::LargestContentfulPaint).unwrap(),
            "largest-contentful-paint"
        );
    }

    #[test]
    fn memory_span_shape() {
        let span = memory_span(2_000, 100, 200);
        assert_eq!(span.op, SpanOp::Memory);
        assert_eq!(span.start_timestamp, 2.0);
        assert_eq!(span.data["memory"]["usedJSHeapSize"], 100);
    }

    #[test]
    fn network_span_carries_request_and_response() {
        let span = make_network_span(
            SpanOp::ResourceFetch,
            "https://example.com/api",
            Some("POST"),
            Some(200),
            1_000.0,
            1_250.0,
            Some(super::super::build_skipped_request_or_response()),
            None,
        );
        assert_eq!(span.data["method"], "POST");
        assert_eq!(span.data["statusCode"], 200);
        assert_eq!(span.data["request"]["_meta"]["warnings"][0], "URL_SKIPPED");
        assert!(span.data.get("response").is_none());
    }
}
