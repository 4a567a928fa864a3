//! Network breadcrumb enrichment: size-bounded, header-filtered
//! request/response capture.
//!
//! All capture here is best-effort and observable: oversized bodies are
//! dropped with an explicit `_meta` error marker, non-matching URLs are
//! tagged `URL_SKIPPED`, and unsupported body shapes simply yield no
//! size. Nothing in this module fails a flush.

pub mod performance;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The max (uncompressed) size in bytes of a captured network body.
pub const NETWORK_BODY_MAX_SIZE: u64 = 150_000;

/// Marker attached when a body exceeded [`NETWORK_BODY_MAX_SIZE`].
pub const MAX_BODY_SIZE_EXCEEDED: &str = "MAX_BODY_SIZE_EXCEEDED";

/// Marker attached when a URL did not match any capture target.
pub const URL_SKIPPED: &str = "URL_SKIPPED";

/// A captured body: JSON if it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworkBody {
    Json(serde_json::Value),
    Text(String),
}

/// A request body as observed at the instrumentation seam. Explicit
/// variants replace host-side duck typing; `Opaque` covers shapes we
/// cannot measure (streams, views into shared buffers).
#[derive(Debug, Clone)]
pub enum RequestBody {
    Text(String),
    UrlEncoded(Vec<(String, String)>),
    FormData(Vec<(String, String)>),
    Bytes(Vec<u8>),
    Opaque,
}

/// Capture metadata: explicit, observable degradation markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMeta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl NetworkMeta {
    fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// One side (request or response) of a network breadcrumb.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRequestOrResponse {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<NetworkBody>,
    #[serde(
        rename = "_meta",
        default,
        skip_serializing_if = "NetworkMeta::is_empty"
    )]
    pub meta: NetworkMeta,
}

/// Compute the byte length of a request body. Unsupported shapes yield
/// `None`, not an error.
pub fn get_body_size(body: &RequestBody) -> Option<u64> {
    match body {
        RequestBody::Text(text) => Some(text.len() as u64),
        RequestBody::UrlEncoded(pairs) | RequestBody::FormData(pairs) => {
            Some(serialize_form_pairs(pairs).len() as u64)
        }
        RequestBody::Bytes(bytes) => Some(bytes.len() as u64),
        RequestBody::Opaque => None,
    }
}

/// Text representation of a body, where one exists.
pub fn get_body_string(body: &RequestBody) -> Option<String> {
    match body {
        RequestBody::Text(text) => Some(text.clone()),
        RequestBody::UrlEncoded(pairs) | RequestBody::FormData(pairs) => {
            Some(serialize_form_pairs(pairs))
        }
        RequestBody::Bytes(_) | RequestBody::Opaque => None,
    }
}

/// Convert a `Content-Length` header value to a size.
pub fn parse_content_length(header: Option<&str>) -> Option<u64> {
    header.and_then(|value| value.trim().parse::<u64>().ok())
}

/// Parse captured body text: JSON if it parses, else raw text. Empty
/// text yields nothing.
pub fn get_network_body(body_text: Option<&str>) -> Option<NetworkBody> {
    let text = body_text?;
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => Some(NetworkBody::Json(value)),
        Err(_) => Some(NetworkBody::Text(text.to_string())),
    }
}

/// Build the request or response part of a network breadcrumb.
///
/// Returns `None` when there is nothing to report. Bodies above
/// [`NETWORK_BODY_MAX_SIZE`] are omitted and marked, never silently
/// truncated.
pub fn build_request_or_response(
    headers: BTreeMap<String, String>,
    size: Option<u64>,
    body: Option<NetworkBody>,
) -> Option<NetworkRequestOrResponse> {
    let size = size.filter(|s| *s > 0);
    if size.is_none() && headers.is_empty() {
        return None;
    }

    let mut record = NetworkRequestOrResponse {
        headers,
        size,
        body: None,
        meta: NetworkMeta::default(),
    };

    let Some(size) = size else {
        return Some(record);
    };
    let Some(body) = body else {
        return Some(record);
    };

    if size < NETWORK_BODY_MAX_SIZE {
        record.body = Some(body);
    } else {
        record.meta.errors.push(MAX_BODY_SIZE_EXCEEDED.to_string());
    }
    Some(record)
}

/// Minimal record for URLs outside the capture target set.
pub fn build_skipped_request_or_response() -> NetworkRequestOrResponse {
    NetworkRequestOrResponse {
        meta: NetworkMeta {
            warnings: vec![URL_SKIPPED.to_string()],
            ..NetworkMeta::default()
        },
        ..NetworkRequestOrResponse::default()
    }
}

/// Case-insensitive allow-list filter. Empty header values are dropped
/// even when the key matches.
pub fn get_allowed_headers(
    headers: &BTreeMap<String, String>,
    allow_list: &[String],
) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(key, value)| {
            let normalized = key.to_ascii_lowercase();
            let allowed = allow_list.iter().any(|a| a.eq_ignore_ascii_case(&normalized));
            if allowed && !value.is_empty() {
                Some((normalized, value.clone()))
            } else {
                None
            }
        })
        .collect()
}

/// Whether enrichment applies to this URL: substring match against the
/// configured target patterns. An empty target set matches nothing.
pub fn url_matches(url: &str, targets: &[String]) -> bool {
    targets.iter().any(|target| url.contains(target.as_str()))
}

fn serialize_form_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}
