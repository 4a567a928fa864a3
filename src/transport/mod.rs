//! Transport seam for delivering replay envelopes.
//!
//! The pipeline classifies every outcome into exactly one of: success,
//! retryable server failure, rate limit, or definitive rejection. The
//! retry policy in [`crate::delivery`] keys off this classification;
//! transports never retry on their own.

use async_trait::async_trait;
use std::time::Duration;

use crate::delivery::Envelope;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a status (DNS, connect, timeout).
    /// Retry-eligible.
    #[error("network error: {0}")]
    Network(String),

    #[error("failed to encode envelope: {0}")]
    Encode(String),
}

/// Classified delivery outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportResponse {
    /// 2xx.
    Success { status: u16 },
    /// 5xx; eligible for bounded retry.
    ServerError { status: u16 },
    /// 429; terminal, never consumes a retry slot.
    RateLimited { retry_after: Option<Duration> },
    /// Any other definitive non-2xx; terminal.
    Rejected { status: u16 },
}

impl TransportResponse {
    pub fn from_status(status: u16, retry_after: Option<Duration>) -> Self {
        match status {
            200..=299 => Self::Success { status },
            429 => Self::RateLimited { retry_after },
            500..=599 => Self::ServerError { status },
            _ => Self::Rejected { status },
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerError { .. })
    }
}

/// Envelope delivery. Implementations classify responses; they do not
/// interpret payloads.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<TransportResponse, TransportError>;

    /// The name of this transport implementation.
    fn name(&self) -> &str;
}

/// HTTP transport posting envelopes to a single ingest endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, envelope: &Envelope) -> Result<TransportResponse, TransportError> {
        let body = envelope
            .to_bytes()
            .map_err(|e| TransportError::Encode(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/x-replay-envelope")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        Ok(TransportResponse::from_status(
            response.status().as_u16(),
            retry_after,
        ))
    }

    fn name(&self) -> &str {
        "http"
    }
}
