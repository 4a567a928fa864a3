//! Replay configuration: sampling, flush cadence, session timeouts and
//! network capture policy. All fields deserialize with sensible defaults
//! so a host SDK can embed a partial `[replay]` table.

use serde::{Deserialize, Serialize};

// ── Timing defaults ───────────────────────────────────────────────

/// Idle limit after which recording is paused (not terminated).
pub const SESSION_IDLE_PAUSE: u64 = 300_000; // 5 minutes in ms

/// Idle limit after which the session expires.
pub const SESSION_IDLE_EXPIRE: u64 = 900_000; // 15 minutes in ms

/// Hard cap on the length of a single session.
pub const MAX_SESSION_LIFE: u64 = 3_600_000; // 60 minutes in ms

/// Default debounce window for batched flushes.
pub const DEFAULT_FLUSH_MIN_DELAY: u64 = 5_000;

/// Hard cap: a flush request older than this fires unconditionally.
/// Kept slightly above the min delay so the max-wait path is reachable.
pub const DEFAULT_FLUSH_MAX_DELAY: u64 = 5_500;

/// Checkout interval while recording in buffer mode.
pub const BUFFER_CHECKOUT_TIME: u64 = 60_000;

/// Minimum buffered duration before the first segment is worth sending.
pub const MIN_REPLAY_DURATION: u64 = 4_999;

/// Top-level replay options (`[replay]` section of the host config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Fraction of sessions recorded continuously (`0.0..=1.0`).
    #[serde(default)]
    pub session_sample_rate: f64,
    /// Fraction of sessions kept in a rolling buffer and sent only when
    /// an error occurs (`0.0..=1.0`).
    #[serde(default)]
    pub error_sample_rate: f64,
    /// Persist the session record so reloads continue the same replay.
    #[serde(default = "default_true")]
    pub sticky_session: bool,
    /// Compress recording payloads on a worker before delivery.
    #[serde(default = "default_true")]
    pub use_compression: bool,
    /// Debounce delay between an event and the flush it schedules, ms.
    #[serde(default = "default_flush_min_delay")]
    pub flush_min_delay: u64,
    /// Upper bound on flush postponement under sustained activity, ms.
    #[serde(default = "default_flush_max_delay")]
    pub flush_max_delay: u64,
    /// Segments shorter than this are not worth sending, ms.
    #[serde(default = "default_min_replay_duration")]
    pub min_replay_duration: u64,
    /// Session idle/expiry policy (`[replay.timeouts]`).
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Network breadcrumb enrichment policy (`[replay.network]`).
    #[serde(default)]
    pub network: NetworkCaptureConfig,
    /// Internal escape hatches (`[replay.experiments]`).
    #[serde(default)]
    pub experiments: Experiments,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            session_sample_rate: 0.0,
            error_sample_rate: 0.0,
            sticky_session: true,
            use_compression: true,
            flush_min_delay: DEFAULT_FLUSH_MIN_DELAY,
            flush_max_delay: DEFAULT_FLUSH_MAX_DELAY,
            min_replay_duration: MIN_REPLAY_DURATION,
            timeouts: Timeouts::default(),
            network: NetworkCaptureConfig::default(),
            experiments: Experiments::default(),
        }
    }
}

/// Session lifecycle thresholds. The pause window is strictly shorter
/// than the expire window: pausing never rotates the session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    /// Idle duration after which recording pauses, ms.
    #[serde(default = "default_session_idle_pause")]
    pub session_idle_pause: u64,
    /// Idle duration after which the session expires, ms.
    #[serde(default = "default_session_idle_expire")]
    pub session_idle_expire: u64,
    /// Maximum total session length, ms.
    #[serde(default = "default_max_session_life")]
    pub max_session_life: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            session_idle_pause: SESSION_IDLE_PAUSE,
            session_idle_expire: SESSION_IDLE_EXPIRE,
            max_session_life: MAX_SESSION_LIFE,
        }
    }
}

/// Which parts of network traffic are captured into breadcrumbs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkCaptureConfig {
    /// Capture request/response bodies (size-bounded) for matching URLs.
    #[serde(default = "default_true")]
    pub capture_bodies: bool,
    /// Case-insensitive header allow-list applied to both directions.
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: Vec<String>,
    /// Substring patterns; enrichment only applies to matching URLs.
    /// Non-matching URLs keep minimal breadcrumbs tagged `URL_SKIPPED`.
    #[serde(default)]
    pub url_targets: Vec<String>,
}

impl Default for NetworkCaptureConfig {
    fn default() -> Self {
        Self {
            capture_bodies: true,
            allowed_headers: default_allowed_headers(),
            url_targets: Vec::new(),
        }
    }
}

/// Experimental flags. Off by default; never used for control flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experiments {
    /// Forward replay-internal faults to the host capture hook.
    #[serde(default)]
    pub capture_exceptions: bool,
    /// Mutations in one batch above this count force a full snapshot
    /// instead of an incremental diff. `0` disables the limit.
    #[serde(default)]
    pub mutation_limit: usize,
    /// Mutations in one batch above this count emit a `replay.mutations`
    /// breadcrumb.
    #[serde(default = "default_mutation_breadcrumb_limit")]
    pub mutation_breadcrumb_limit: usize,
}

fn default_true() -> bool {
    true
}

fn default_flush_min_delay() -> u64 {
    DEFAULT_FLUSH_MIN_DELAY
}

fn default_flush_max_delay() -> u64 {
    DEFAULT_FLUSH_MAX_DELAY
}

fn default_min_replay_duration() -> u64 {
    MIN_REPLAY_DURATION
}

fn default_session_idle_pause() -> u64 {
    SESSION_IDLE_PAUSE
}

fn default_session_idle_expire() -> u64 {
    SESSION_IDLE_EXPIRE
}

fn default_max_session_life() -> u64 {
    MAX_SESSION_LIFE
}

fn default_allowed_headers() -> Vec<String> {
    vec!["content-type".to_string(), "content-length".to_string()]
}

fn default_mutation_breadcrumb_limit() -> usize {
    1000
}
