//! The persisted session record.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sampling decision for a session. Persisted as `false`, `"session"`
/// or `"buffer"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampled {
    /// Not recorded at all.
    No,
    /// Continuous recording, segments sent as the session progresses.
    Session,
    /// Rolling-buffer recording, sent only on explicit flush or error.
    Buffer,
}

impl Sampled {
    pub fn is_sampled(self) -> bool {
        self != Self::No
    }
}

impl Serialize for Sampled {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::No => serializer.serialize_bool(false),
            Self::Session => serializer.serialize_str("session"),
            Self::Buffer => serializer.serialize_str("buffer"),
        }
    }
}

impl<'de> Deserialize<'de> for Sampled {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Mode(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(Self::No),
            Raw::Flag(true) => Err(D::Error::custom("sampled cannot be `true`")),
            Raw::Mode(mode) => match mode.as_str() {
                "session" => Ok(Self::Session),
                "buffer" => Ok(Self::Buffer),
                other => Err(D::Error::custom(format!("unknown sampled mode `{other}`"))),
            },
        }
    }
}

/// A recording session. At most one session is current per container;
/// `segment_id` is append-only and increments exactly once per
/// initiated flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    /// Milliseconds since epoch.
    pub started_at: u64,
    /// Milliseconds since epoch; refreshed on user activity.
    pub last_activity: u64,
    pub segment_id: u64,
    pub sampled: Sampled,
    /// When false, an otherwise-expired session is never silently
    /// renewed (set after promoting buffer → session mode).
    #[serde(default = "default_should_refresh")]
    pub should_refresh: bool,
    /// Continuity link to the session this one superseded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_session_id: Option<String>,
}

impl Session {
    pub fn new(sampled: Sampled, now_ms: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            started_at: now_ms,
            last_activity: now_ms,
            segment_id: 0,
            sampled,
            should_refresh: true,
            previous_session_id: None,
        }
    }
}

fn default_should_refresh() -> bool {
    true
}
