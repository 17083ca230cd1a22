//! Raw instrumentation events captured during one profiled inference call
//!
//! Captured streams are stored as a JSON array. Each element carries a `kind`
//! (`push`, `pop`, `memory_alloc` or `mark`), an operation `name`, the
//! `handle`/`node_id` pair used to match pushes with pops, and an
//! instrumentation-clock timestamp in microseconds (`ts_us`).
//!
//! Fields that do not affect timing or matching (`shapes`, `memory_delta`,
//! `thread_id`) are read leniently: a missing or malformed value becomes the
//! empty/zero default instead of failing the whole load.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Kind of an instrumentation record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Start of an instrumented operation
    #[serde(rename = "push")]
    SpanEnter,
    /// End of an instrumented operation
    #[serde(rename = "pop")]
    SpanExit,
    /// Signed allocation/free sample
    #[serde(rename = "memory_alloc")]
    MemorySample,
    /// Instant marker (the session origin is one)
    #[serde(rename = "mark")]
    Mark,
}

/// Composite identity pairing a span's enter and exit records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchKey {
    /// Execution-handle identifier
    pub handle: u64,
    /// Graph node identifier
    pub node_id: i64,
}

impl MatchKey {
    pub fn new(handle: u64, node_id: i64) -> Self {
        Self { handle, node_id }
    }
}

/// A single low-level instrumentation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub kind: EventKind,

    /// Operation label (e.g., "aten::conv2d", "forward")
    pub name: String,

    #[serde(default)]
    pub handle: u64,

    #[serde(default)]
    pub node_id: i64,

    /// Instrumentation-clock timestamp in microseconds
    #[serde(rename = "ts_us")]
    pub timestamp_us: f64,

    /// Originating worker thread (meaningful on pop events)
    #[serde(default, deserialize_with = "lenient")]
    pub thread_id: i64,

    /// One shape per input tensor (meaningful on push events)
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub shapes: Vec<Vec<i64>>,

    /// Signed byte delta (meaningful on memory_alloc events)
    #[serde(
        rename = "memory_delta",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "is_zero"
    )]
    pub memory_delta_bytes: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Deserialize a field, falling back to its default when the value is malformed
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl RawEvent {
    fn base(kind: EventKind, name: impl Into<String>, key: MatchKey, timestamp_us: f64) -> Self {
        Self {
            kind,
            name: name.into(),
            handle: key.handle,
            node_id: key.node_id,
            timestamp_us,
            thread_id: 0,
            shapes: Vec::new(),
            memory_delta_bytes: 0,
        }
    }

    /// Build a span-enter record
    pub fn enter(
        name: impl Into<String>,
        key: MatchKey,
        timestamp_us: f64,
        shapes: Vec<Vec<i64>>,
    ) -> Self {
        Self {
            shapes,
            ..Self::base(EventKind::SpanEnter, name, key, timestamp_us)
        }
    }

    /// Build a span-exit record
    pub fn exit(name: impl Into<String>, key: MatchKey, timestamp_us: f64, thread_id: i64) -> Self {
        Self {
            thread_id,
            ..Self::base(EventKind::SpanExit, name, key, timestamp_us)
        }
    }

    /// Build a memory sample
    pub fn memory(timestamp_us: f64, delta_bytes: i64) -> Self {
        Self {
            memory_delta_bytes: delta_bytes,
            ..Self::base(
                EventKind::MemorySample,
                "[memory]",
                MatchKey::new(0, 0),
                timestamp_us,
            )
        }
    }

    /// Build an instant marker
    pub fn mark(name: impl Into<String>, timestamp_us: f64) -> Self {
        Self::base(EventKind::Mark, name, MatchKey::new(0, 0), timestamp_us)
    }

    pub fn match_key(&self) -> MatchKey {
        MatchKey::new(self.handle, self.node_id)
    }

    /// Microseconds elapsed from `self` to `later` on the instrumentation clock
    pub fn elapsed_us(&self, later: &RawEvent) -> f64 {
        later.timestamp_us - self.timestamp_us
    }
}

/// Parse a captured event stream from JSON text
pub fn parse_events(json: &str) -> Result<Vec<RawEvent>> {
    Ok(serde_json::from_str(json)?)
}

/// Load a captured event stream from a JSON file
pub fn load_events(path: &Path) -> Result<Vec<RawEvent>> {
    let content = std::fs::read_to_string(path)?;
    parse_events(&content)
}
