//! Timeline publishing for serialized traces
//!
//! A trace document only carries offsets from the session origin. Publishing
//! re-anchors every entry on the corrected wall-clock origin, orders the
//! entries outermost-first, and forwards each one that is not already covered
//! by the previously published entry to a [`SpanSink`].
//!
//! Ordering is start ascending, then end descending (enclosing entries
//! first), then array position descending.

use crate::error::Result;
use serde::Deserialize;
use std::cmp::Ordering;

/// One entry of a trace-viewer document, anchored on the wall clock
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraceEvent {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "ph", default)]
    pub phase: String,
    /// Offset from the session origin (µs)
    #[serde(rename = "ts", default)]
    pub timestamp_us: f64,
    #[serde(rename = "dur", default)]
    pub duration_us: f64,
    #[serde(rename = "pid", default)]
    pub process_id: String,
    #[serde(rename = "tid", default)]
    pub thread_id: i64,
    #[serde(default)]
    pub shape: String,
    #[serde(default)]
    pub allocated_memory: i64,
    #[serde(default)]
    pub peak_memory: i64,
    /// Absolute start, nanoseconds since the UNIX epoch
    #[serde(skip)]
    pub start_ns: i64,
    /// Absolute end, nanoseconds since the UNIX epoch
    #[serde(skip)]
    pub end_ns: i64,
    /// Position in the source document
    #[serde(skip)]
    pub seq: usize,
}

impl TraceEvent {
    fn publish_order(&self, other: &Self) -> Ordering {
        self.start_ns
            .cmp(&other.start_ns)
            .then_with(|| other.end_ns.cmp(&self.end_ns))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Receiver of published timeline entries
pub trait SpanSink {
    fn publish(&mut self, event: &TraceEvent, layer_sequence_index: usize) -> Result<()>;
}

/// Fan out to both sinks, first one first
impl<A: SpanSink, B: SpanSink> SpanSink for (A, B) {
    fn publish(&mut self, event: &TraceEvent, layer_sequence_index: usize) -> Result<()> {
        self.0.publish(event, layer_sequence_index)?;
        self.1.publish(event, layer_sequence_index)
    }
}

/// Owned copy of a published entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedSpan {
    pub name: String,
    pub thread_id: i64,
    pub start_ns: i64,
    pub end_ns: i64,
    pub layer_sequence_index: usize,
}

impl PublishedSpan {
    /// Span length in ns; saturates when the anchored bounds were clamped
    pub fn duration_ns(&self) -> i64 {
        self.end_ns.saturating_sub(self.start_ns)
    }
}

impl SpanSink for Vec<PublishedSpan> {
    fn publish(&mut self, event: &TraceEvent, layer_sequence_index: usize) -> Result<()> {
        self.push(PublishedSpan {
            name: event.name.clone(),
            thread_id: event.thread_id,
            start_ns: event.start_ns,
            end_ns: event.end_ns,
            layer_sequence_index,
        });
        Ok(())
    }
}

/// Sink that emits one `tracing` event per published entry
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl SpanSink for TracingSink {
    fn publish(&mut self, event: &TraceEvent, layer_sequence_index: usize) -> Result<()> {
        tracing::info!(
            target: "optrace::timeline",
            name = %event.name,
            phase = %event.phase,
            process_id = %event.process_id,
            thread_id = event.thread_id,
            layer_sequence_index,
            start_ns = event.start_ns,
            end_ns = event.end_ns,
            "span"
        );
        Ok(())
    }
}

/// A parsed trace anchored on a wall-clock origin
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Corrected session origin (µs since the UNIX epoch)
    pub origin_us: i64,
    pub events: Vec<TraceEvent>,
}

impl Timeline {
    /// Parse a trace document and anchor it at `origin_us`
    pub fn parse(json: &str, origin_us: i64) -> Result<Self> {
        let mut events: Vec<TraceEvent> = serde_json::from_str(json)?;
        let origin_ns = origin_us.saturating_mul(1000);
        for (seq, event) in events.iter_mut().enumerate() {
            let ts_ns = event.timestamp_us * 1000.0;
            let dur_ns = event.duration_us * 1000.0;
            event.start_ns = origin_ns.saturating_add(ts_ns as i64);
            event.end_ns = origin_ns.saturating_add((ts_ns + dur_ns) as i64);
            event.seq = seq;
        }
        Ok(Self { origin_us, events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sort outermost-first and publish every entry not covered by the
    /// previously published one; returns how many were published
    pub fn publish<S: SpanSink + ?Sized>(
        &mut self,
        sink: &mut S,
        wrapper_name: &str,
    ) -> Result<usize> {
        self.events.sort_by(TraceEvent::publish_order);

        let mut covered: Option<(i64, i64)> = None;
        let mut idx = 0;
        for event in &self.events {
            if event.name == wrapper_name {
                continue;
            }
            if let Some((st, ed)) = covered {
                if event.start_ns >= st && event.end_ns <= ed {
                    continue;
                }
            }
            covered = Some((event.start_ns, event.end_ns));
            sink.publish(event, idx)?;
            idx += 1;
        }

        tracing::debug!(published = idx, total = self.events.len(), "Published timeline");
        Ok(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, ts: f64, dur: f64) -> String {
        format!(
            r#"{{"name": "{}", "ph": "X", "ts": {:.3}, "dur": {:.3}, "tid": 1, "pid": "CPU Functions", "args": {{}}}}"#,
            name, ts, dur
        )
    }

    fn doc(entries: &[String]) -> String {
        format!("[{}]", entries.join(","))
    }

    #[test]
    fn test_parse_anchors_on_origin() {
        let json = doc(&[entry("a", 1.5, 2.0)]);
        let timeline = Timeline::parse(&json, 1_000).unwrap();
        let e = &timeline.events[0];
        assert_eq!(e.start_ns, 1_001_500);
        assert_eq!(e.end_ns, 1_003_500);
        assert_eq!(e.seq, 0);
        assert_eq!(e.thread_id, 1);
    }

    #[test]
    fn test_parse_keeps_negative_thread_id() {
        let timeline = Timeline::parse(r#"[{"name": "x", "tid": -3}]"#, 0).unwrap();
        assert_eq!(timeline.events[0].thread_id, -3);
    }

    #[test]
    fn test_parse_tolerates_missing_fields() {
        let timeline = Timeline::parse(r#"[{"name": "x"}]"#, 0).unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.events[0].duration_us, 0.0);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(Timeline::parse(r#"{"name": "x"}"#, 0).is_err());
    }

    #[test]
    fn test_publish_skips_contained_and_wrapper() {
        let json = doc(&[
            entry("forward", 0.0, 100.0),
            entry("outer", 1.0, 10.0),
            entry("inner", 2.0, 3.0),
            entry("next", 20.0, 5.0),
        ]);
        let mut timeline = Timeline::parse(&json, 0).unwrap();
        let mut published: Vec<PublishedSpan> = Vec::new();
        let count = timeline.publish(&mut published, "forward").unwrap();

        assert_eq!(count, 2);
        let names: Vec<_> = published.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "next"]);
        assert_eq!(published[1].layer_sequence_index, 1);
    }

    #[test]
    fn test_publish_orders_by_start_then_longest() {
        let json = doc(&[
            entry("late", 50.0, 1.0),
            entry("short", 0.0, 1.0),
            entry("long", 0.0, 9.0),
        ]);
        let mut timeline = Timeline::parse(&json, 0).unwrap();
        let mut published: Vec<PublishedSpan> = Vec::new();
        timeline.publish(&mut published, "forward").unwrap();

        let names: Vec<_> = published.iter().map(|p| p.name.as_str()).collect();
        // "short" is inside "long", which sorts first
        assert_eq!(names, vec!["long", "late"]);
    }

    #[test]
    fn test_identical_entries_publish_once() {
        let json = doc(&[entry("a", 1.0, 1.0), entry("a", 1.0, 1.0)]);
        let mut timeline = Timeline::parse(&json, 0).unwrap();
        let mut published: Vec<PublishedSpan> = Vec::new();
        assert_eq!(timeline.publish(&mut published, "forward").unwrap(), 1);
    }

    #[test]
    fn test_tracing_sink_accepts_events() {
        let json = doc(&[entry("a", 1.0, 1.0)]);
        let mut timeline = Timeline::parse(&json, 0).unwrap();
        assert_eq!(timeline.publish(&mut TracingSink, "forward").unwrap(), 1);
    }

    #[test]
    fn test_paired_sinks_both_receive() {
        let json = doc(&[entry("a", 1.0, 1.0), entry("b", 5.0, 1.0)]);
        let mut timeline = Timeline::parse(&json, 0).unwrap();
        let mut sinks = (Vec::<PublishedSpan>::new(), Vec::<PublishedSpan>::new());
        assert_eq!(timeline.publish(&mut sinks, "forward").unwrap(), 2);
        assert_eq!(sinks.0, sinks.1);
        assert_eq!(sinks.1[1].name, "b");
    }

    #[test]
    fn test_duration_saturates_on_clamped_bounds() {
        let json = doc(&[entry("a", -1.0e300, 2.0e300)]);
        let mut timeline = Timeline::parse(&json, 0).unwrap();
        assert_eq!(timeline.events[0].start_ns, i64::MIN);
        assert_eq!(timeline.events[0].end_ns, i64::MAX);

        let mut published: Vec<PublishedSpan> = Vec::new();
        timeline.publish(&mut published, "forward").unwrap();
        assert_eq!(published[0].duration_ns(), i64::MAX);
    }

    #[test]
    fn test_duration_ns() {
        let span = PublishedSpan {
            name: "a".to_string(),
            thread_id: 1,
            start_ns: 1_000,
            end_ns: 10_500,
            layer_sequence_index: 0,
        };
        assert_eq!(span.duration_ns(), 9_500);
    }
}
