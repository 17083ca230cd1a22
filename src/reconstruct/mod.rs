// Root-span reconstruction from a captured event stream
//
// One forward pass over the events, in capture order:
// - push: register under its match key; if depth is 0, open a new root
//   record (start offset, rendered shapes, zeroed memory); depth += 1
// - pop: remove the matching push (missing is fatal); depth -= 1; if depth
//   is back to 0, finalize the root with duration and thread id
// - memory_alloc: roll into the open root, ignored outside any root
// - mark: ignored
//
// The wrapper span ("forward") is matched so the table does not leak, but it
// never touches depth and never produces a record.

mod matcher;
mod memory;

pub use matcher::{DepthTracker, SpanMatcher};
pub use memory::MemoryAccumulator;

use crate::config::ReconstructConfig;
use crate::error::{Result, TraceError};
use crate::event::{EventKind, RawEvent};
use crate::span_record::{render_shapes, SpanRecord};

/// Root span waiting for its closing exit
#[derive(Debug)]
struct OpenRoot {
    name: String,
    start_us: f64,
    shapes_description: String,
}

/// Timestamps far apart can overflow `f64` when subtracted
fn finite(name: &str, field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TraceError::NonFiniteTiming {
            name: name.to_string(),
            field,
            value,
        })
    }
}

/// Rebuild the flat root-span timeline of one session
///
/// `origin` is the session's origin marker; start offsets are measured from
/// it on the instrumentation clock.
pub fn reconstruct(
    events: &[RawEvent],
    origin: &RawEvent,
    config: &ReconstructConfig,
) -> Result<Vec<SpanRecord>> {
    let mut matcher = SpanMatcher::new();
    let mut depth = DepthTracker::new();
    let mut memory = MemoryAccumulator::new();
    let mut open_root: Option<OpenRoot> = None;
    let mut records = Vec::new();

    for event in events {
        tracing::trace!(kind = ?event.kind, name = %event.name, ts_us = event.timestamp_us, "event");

        match event.kind {
            EventKind::SpanEnter => {
                matcher.open(event);
                if event.name == config.wrapper_name {
                    continue;
                }
                if depth.enter() {
                    memory.reset();
                    open_root = Some(OpenRoot {
                        name: event.name.clone(),
                        start_us: finite(&event.name, "start", origin.elapsed_us(event))?,
                        shapes_description: render_shapes(&event.shapes),
                    });
                }
            }
            EventKind::SpanExit => {
                let enter = matcher.close(event)?;
                if enter.name == config.wrapper_name {
                    continue;
                }
                if !depth.exit() {
                    continue;
                }
                if let Some(root) = open_root.take() {
                    let duration_us = finite(&root.name, "duration", enter.elapsed_us(event))?;
                    let record = SpanRecord {
                        name: root.name,
                        start_us: root.start_us,
                        duration_us,
                        thread_id: event.thread_id,
                        shapes_description: root.shapes_description,
                        allocated_bytes: memory.allocated(),
                        peak_bytes: memory.peak(),
                        sequence_index: records.len(),
                    };
                    tracing::debug!(
                        name = %record.name,
                        seq = record.sequence_index,
                        dur_us = record.duration_us,
                        "Finalized root span"
                    );
                    records.push(record);
                }
            }
            EventKind::MemorySample => {
                if depth.in_root() {
                    memory.record(event.memory_delta_bytes);
                }
            }
            EventKind::Mark => {}
        }
    }

    if let Some(root) = open_root {
        tracing::warn!(
            name = %root.name,
            depth = depth.depth(),
            "Dropping root span left open at end of stream"
        );
    }
    if matcher.pending() > 0 {
        tracing::debug!(pending = matcher.pending(), "Unclosed enter records at end of stream");
    }

    Ok(records)
}
