//! Reconstructed root-span records
//!
//! A `SpanRecord` is the output unit of reconstruction: one entry per
//! outermost instrumented call, with every nested operation's memory traffic
//! rolled up into it.

use serde::Serialize;

/// One finalized root span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanRecord {
    /// Operation label of the root enter event
    pub name: String,
    /// Start offset from the session origin (µs)
    pub start_us: f64,
    /// Elapsed time between the matched enter and exit (µs)
    pub duration_us: f64,
    /// Thread reported by the closing exit event
    pub thread_id: i64,
    /// Input shapes rendered as `[[d0, d1], [d0]]`
    pub shapes_description: String,
    /// Sum of positive memory deltas while the span was open
    pub allocated_bytes: i64,
    /// Maximum of the running signed memory total while the span was open
    pub peak_bytes: i64,
    /// Zero-based emission (close) order
    pub sequence_index: usize,
}

/// Render per-input tensor shapes the way trace consumers expect
///
/// ```
/// use optrace::span_record::render_shapes;
///
/// assert_eq!(render_shapes(&[vec![1, 3, 224, 224], vec![64]]), "[[1, 3, 224, 224], [64]]");
/// assert_eq!(render_shapes(&[]), "[]");
/// ```
pub fn render_shapes(shapes: &[Vec<i64>]) -> String {
    let inner = shapes
        .iter()
        .map(|dims| {
            let dims = dims
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{}]", dims)
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", inner)
}
