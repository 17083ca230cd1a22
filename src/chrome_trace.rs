//! Trace-viewer JSON output
//!
//! Renders root spans as a Chrome Trace Event array of complete (`"ph": "X"`)
//! events. The layout is fixed: downstream viewers and the timeline publisher
//! read these documents by key, and `ts`/`dur` always carry three decimals.
//!
//! ```text
//! [
//! {
//!   "name": "aten::conv2d",
//!   "ph": "X",
//!   "ts": 12.000,
//!   "dur": 340.500,
//!   "tid": 1,
//!   "pid": "CPU Functions",
//!   "shape": "[[1, 3, 224, 224], [64, 3, 7, 7]]",
//!   "allocated_memory": 3211264,
//!   "peak_memory": 3211264,
//!   "layer_sequence_index": 0,
//!   "args": {}
//! }
//! ]
//! ```

use crate::span_record::SpanRecord;
use std::fmt;
use std::io;

/// A serializable view over finalized span records
#[derive(Debug, Clone, Copy)]
pub struct TraceDocument<'a> {
    records: &'a [SpanRecord],
    pid_label: &'a str,
}

impl<'a> TraceDocument<'a> {
    pub fn new(records: &'a [SpanRecord], pid_label: &'a str) -> Self {
        Self { records, pid_label }
    }

    /// Stream the document into `writer`
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "{}", self)
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, key: &str, value: &str) -> fmt::Result {
    let quoted = serde_json::to_string(value).map_err(|_| fmt::Error)?;
    writeln!(f, "  \"{}\": {},", key, quoted)
}

fn write_float(f: &mut fmt::Formatter<'_>, key: &str, value: f64) -> fmt::Result {
    writeln!(f, "  \"{}\": {:.3},", key, value)
}

fn write_int(f: &mut fmt::Formatter<'_>, key: &str, value: impl fmt::Display) -> fmt::Result {
    writeln!(f, "  \"{}\": {},", key, value)
}

impl fmt::Display for TraceDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for (i, record) in self.records.iter().enumerate() {
            if i != 0 {
                writeln!(f, ",")?;
            }
            writeln!(f, "{{")?;
            write_string(f, "name", &record.name)?;
            write_string(f, "ph", "X")?;
            write_float(f, "ts", record.start_us)?;
            write_float(f, "dur", record.duration_us)?;
            write_int(f, "tid", record.thread_id)?;
            write_string(f, "pid", self.pid_label)?;
            write_string(f, "shape", &record.shapes_description)?;
            write_int(f, "allocated_memory", record.allocated_bytes)?;
            write_int(f, "peak_memory", record.peak_bytes)?;
            write_int(f, "layer_sequence_index", record.sequence_index)?;
            writeln!(f, "  \"args\": {{}}")?;
            writeln!(f, "}}")?;
        }
        writeln!(f, "]")
    }
}

/// Render records with the default `"CPU Functions"` track label
pub fn to_trace_json(records: &[SpanRecord]) -> String {
    TraceDocument::new(records, "CPU Functions").to_string()
}
