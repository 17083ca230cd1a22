//! Optrace - operator-level profiling trace reconstruction
//!
//! This library turns the raw instrumentation stream captured during one
//! profiled inference call (span pushes and pops, memory samples, an origin
//! mark) into a flat, clock-corrected timeline of root operations, and
//! renders that timeline as trace-viewer JSON.

pub mod chrome_trace;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod reconstruct;
pub mod session;
pub mod span_record;
pub mod timeline;
