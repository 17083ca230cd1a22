//! Error taxonomy for trace reconstruction
//!
//! Every reconstruction error is fatal for its session: the input is an
//! already-captured snapshot, so there is nothing to retry and no partial
//! trace is ever produced.

use thiserror::Error;

/// Errors that can occur while loading, reconstructing or serializing a trace
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Could not find {marker} mark in event stream")]
    MissingOriginMarker { marker: String },

    #[error("Unmatched pop event: {name} (handle {handle}, node {node_id})")]
    UnmatchedExit {
        name: String,
        handle: u64,
        node_id: i64,
    },

    #[error("Span {name} has a non-finite {field} ({value})")]
    NonFiniteTiming {
        name: String,
        field: &'static str,
        value: f64,
    },

    #[error("Input batch is empty")]
    EmptyInput,

    #[error("Inference executor failed: {0}")]
    Executor(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for trace reconstruction operations
pub type Result<T> = std::result::Result<T, TraceError>;
