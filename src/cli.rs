//! CLI argument parsing for Optrace

use crate::clock::ClockSample;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "optrace")]
#[command(version)]
#[command(about = "Rebuild operator timelines from captured profiling events", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    /// TOML file overriding marker names and the pid label
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconstruct a trace-viewer JSON document from a captured event stream
    Reconstruct {
        /// Captured event stream (JSON array)
        #[arg(value_name = "EVENTS")]
        events: PathBuf,

        /// Write the trace here instead of stdout
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<PathBuf>,

        /// Clock sample recorded at capture time, as T1,T2,T3 in µs.
        /// Without it the origin is not anchored on the wall clock and
        /// stays in instrumentation-clock µs
        #[arg(long = "clock-sample", value_name = "T1,T2,T3", value_parser = parse_clock_sample)]
        clock_sample: Option<ClockSample>,

        /// Write the corrected origin (µs) here instead of stderr
        #[arg(long = "origin-file", value_name = "PATH")]
        origin_file: Option<PathBuf>,
    },

    /// Publish the collapsed timeline of a trace document
    Timeline {
        /// Trace-viewer JSON produced by `reconstruct`
        #[arg(value_name = "TRACE")]
        trace: PathBuf,

        /// Corrected session origin in µs since the UNIX epoch
        #[arg(long = "origin-us", value_name = "US", allow_hyphen_values = true)]
        origin_us: i64,
    },
}

/// Parse `T1,T2,T3` into a clock sample
pub fn parse_clock_sample(s: &str) -> Result<ClockSample, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid clock sample '{}': {}", s, e))?;

    match parts.as_slice() {
        [t1, t2, t3] => Ok(ClockSample::new(*t1, *t2, *t3)),
        _ => Err(format!(
            "invalid clock sample '{}': expected three comma-separated values",
            s
        )),
    }
}
