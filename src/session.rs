//! Profiling sessions around one inference call
//!
//! A session carries the labels from [`ReconstructConfig`] and anchors the
//! origin with a sample taken from the executor's own instrumentation clock.
//! Nothing survives between sessions; the corrected origin is handed back in
//! the [`ProfileReport`] instead of being kept as process state.

use crate::chrome_trace::TraceDocument;
use crate::clock::{correct_origin, ClockSample, ClockSource};
use crate::config::ReconstructConfig;
use crate::error::{Result, TraceError};
use crate::event::RawEvent;
use crate::reconstruct::reconstruct;
use crate::span_record::SpanRecord;
use crate::timeline::Timeline;

/// Boundary to the engine that actually runs the model
///
/// With profiling enabled, the executor must capture an event stream holding
/// exactly one origin marker and a wrapper span around the whole call, and
/// hand it over through [`take_profile_events`](Self::take_profile_events).
pub trait InferenceExecutor {
    type Input;
    type Output;

    /// Run one forward pass over `inputs`
    fn run(&mut self, inputs: &[Self::Input], profiling: bool) -> Result<Self::Output>;

    /// Drain the events captured by the last profiled run
    fn take_profile_events(&mut self) -> Vec<RawEvent>;

    /// Clock pair whose instrumentation side stamped the captured events
    fn instrumentation_clock(&self) -> &dyn ClockSource;
}

/// Everything a finished session exposes
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReport {
    /// Corrected origin, µs since the UNIX epoch
    pub origin_us: i64,
    pub spans: Vec<SpanRecord>,
    /// Trace-viewer JSON for `spans`
    pub trace_json: String,
}

impl ProfileReport {
    /// Re-anchor the serialized trace on the corrected origin
    pub fn timeline(&self) -> Result<Timeline> {
        Timeline::parse(&self.trace_json, self.origin_us)
    }
}

/// Reconstruct and serialize one captured stream with a known clock sample
pub fn build_report(
    events: &[RawEvent],
    sample: ClockSample,
    config: &ReconstructConfig,
) -> Result<ProfileReport> {
    let origin = correct_origin(events, &config.origin_marker, sample)?;
    let spans = reconstruct(events, &origin.marker, config)?;
    let trace_json = TraceDocument::new(&spans, &config.pid_label).to_string();

    tracing::info!(
        events = events.len(),
        spans = spans.len(),
        origin_us = origin.corrected_us,
        "Reconstructed profiling session"
    );

    Ok(ProfileReport {
        origin_us: origin.corrected_us,
        spans,
        trace_json,
    })
}

/// One profiling session
#[derive(Debug, Clone, Default)]
pub struct ProfilingSession {
    config: ReconstructConfig,
}

impl ProfilingSession {
    pub fn new(config: ReconstructConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconstructConfig {
        &self.config
    }

    /// Reconstruct an already-captured stream
    pub fn reconstruct(&self, events: &[RawEvent], sample: ClockSample) -> Result<ProfileReport> {
        build_report(events, sample, &self.config)
    }

    /// Run `executor` with profiling on and reconstruct what it captured
    ///
    /// The clock sample comes from the executor right after the run, so the
    /// origin is anchored on the clock that stamped the events.
    pub fn run<E: InferenceExecutor>(
        &self,
        executor: &mut E,
        inputs: &[E::Input],
    ) -> Result<(E::Output, ProfileReport)> {
        if inputs.is_empty() {
            return Err(TraceError::EmptyInput);
        }

        let output = executor.run(inputs, true)?;
        let sample = ClockSample::take(executor.instrumentation_clock());
        let events = executor.take_profile_events();
        let report = self.reconstruct(&events, sample)?;
        Ok((output, report))
    }
}
