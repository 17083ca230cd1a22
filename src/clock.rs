//! Clock correction from the instrumentation clock onto wall-clock time
//!
//! The profiler stamps events with a monotonic clock whose zero is
//! meaningless outside the process. To anchor a session on wall-clock time we
//! read the instrumentation clock, then the wall clock, then the
//! instrumentation clock again (`t1`, `t2`, `t3`), and assume the wall-clock
//! read happened halfway between the two instrumentation reads:
//!
//! ```text
//! corrected = t_instr + (t2 - (t1 + t3) / 2)
//! ```
//!
//! The offset is applied once to the origin marker. Span start times stay
//! relative to that origin, so they never need re-correcting.

use crate::error::{Result, TraceError};
use crate::event::RawEvent;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of the two clock domains being reconciled
pub trait ClockSource {
    /// Current instrumentation-clock reading in microseconds
    fn instrumentation_us(&self) -> i64;

    /// Current wall-clock reading in microseconds since the UNIX epoch
    fn wall_clock_us(&self) -> i64;
}

/// Process clocks: a monotonic `Instant` anchor and the system wall clock
///
/// Readings are only comparable with events stamped from the same instance.
/// An executor that owns one stamps its events with
/// [`instrumentation_us`](ClockSource::instrumentation_us) and hands the same
/// instance out for sampling.
#[derive(Debug, Clone, Copy)]
pub struct SystemClocks {
    anchor: Instant,
}

impl SystemClocks {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClocks {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for SystemClocks {
    fn instrumentation_us(&self) -> i64 {
        i64::try_from(self.anchor.elapsed().as_micros()).unwrap_or(i64::MAX)
    }

    fn wall_clock_us(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
            .unwrap_or_default()
    }
}

/// Three-read sample bracketing one wall-clock read
///
/// The default sample has no offset and leaves timestamps on the
/// instrumentation clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockSample {
    /// Instrumentation clock before the wall-clock read
    pub t1: i64,
    /// Wall-clock reading
    pub t2: i64,
    /// Instrumentation clock after the wall-clock read
    pub t3: i64,
}

impl ClockSample {
    pub fn new(t1: i64, t2: i64, t3: i64) -> Self {
        Self { t1, t2, t3 }
    }

    /// Take a fresh sample from `clocks`
    pub fn take<C: ClockSource + ?Sized>(clocks: &C) -> Self {
        let t1 = clocks.instrumentation_us();
        let t2 = clocks.wall_clock_us();
        let t3 = clocks.instrumentation_us();
        Self { t1, t2, t3 }
    }

    /// Offset from the instrumentation clock to the wall clock
    pub fn offset_us(&self) -> i64 {
        let midpoint = (i128::from(self.t1) + i128::from(self.t3)) / 2;
        clamp_i64(i128::from(self.t2) - midpoint)
    }

    /// Map an instrumentation timestamp onto the wall clock
    pub fn correct(&self, t_instr: i64) -> i64 {
        t_instr.saturating_add(self.offset_us())
    }
}

fn clamp_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Session time zero
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    /// The marker event as captured
    pub marker: RawEvent,
    /// Marker timestamp mapped onto the wall clock (µs since the UNIX epoch)
    pub corrected_us: i64,
}

/// Find the origin marker and correct its timestamp
///
/// The first event named `marker_name` wins, whatever its kind.
pub fn correct_origin(
    events: &[RawEvent],
    marker_name: &str,
    sample: ClockSample,
) -> Result<Origin> {
    let marker = events
        .iter()
        .find(|e| e.name == marker_name)
        .ok_or_else(|| TraceError::MissingOriginMarker {
            marker: marker_name.to_string(),
        })?;

    let corrected_us = sample.correct(marker.timestamp_us as i64);
    tracing::debug!(
        marker_ts_us = marker.timestamp_us,
        offset_us = sample.offset_us(),
        corrected_us,
        "Corrected session origin"
    );

    Ok(Origin {
        marker: marker.clone(),
        corrected_us,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MatchKey;
    use std::cell::Cell;

    /// Clock that replays a fixed script of readings
    struct ScriptedClocks {
        instr: Cell<[i64; 2]>,
        calls: Cell<usize>,
        wall: i64,
    }

    impl ClockSource for ScriptedClocks {
        fn instrumentation_us(&self) -> i64 {
            let idx = self.calls.get();
            self.calls.set(idx + 1);
            self.instr.get()[idx]
        }

        fn wall_clock_us(&self) -> i64 {
            self.wall
        }
    }

    #[test]
    fn test_correction_example() {
        let sample = ClockSample::new(500, 600, 520);
        assert_eq!(sample.offset_us(), 90);
        assert_eq!(sample.correct(1000), 1090);
    }

    #[test]
    fn test_take_reads_in_order() {
        let clocks = ScriptedClocks {
            instr: Cell::new([500, 520]),
            calls: Cell::new(0),
            wall: 600,
        };
        let sample = ClockSample::take(&clocks);
        assert_eq!(sample, ClockSample::new(500, 600, 520));
    }

    #[test]
    fn test_symmetric_sample_has_no_drift() {
        // wall clock exactly halfway between the two instrumentation reads
        let sample = ClockSample::new(100, 110, 120);
        assert_eq!(sample.offset_us(), 0);
        assert_eq!(sample.correct(42), 42);
    }

    #[test]
    fn test_extreme_readings_saturate() {
        let sample = ClockSample::new(i64::MIN, i64::MAX, i64::MIN);
        assert_eq!(sample.offset_us(), i64::MAX);
        assert_eq!(sample.correct(10), i64::MAX);
    }

    #[test]
    fn test_default_sample_is_identity() {
        assert_eq!(ClockSample::default().offset_us(), 0);
        assert_eq!(ClockSample::default().correct(1000), 1000);
    }

    #[test]
    fn test_system_clocks_are_sane() {
        let clocks = SystemClocks::new();
        let sample = ClockSample::take(&clocks);
        assert!(sample.t3 >= sample.t1);
        assert!(sample.t2 > 0);
    }

    #[test]
    fn test_correct_origin_uses_first_marker() {
        let events = vec![
            RawEvent::enter("op", MatchKey::new(1, 0), 5.0, vec![]),
            RawEvent::mark("__start_profile", 1000.0),
            RawEvent::mark("__start_profile", 2000.0),
        ];
        let origin =
            correct_origin(&events, "__start_profile", ClockSample::new(500, 600, 520)).unwrap();
        assert_eq!(origin.corrected_us, 1090);
        assert_eq!(origin.marker.timestamp_us, 1000.0);
    }

    #[test]
    fn test_missing_origin_is_fatal() {
        let events = vec![RawEvent::memory(1.0, 10)];
        let err =
            correct_origin(&events, "__start_profile", ClockSample::new(0, 0, 0)).unwrap_err();
        assert!(matches!(err, TraceError::MissingOriginMarker { .. }));
    }
}
