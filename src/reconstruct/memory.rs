// Memory accounting for the open root span
//
// `allocated` and `peak` are accumulated independently: allocated sums only
// positive deltas, peak follows the signed running total.

/// Running memory totals for one root span
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccumulator {
    current: i64,
    allocated: i64,
    peak: i64,
}

impl MemoryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accounting for a new root span
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply one signed allocation/free sample
    pub fn record(&mut self, delta_bytes: i64) {
        self.current = self.current.saturating_add(delta_bytes);
        if delta_bytes > 0 {
            self.allocated = self.allocated.saturating_add(delta_bytes);
        }
        self.peak = self.peak.max(self.current);
    }

    /// Sum of positive deltas since the last reset
    pub fn allocated(&self) -> i64 {
        self.allocated
    }

    /// Highest running total since the last reset (never below zero)
    pub fn peak(&self) -> i64 {
        self.peak
    }

    /// Signed running total since the last reset
    pub fn current(&self) -> i64 {
        self.current
    }
}
