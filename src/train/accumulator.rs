use std::fmt;

use serde::{Serialize, Deserialize};

use crate::error::{MonitorError, Result};
use crate::report::metric::PhaseMetrics;

/// Which half of an epoch produced a set of statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Train,
    Eval,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Train => f.write_str("train"),
            Phase::Eval => f.write_str("eval"),
        }
    }
}

/// What one batch contributed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchObservation {
    /// Loss value reported by the criterion for the batch.
    pub loss: f64,
    /// Samples whose arg-max prediction matched the label.
    pub true_positives: usize,
    pub samples: usize,
    pub elapsed_ms: f64,
    pub used_mem_mb: f64,
}

/// Running sums over a span of batches.
///
/// The monitor keeps two per training epoch: a window, flushed every
/// monitoring interval, and the running totals the window is folded into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    pub loss_sum: f64,
    pub true_positives: usize,
    pub samples: usize,
    pub elapsed_ms: f64,
    pub used_mem_mb: f64,
    pub batches: usize,
}

impl Accumulator {
    pub fn new() -> Accumulator {
        Accumulator::default()
    }

    pub fn record(&mut self, obs: BatchObservation) {
        self.loss_sum += obs.loss;
        self.true_positives += obs.true_positives;
        self.samples += obs.samples;
        self.elapsed_ms += obs.elapsed_ms;
        self.used_mem_mb += obs.used_mem_mb;
        self.batches += 1;
    }

    pub fn reset(&mut self) {
        *self = Accumulator::default();
    }

    pub fn is_empty(&self) -> bool {
        self.batches == 0
    }

    /// Adds every sum into `running`, then resets `self`.
    pub fn fold_into(&mut self, running: &mut Accumulator) {
        running.loss_sum += self.loss_sum;
        running.true_positives += self.true_positives;
        running.samples += self.samples;
        running.elapsed_ms += self.elapsed_ms;
        running.used_mem_mb += self.used_mem_mb;
        running.batches += self.batches;
        self.reset();
    }

    /// Averages the sums.
    ///
    /// Loss, accuracy and sample time are per sample; memory is per batch.
    /// `util_percent` is a fresh probe reading supplied by the caller.
    ///
    /// # Errors
    /// `EmptyPhase` when no samples were recorded.
    pub fn summarize(&self, phase: Phase, util_percent: u32) -> Result<PhaseMetrics> {
        if self.samples == 0 || self.batches == 0 {
            return Err(MonitorError::EmptyPhase { phase });
        }
        let samples = self.samples as f64;
        Ok(PhaseMetrics {
            avg_loss: self.loss_sum / samples,
            accuracy: 100.0 * self.true_positives as f64 / samples,
            avg_sample_time_ms: self.elapsed_ms / samples,
            avg_used_mem_mb: self.used_mem_mb / self.batches as f64,
            util_percent,
            samples: self.samples,
            batches: self.batches,
        })
    }
}
