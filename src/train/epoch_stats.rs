use serde::{Serialize, Deserialize};

use crate::report::metric::PhaseMetrics;

/// Per-epoch summary sent on the progress channel and collected in the
/// `RunReport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch index.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Figures of the `[TRAIN SUMMARY]` line.
    pub train: PhaseMetrics,
    /// Figures of the `[EVAL]` line.
    pub eval: PhaseMetrics,
}

/// Everything a finished run produced besides the sink output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub epochs: Vec<EpochStats>,
}
