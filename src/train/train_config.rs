use std::sync::mpsc;

use serde::{Serialize, Deserialize};

use crate::device::device_id::DeviceId;
use crate::error::{MonitorError, Result};
use crate::train::epoch_stats::EpochStats;

/// How the evaluation phase accounts for step time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EvalAccounting {
    /// Eval figures come only from eval batches.
    #[default]
    Isolated,
    /// Eval elapsed time starts from the training window still open when the
    /// train phase ended, while the divisor counts eval samples only. Memory
    /// is not carried. Matches how earlier profiles were recorded.
    CarryOver,
}

/// What a batch adds to the sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SampleCounting {
    /// Every batch counts as `batch_size` samples, a short last batch
    /// included. Matches how earlier profiles were recorded.
    #[default]
    Nominal,
    /// Every batch counts the samples it actually holds.
    Exact,
}

/// Configuration for a `Monitor` run.
///
/// # Fields
/// - `epochs`: number of train/eval passes; `0` runs nothing
/// - `batch_size`: nominal samples per batch (must match the loaders)
/// - `monitoring_interval`: batches per progress line
/// - `device`: device the model and every batch are placed on
/// - `eval_accounting`: see `EvalAccounting`
/// - `sample_counting`: see `SampleCounting`
/// - `progress_tx`: optional channel sender; one `EpochStats` is sent per
///   completed epoch. A dropped receiver is logged and ignored.
pub struct MonitorConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub monitoring_interval: usize,
    pub device: DeviceId,
    pub eval_accounting: EvalAccounting,
    pub sample_counting: SampleCounting,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl MonitorConfig {
    /// Creates a config with isolated eval accounting, nominal sample counting
    /// and no progress channel.
    pub fn new(epochs: usize, batch_size: usize, monitoring_interval: usize, device: DeviceId) -> Self {
        MonitorConfig {
            epochs,
            batch_size,
            monitoring_interval,
            device,
            eval_accounting: EvalAccounting::default(),
            sample_counting: SampleCounting::default(),
            progress_tx: None,
        }
    }

    pub fn with_eval_accounting(mut self, eval_accounting: EvalAccounting) -> Self {
        self.eval_accounting = eval_accounting;
        self
    }

    pub fn with_sample_counting(mut self, sample_counting: SampleCounting) -> Self {
        self.sample_counting = sample_counting;
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(MonitorError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if self.monitoring_interval == 0 {
            return Err(MonitorError::InvalidConfig("monitoring_interval must be at least 1".into()));
        }
        Ok(())
    }
}
