use std::fmt;

use serde::{Serialize, Deserialize};

/// The five reported figures for a window or a phase, plus the counts they
/// were averaged over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    pub avg_loss: f64,
    /// Percentage of samples whose arg-max matched the label, in [0, 100].
    pub accuracy: f64,
    pub avg_sample_time_ms: f64,
    /// Mean of the per-batch memory readings.
    pub avg_used_mem_mb: f64,
    pub util_percent: u32,
    pub samples: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineKind {
    /// Emitted when a monitoring window closes at zero-based `batch`.
    Train { batch: usize },
    TrainSummary,
    Eval,
}

/// One monitoring event.
///
/// `Display` renders the text log format:
/// ```text
/// [TRAIN] epoch: 0, batch: 19, avg loss: 0.0712345678, accuracy: 12.500000%, avg sample time: 0.412000ms, avg used mem: 1843.000000mb, avg util rate: 97%
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricLine {
    pub epoch: usize,
    #[serde(flatten)]
    pub kind: LineKind,
    #[serde(flatten)]
    pub metrics: PhaseMetrics,
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LineKind::Train { batch } => write!(f, "[TRAIN] epoch: {}, batch: {}, ", self.epoch, batch)?,
            LineKind::TrainSummary => write!(f, "[TRAIN SUMMARY] epoch: {}, ", self.epoch)?,
            LineKind::Eval => write!(f, "[EVAL] epoch: {}, ", self.epoch)?,
        }
        let m = &self.metrics;
        write!(
            f,
            "avg loss: {:.10}, accuracy: {:.6}%, avg sample time: {:.6}ms, avg used mem: {:.6}mb, avg util rate: {}%",
            m.avg_loss, m.accuracy, m.avg_sample_time_ms, m.avg_used_mem_mb, m.util_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> PhaseMetrics {
        PhaseMetrics {
            avg_loss: 0.25,
            accuracy: 87.5,
            avg_sample_time_ms: 0.125,
            avg_used_mem_mb: 512.0,
            util_percent: 93,
            samples: 64,
            batches: 2,
        }
    }

    #[test]
    fn renders_progress_line() {
        let line = MetricLine { epoch: 3, kind: LineKind::Train { batch: 19 }, metrics: metrics() };
        assert_eq!(
            line.to_string(),
            "[TRAIN] epoch: 3, batch: 19, avg loss: 0.2500000000, accuracy: 87.500000%, \
             avg sample time: 0.125000ms, avg used mem: 512.000000mb, avg util rate: 93%"
        );
    }

    #[test]
    fn summary_and_eval_share_the_field_layout() {
        let summary = MetricLine { epoch: 0, kind: LineKind::TrainSummary, metrics: metrics() }.to_string();
        let eval = MetricLine { epoch: 0, kind: LineKind::Eval, metrics: metrics() }.to_string();
        assert!(summary.starts_with("[TRAIN SUMMARY] epoch: 0, avg loss:"));
        assert!(eval.starts_with("[EVAL] epoch: 0, avg loss:"));
        assert_eq!(summary.split_once("avg loss").unwrap().1, eval.split_once("avg loss").unwrap().1);
    }

    #[test]
    fn json_form_is_flat() {
        let line = MetricLine { epoch: 1, kind: LineKind::Train { batch: 4 }, metrics: metrics() };
        let value = serde_json::to_value(line).unwrap();
        assert_eq!(value["kind"], "train");
        assert_eq!(value["batch"], 4);
        assert_eq!(value["util_percent"], 93);
    }
}
