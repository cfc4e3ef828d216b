#![allow(dead_code)]

use ferrite_monitor::data::Batch;
use ferrite_monitor::device::{DeviceClock, DeviceId, Placement, ResourceProbe};
use ferrite_monitor::error::{MonitorError, Result};
use ferrite_monitor::loss::{Criterion, LossOutput};
use ferrite_monitor::network::{Mode, Model, Param};
use ferrite_monitor::optim::Optimizer;
use ferrite_monitor::{DataSource, Matrix};

/// Reports the same span for every batch.
pub struct FixedClock {
    pub per_batch_ms: f64,
    running: bool,
}

impl FixedClock {
    pub fn new(per_batch_ms: f64) -> Self {
        FixedClock { per_batch_ms, running: false }
    }
}

impl DeviceClock for FixedClock {
    fn start(&mut self) -> Result<()> {
        assert!(!self.running, "clock started twice");
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        assert!(self.running, "clock stopped while idle");
        self.running = false;
        Ok(())
    }

    fn elapsed_ms(&mut self) -> Result<f64> {
        Ok(self.per_batch_ms)
    }
}

/// Returns fixed readings and counts how often it was asked.
#[derive(Default)]
pub struct ScriptedProbe {
    pub memory_mb: f64,
    pub util: u32,
    pub memory_queries: usize,
    pub util_queries: usize,
}

impl ScriptedProbe {
    pub fn new(memory_mb: f64, util: u32) -> Self {
        ScriptedProbe { memory_mb, util, ..Default::default() }
    }
}

impl ResourceProbe for ScriptedProbe {
    fn used_memory_mb(&mut self) -> Result<f64> {
        self.memory_queries += 1;
        Ok(self.memory_mb)
    }

    fn utilization_percent(&mut self) -> Result<u32> {
        self.util_queries += 1;
        Ok(self.util)
    }
}

/// Scores the true label highest for every sample.
pub struct OracleModel {
    pub classes: usize,
    pub mode: Mode,
    pub grad_enabled: bool,
    pub placement: Placement,
    /// (mode, grad_enabled) at every forward call.
    pub forward_log: Vec<(Mode, bool)>,
    pub backward_calls: usize,
}

impl OracleModel {
    pub fn new(classes: usize) -> Self {
        OracleModel {
            classes,
            mode: Mode::Train,
            grad_enabled: true,
            placement: Placement::Host,
            forward_log: Vec::new(),
            backward_calls: 0,
        }
    }
}

impl Model for OracleModel {
    fn forward(&mut self, batch: &Batch) -> Result<Matrix> {
        if batch.placement() != self.placement {
            return Err(MonitorError::DeviceMismatch {
                expected: self.placement,
                found: batch.placement(),
            });
        }
        self.forward_log.push((self.mode, self.grad_enabled));
        let mut out = Matrix::zeros(batch.len(), self.classes);
        for (r, &y) in batch.labels.iter().enumerate() {
            out.row_mut(r)[y] = 1.0;
        }
        Ok(out)
    }

    fn backward(&mut self, _grad_output: &Matrix) -> Result<()> {
        if !self.grad_enabled {
            return Err(MonitorError::Model("backward with gradients disabled".into()));
        }
        self.backward_calls += 1;
        Ok(())
    }

    fn parameters(&mut self) -> Vec<Param<'_>> {
        Vec::new()
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn grad_enabled(&self) -> bool {
        self.grad_enabled
    }

    fn set_grad_enabled(&mut self, enabled: bool) {
        self.grad_enabled = enabled;
    }

    fn placement(&self) -> Placement {
        self.placement
    }

    fn to_device(&mut self, device: DeviceId) {
        self.placement = Placement::Device(device);
    }
}

/// Charges the same loss for every batch.
pub struct ConstantLoss(pub f64);

impl Criterion for ConstantLoss {
    fn loss(&self, outputs: &Matrix, _labels: &[usize]) -> Result<LossOutput> {
        Ok(LossOutput {
            value: self.0,
            grad: Matrix::zeros(outputs.rows, outputs.cols),
        })
    }
}

#[derive(Default)]
pub struct CountingOptimizer {
    pub steps: usize,
}

impl Optimizer for CountingOptimizer {
    fn step<M: Model + ?Sized>(&mut self, _model: &mut M) -> Result<()> {
        self.steps += 1;
        Ok(())
    }
}

/// `count` batches of `size` samples with labels cycling through `classes`.
pub fn batches(count: usize, size: usize, classes: usize) -> Vec<Batch> {
    (0..count)
        .map(|b| {
            let labels: Vec<usize> = (0..size).map(|i| (b + i) % classes).collect();
            Batch::new(Matrix::zeros(size, 4), labels).unwrap()
        })
        .collect()
}

/// Yields `good` batches, then a data error.
pub struct FailingSource {
    pub good: usize,
}

impl DataSource for FailingSource {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        let ok = batches(self.good, 2, 2).into_iter().map(Ok);
        let err = std::iter::once(Err(MonitorError::Data("corrupt batch".into())));
        Box::new(ok.chain(err))
    }
}

pub fn lines(sink: ferrite_monitor::TextSink<Vec<u8>>) -> Vec<String> {
    String::from_utf8(sink.into_inner())
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}
