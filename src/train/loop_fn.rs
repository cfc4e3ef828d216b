use log::{debug, info, warn};

use crate::data::batch::Batch;
use crate::data::loader::DataSource;
use crate::device::clock::DeviceClock;
use crate::device::probe::ResourceProbe;
use crate::error::{MonitorError, Result};
use crate::loss::criterion::Criterion;
use crate::math::matrix::Matrix;
use crate::network::model::{Mode, Model};
use crate::optim::optimizer::Optimizer;
use crate::report::metric::{LineKind, MetricLine, PhaseMetrics};
use crate::report::sink::MetricSink;
use crate::train::accumulator::{Accumulator, BatchObservation, Phase};
use crate::train::epoch_stats::{EpochStats, RunReport};
use crate::train::eval_scope::EvalScope;
use crate::train::train_config::{EvalAccounting, MonitorConfig, SampleCounting};

/// Drives the train/eval epoch loop and reports what it measures.
///
/// Per epoch the monitor emits one `[TRAIN]` line per closed monitoring
/// window, one `[TRAIN SUMMARY]` line and one `[EVAL]` line, in that order.
pub struct Monitor<C, P, S> {
    config: MonitorConfig,
    clock: C,
    probe: P,
    sink: S,
}

impl<C, P, S> Monitor<C, P, S>
where
    C: DeviceClock,
    P: ResourceProbe,
    S: MetricSink,
{
    /// # Errors
    /// `InvalidConfig` if `batch_size` or `monitoring_interval` is zero.
    pub fn new(config: MonitorConfig, clock: C, probe: P, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Monitor { config, clock, probe, sink })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn into_parts(self) -> (C, P, S) {
        (self.clock, self.probe, self.sink)
    }

    /// Trains `model` for `config.epochs` epochs, evaluating after each one.
    ///
    /// The model is placed on `config.device` first. Any collaborator error
    /// aborts the run and is returned unchanged; lines already emitted stay in
    /// the sink. A phase that sees no samples fails with `EmptyPhase`.
    pub fn run<M, O, L, Tr, Te>(
        &mut self,
        model: &mut M,
        train: &mut Tr,
        test: &mut Te,
        optimizer: &mut O,
        criterion: &L,
    ) -> Result<RunReport>
    where
        M: Model + ?Sized,
        O: Optimizer,
        L: Criterion + ?Sized,
        Tr: DataSource + ?Sized,
        Te: DataSource + ?Sized,
    {
        model.to_device(self.config.device);
        let total_epochs = self.config.epochs;
        let mut report = RunReport::default();

        for epoch in 0..total_epochs {
            info!("epoch {}/{}: training", epoch + 1, total_epochs);
            let (train_metrics, open_window) = self.train_epoch(epoch, model, train, optimizer, criterion)?;

            let eval_seed = match self.config.eval_accounting {
                EvalAccounting::Isolated => Accumulator::new(),
                EvalAccounting::CarryOver => Accumulator {
                    elapsed_ms: open_window.elapsed_ms,
                    ..Accumulator::default()
                },
            };
            let eval_metrics = self.eval_epoch(epoch, model, test, criterion, eval_seed)?;

            info!(
                "epoch {}/{}: train accuracy {:.2}%, eval accuracy {:.2}%",
                epoch + 1,
                total_epochs,
                train_metrics.accuracy,
                eval_metrics.accuracy
            );

            let stats = EpochStats {
                epoch,
                total_epochs,
                train: train_metrics,
                eval: eval_metrics,
            };
            self.publish(&stats);
            report.epochs.push(stats);
        }

        Ok(report)
    }

    /// One pass over the training set. Returns the summary figures and the
    /// window that was still open when the data ran out.
    fn train_epoch<M, O, L, Tr>(
        &mut self,
        epoch: usize,
        model: &mut M,
        train: &mut Tr,
        optimizer: &mut O,
        criterion: &L,
    ) -> Result<(PhaseMetrics, Accumulator)>
    where
        M: Model + ?Sized,
        O: Optimizer,
        L: Criterion + ?Sized,
        Tr: DataSource + ?Sized,
    {
        let device = self.config.device;
        let interval = self.config.monitoring_interval;
        model.set_mode(Mode::Train);

        let mut running = Accumulator::new();
        let mut window = Accumulator::new();

        for (batch_index, batch) in train.batches().enumerate() {
            let batch = batch?;
            let samples = self.counted_samples(&batch)?;

            self.clock.start()?;
            optimizer.zero_grad(model);
            let batch = batch.to_device(device);
            let outputs = model.forward(&batch)?;
            let loss = criterion.loss(&outputs, &batch.labels)?;
            model.backward(&loss.grad)?;
            optimizer.step(model)?;
            self.clock.stop()?;

            let elapsed_ms = self.clock.elapsed_ms()?;
            let used_mem_mb = self.probe.used_memory_mb()?;
            window.record(BatchObservation {
                loss: loss.value,
                true_positives: count_matches(&outputs, &batch.labels),
                samples,
                elapsed_ms,
                used_mem_mb,
            });
            debug!("train batch {}: loss {:.6}, {:.3}ms", batch_index, loss.value, elapsed_ms);

            if (batch_index + 1) % interval == 0 {
                let metrics = window.summarize(Phase::Train, self.probe.utilization_percent()?)?;
                self.sink.emit(&MetricLine {
                    epoch,
                    kind: LineKind::Train { batch: batch_index },
                    metrics,
                })?;
                window.fold_into(&mut running);
            }
        }

        // A short final window gets no progress line but still counts.
        let open_window = window;
        window.fold_into(&mut running);

        let metrics = running.summarize(Phase::Train, self.probe.utilization_percent()?)?;
        self.sink.emit(&MetricLine { epoch, kind: LineKind::TrainSummary, metrics })?;
        Ok((metrics, open_window))
    }

    fn eval_epoch<M, L, Te>(
        &mut self,
        epoch: usize,
        model: &mut M,
        test: &mut Te,
        criterion: &L,
        seed: Accumulator,
    ) -> Result<PhaseMetrics>
    where
        M: Model + ?Sized,
        L: Criterion + ?Sized,
        Te: DataSource + ?Sized,
    {
        let device = self.config.device;
        let mut model = EvalScope::enter(model);

        let mut acc = seed;

        for (batch_index, batch) in test.batches().enumerate() {
            let batch = batch?;
            let samples = self.counted_samples(&batch)?;

            self.clock.start()?;
            let batch = batch.to_device(device);
            let outputs = model.forward(&batch)?;
            let loss = criterion.loss(&outputs, &batch.labels)?;
            let true_positives = count_matches(&outputs, &batch.labels);
            self.clock.stop()?;

            let elapsed_ms = self.clock.elapsed_ms()?;
            acc.record(BatchObservation {
                loss: loss.value,
                true_positives,
                samples,
                elapsed_ms,
                used_mem_mb: self.probe.used_memory_mb()?,
            });
            debug!("eval batch {}: loss {:.6}, {:.3}ms", batch_index, loss.value, elapsed_ms);
        }

        let metrics = acc.summarize(Phase::Eval, self.probe.utilization_percent()?)?;
        self.sink.emit(&MetricLine { epoch, kind: LineKind::Eval, metrics })?;
        Ok(metrics)
    }

    /// Samples `batch` adds to the running counts.
    ///
    /// A batch larger than `batch_size` is a data error: nominal counting
    /// would under-count it and push accuracy past 100%.
    fn counted_samples(&self, batch: &Batch) -> Result<usize> {
        let batch_size = self.config.batch_size;
        if batch.len() > batch_size {
            return Err(MonitorError::Data(format!(
                "batch of {} samples exceeds batch_size {}",
                batch.len(),
                batch_size
            )));
        }
        Ok(match self.config.sample_counting {
            SampleCounting::Nominal => batch_size,
            SampleCounting::Exact => batch.len(),
        })
    }

    fn publish(&mut self, stats: &EpochStats) {
        let receiver_gone = match &self.config.progress_tx {
            Some(tx) => tx.send(stats.clone()).is_err(),
            None => false,
        };
        if receiver_gone {
            warn!("progress receiver dropped; continuing without it");
            self.config.progress_tx = None;
        }
    }
}

/// Samples whose highest-scoring class equals the label.
fn count_matches(outputs: &Matrix, labels: &[usize]) -> usize {
    outputs
        .argmax_rows()
        .iter()
        .zip(labels)
        .filter(|(predicted, label)| predicted == label)
        .count()
}
