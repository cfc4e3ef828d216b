use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::batch::Batch;
use crate::data::dataset::Dataset;
use crate::error::{MonitorError, Result};
use crate::math::matrix::Matrix;

/// A finite sequence of batches that can be replayed once per epoch.
pub trait DataSource {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_>;
}

impl<D: DataSource + ?Sized> DataSource for &mut D {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        (**self).batches()
    }
}

/// Pre-built batches, replayed in order every epoch.
impl DataSource for Vec<Batch> {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        Box::new(self.iter().cloned().map(Ok))
    }
}

/// Batches a `Dataset`, optionally shuffling each epoch and prefetching on a
/// background worker.
///
/// # Fields
/// - `batch_size`: samples per batch; the last batch of an epoch may be short
/// - `shuffle`: reorder samples at the start of every epoch
/// - `num_workers`: `0` assembles batches on the caller's thread, any other
///   value uses one prefetch worker
/// - `prefetch`: batches the worker may run ahead of the consumer
/// - `seed`: makes shuffling reproducible (mixed with the epoch count)
pub struct DataLoader {
    dataset: Arc<dyn Dataset>,
    batch_size: usize,
    shuffle: bool,
    num_workers: usize,
    prefetch: usize,
    seed: Option<u64>,
    epoch: u64,
}

impl DataLoader {
    pub fn new(dataset: Arc<dyn Dataset>, batch_size: usize) -> Result<DataLoader> {
        if batch_size == 0 {
            return Err(MonitorError::InvalidConfig("batch_size must be at least 1".into()));
        }
        Ok(DataLoader {
            dataset,
            batch_size,
            shuffle: false,
            num_workers: 0,
            prefetch: 2,
            seed: None,
            epoch: 0,
        })
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn dataset(&self) -> &Arc<dyn Dataset> {
        &self.dataset
    }

    fn epoch_order(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            match self.seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(self.epoch << 32));
                    order.shuffle(&mut rng);
                }
                None => order.shuffle(&mut rand::thread_rng()),
            }
        }
        self.epoch += 1;
        order
    }
}

impl DataSource for DataLoader {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        let assembler = BatchAssembler {
            dataset: Arc::clone(&self.dataset),
            order: self.epoch_order(),
            batch_size: self.batch_size,
            cursor: 0,
        };
        if self.num_workers == 0 {
            Box::new(assembler)
        } else {
            Box::new(Prefetcher::spawn(assembler, self.prefetch))
        }
    }
}

/// Walks one epoch's sample order and builds batches.
struct BatchAssembler {
    dataset: Arc<dyn Dataset>,
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
}

impl BatchAssembler {
    fn assemble(&self, indices: &[usize]) -> Result<Batch> {
        let features = self.dataset.features();
        let mut data = Vec::with_capacity(indices.len() * features);
        let mut labels = Vec::with_capacity(indices.len());
        for &idx in indices {
            let (input, label) = self.dataset.get(idx)?;
            if input.len() != features {
                return Err(MonitorError::Data(format!(
                    "sample {} has {} features, expected {}",
                    idx,
                    input.len(),
                    features
                )));
            }
            data.extend_from_slice(&input);
            labels.push(label);
        }
        Batch::new(Matrix::from_vec(indices.len(), features, data), labels)
    }
}

impl Iterator for BatchAssembler {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.assemble(&self.order[self.cursor..end]);
        self.cursor = end;
        Some(batch)
    }
}

/// Runs a `BatchAssembler` on a worker thread behind a bounded channel.
struct Prefetcher {
    rx: Option<Receiver<Result<Batch>>>,
    worker: Option<JoinHandle<()>>,
}

impl Prefetcher {
    fn spawn(assembler: BatchAssembler, capacity: usize) -> Prefetcher {
        let (tx, rx) = mpsc::sync_channel(capacity);
        let worker = thread::spawn(move || {
            for batch in assembler {
                // Receiver gone: the epoch was abandoned.
                if tx.send(batch).is_err() {
                    break;
                }
            }
        });
        Prefetcher { rx: Some(rx), worker: Some(worker) }
    }
}

impl Iterator for Prefetcher {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let rx = self.rx.as_ref()?;
        match rx.recv() {
            Ok(batch) => Some(batch),
            Err(_) => {
                self.rx = None;
                match self.worker.take().map(|w| w.join()) {
                    Some(Err(_)) => Some(Err(MonitorError::Data("prefetch worker panicked".into()))),
                    _ => None,
                }
            }
        }
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        // Unblock a worker waiting on a full channel before joining it.
        self.rx = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("prefetch worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::TensorDataset;

    fn counting_dataset(n: usize) -> Arc<dyn Dataset> {
        let inputs = (0..n).map(|i| vec![i as f64, 0.0]).collect();
        let labels = (0..n).map(|i| i % 3).collect();
        Arc::new(TensorDataset::new(inputs, labels).unwrap())
    }

    fn first_column(batches: Vec<Batch>) -> Vec<usize> {
        batches
            .iter()
            .flat_map(|b| (0..b.len()).map(move |r| b.inputs.get(r, 0) as usize))
            .collect()
    }

    #[test]
    fn last_batch_is_short() {
        let mut loader = DataLoader::new(counting_dataset(10), 4).unwrap();
        let sizes: Vec<usize> = loader.batches().map(|b| b.unwrap().len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn prefetching_preserves_order() {
        let mut loader = DataLoader::new(counting_dataset(9), 2).unwrap().num_workers(1).prefetch(1);
        let batches: Vec<Batch> = loader.batches().collect::<Result<_>>().unwrap();
        assert_eq!(first_column(batches), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn replays_every_epoch() {
        let mut loader = DataLoader::new(counting_dataset(5), 2).unwrap().num_workers(1);
        assert_eq!(loader.batches().count(), 3);
        assert_eq!(loader.batches().count(), 3);
    }

    #[test]
    fn seeded_shuffle_is_a_reproducible_permutation() {
        let mut a = DataLoader::new(counting_dataset(16), 4).unwrap().shuffle(true).seed(7);
        let mut b = DataLoader::new(counting_dataset(16), 4).unwrap().shuffle(true).seed(7);
        let order_a = first_column(a.batches().collect::<Result<_>>().unwrap());
        let order_b = first_column(b.batches().collect::<Result<_>>().unwrap());
        assert_eq!(order_a, order_b);

        let mut sorted = order_a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn abandoning_an_epoch_does_not_hang() {
        let mut loader = DataLoader::new(counting_dataset(64), 1).unwrap().num_workers(1).prefetch(1);
        let mut it = loader.batches();
        assert!(it.next().is_some());
        drop(it);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(matches!(
            DataLoader::new(counting_dataset(1), 0),
            Err(MonitorError::InvalidConfig(_))
        ));
    }
}
