use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Deserialize};

use crate::data::dataset::Dataset;
use crate::data::loader::DataLoader;
use crate::datasets::{cifar, mnist, pascal};
use crate::error::{MonitorError, Result};

/// Dataset half to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

/// Supported datasets. Each variant knows its input geometry, class count,
/// preprocessing and where its files live under the data root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Cifar10,
    Mnist,
    Pascal,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [DatasetKind::Cifar10, DatasetKind::Mnist, DatasetKind::Pascal];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Cifar10 => "cifar10",
            DatasetKind::Mnist => "mnist",
            DatasetKind::Pascal => "pascal",
        }
    }

    pub fn in_channels(&self) -> usize {
        match self {
            DatasetKind::Cifar10 | DatasetKind::Pascal => 3,
            DatasetKind::Mnist => 1,
        }
    }

    pub fn num_classes(&self) -> usize {
        match self {
            DatasetKind::Cifar10 | DatasetKind::Mnist => 10,
            DatasetKind::Pascal => pascal::OBJECT_CATEGORIES.len(),
        }
    }

    /// (height, width) of the tensors handed to the model.
    pub fn image_size(&self) -> (usize, usize) {
        match self {
            DatasetKind::Cifar10 => (cifar::SIDE, cifar::SIDE),
            DatasetKind::Mnist => (mnist::SIDE, mnist::SIDE),
            DatasetKind::Pascal => (pascal::RESIZE, pascal::RESIZE),
        }
    }

    /// Flattened CHW input width.
    pub fn input_features(&self) -> usize {
        let (h, w) = self.image_size();
        self.in_channels() * h * w
    }

    pub fn load(&self, root: &Path, split: Split) -> Result<Arc<dyn Dataset>> {
        let dataset: Arc<dyn Dataset> = match self {
            DatasetKind::Cifar10 => Arc::new(cifar::load(root, split)?),
            DatasetKind::Mnist => Arc::new(mnist::load(root, split)?),
            DatasetKind::Pascal => Arc::new(pascal::VocClassification::open(root, split)?),
        };
        log::info!("loaded {} {:?} split: {} samples", self.name(), split, dataset.len());
        Ok(dataset)
    }

    /// Training data is shuffled every epoch; test data keeps file order.
    /// Both use one prefetch worker.
    pub fn loader(&self, root: &Path, split: Split, batch_size: usize) -> Result<DataLoader> {
        let loader = DataLoader::new(self.load(root, split)?, batch_size)?
            .shuffle(split == Split::Train)
            .num_workers(1);
        Ok(loader)
    }
}

impl FromStr for DatasetKind {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| MonitorError::UnsupportedDataset(s.to_owned()))
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
