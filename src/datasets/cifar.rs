//! CIFAR-10 binary batches, laid out as `<root>/cifar-10-batches-bin/`.
//!
//! Each record is one label byte followed by 3072 pixel bytes: the red,
//! green and blue 32x32 planes in that order, already CHW.

use std::fs;
use std::path::Path;

use crate::data::dataset::TensorDataset;
use crate::datasets::registry::Split;
use crate::datasets::transform::to_unit_range;
use crate::error::{MonitorError, Result};

pub const SIDE: usize = 32;
const CLASSES: usize = 10;
const PIXELS: usize = 3 * SIDE * SIDE;
const RECORD: usize = 1 + PIXELS;

const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const TEST_FILES: [&str; 1] = ["test_batch.bin"];

pub fn load(root: &Path, split: Split) -> Result<TensorDataset> {
    let dir = root.join("cifar-10-batches-bin");
    let files: &[&str] = match split {
        Split::Train => &TRAIN_FILES,
        Split::Test => &TEST_FILES,
    };

    let mut inputs = Vec::new();
    let mut labels = Vec::new();
    for name in files {
        let bytes = fs::read(dir.join(name))?;
        parse_batch(&bytes, &mut inputs, &mut labels)
            .map_err(|e| MonitorError::Data(format!("{}: {}", name, e)))?;
    }
    TensorDataset::new(inputs, labels)
}

/// Appends every record of one batch file.
pub fn parse_batch(bytes: &[u8], inputs: &mut Vec<Vec<f64>>, labels: &mut Vec<usize>) -> Result<()> {
    if bytes.len() % RECORD != 0 {
        return Err(MonitorError::Data(format!(
            "length {} is not a multiple of the {}-byte record size",
            bytes.len(),
            RECORD
        )));
    }
    for (i, record) in bytes.chunks_exact(RECORD).enumerate() {
        let label = record[0] as usize;
        if label >= CLASSES {
            return Err(MonitorError::Data(format!(
                "record {}: label {} out of range for {} classes",
                i, label, CLASSES
            )));
        }
        labels.push(label);
        inputs.push(to_unit_range(&record[1..]));
    }
    Ok(())
}
