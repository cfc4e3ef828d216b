use crate::error::{MonitorError, Result};

/// Random-access collection of preprocessed samples.
///
/// `get` may do real work (decoding, resizing); the loader calls it from its
/// prefetch worker, hence `Send + Sync`.
pub trait Dataset: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattened input width of every sample.
    fn features(&self) -> usize;

    /// Returns the flattened input and class index of sample `index`.
    fn get(&self, index: usize) -> Result<(Vec<f64>, usize)>;
}

/// Samples already decoded into memory.
#[derive(Debug, Clone)]
pub struct TensorDataset {
    inputs: Vec<Vec<f64>>,
    labels: Vec<usize>,
    features: usize,
}

impl TensorDataset {
    pub fn new(inputs: Vec<Vec<f64>>, labels: Vec<usize>) -> Result<TensorDataset> {
        if inputs.len() != labels.len() {
            return Err(MonitorError::Data(format!(
                "{} inputs but {} labels",
                inputs.len(),
                labels.len()
            )));
        }
        let features = inputs.first().map(|x| x.len()).unwrap_or(0);
        if let Some(i) = inputs.iter().position(|x| x.len() != features) {
            return Err(MonitorError::Data(format!(
                "sample {} has {} features, expected {}",
                i,
                inputs[i].len(),
                features
            )));
        }
        Ok(TensorDataset { inputs, labels, features })
    }
}

impl Dataset for TensorDataset {
    fn len(&self) -> usize {
        self.inputs.len()
    }

    fn features(&self) -> usize {
        self.features
    }

    fn get(&self, index: usize) -> Result<(Vec<f64>, usize)> {
        let input = self
            .inputs
            .get(index)
            .ok_or_else(|| MonitorError::Data(format!("sample index {} out of range", index)))?;
        Ok((input.clone(), self.labels[index]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_inputs() {
        let err = TensorDataset::new(vec![vec![0.0; 3], vec![0.0; 2]], vec![0, 1]).unwrap_err();
        assert!(matches!(err, MonitorError::Data(_)));
    }

    #[test]
    fn rejects_label_count_mismatch() {
        assert!(TensorDataset::new(vec![vec![0.0; 3]], vec![0, 1]).is_err());
    }
}
