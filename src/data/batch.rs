use crate::device::device_id::{DeviceId, Placement};
use crate::error::{MonitorError, Result};
use crate::math::matrix::Matrix;

/// A group of (input, label) pairs, one sample per row of `inputs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: Matrix,
    pub labels: Vec<usize>,
    placement: Placement,
}

impl Batch {
    /// Creates a host-resident batch.
    pub fn new(inputs: Matrix, labels: Vec<usize>) -> Result<Batch> {
        if inputs.rows != labels.len() {
            return Err(MonitorError::Data(format!(
                "batch has {} input rows but {} labels",
                inputs.rows,
                labels.len()
            )));
        }
        Ok(Batch { inputs, labels, placement: Placement::Host })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Moves the batch onto `device`.
    pub fn to_device(mut self, device: DeviceId) -> Batch {
        self.placement = Placement::Device(device);
        self
    }
}
