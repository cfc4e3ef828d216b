use serde::{Serialize, Deserialize};

use crate::data::batch::Batch;
use crate::device::device_id::{DeviceId, Placement};
use crate::error::Result;
use crate::math::matrix::Matrix;

/// Training or inference behaviour of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Train,
    Eval,
}

/// A trainable tensor paired with its accumulated gradient.
pub struct Param<'a> {
    pub value: &'a mut Matrix,
    pub grad: &'a mut Matrix,
}

/// A trainable classifier driven by the monitor.
///
/// `forward` returns one row of class scores per sample; the arg-max of a row
/// is the predicted class. While gradient tracking is disabled `forward` must
/// not retain anything for `backward`.
pub trait Model {
    fn forward(&mut self, batch: &Batch) -> Result<Matrix>;

    /// Back-propagates ∂L/∂outputs from the most recent tracked `forward`,
    /// accumulating into each parameter's gradient.
    fn backward(&mut self, grad_output: &Matrix) -> Result<()>;

    fn parameters(&mut self) -> Vec<Param<'_>>;

    fn mode(&self) -> Mode;
    fn set_mode(&mut self, mode: Mode);

    fn grad_enabled(&self) -> bool;
    fn set_grad_enabled(&mut self, enabled: bool);

    fn placement(&self) -> Placement;
    fn to_device(&mut self, device: DeviceId);
}
