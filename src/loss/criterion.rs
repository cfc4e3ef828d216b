use crate::error::Result;
use crate::math::matrix::Matrix;

/// Scalar loss for a batch plus its gradient with respect to the model outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct LossOutput {
    pub value: f64,
    pub grad: Matrix,
}

/// Scores model outputs against class labels.
pub trait Criterion {
    fn loss(&self, outputs: &Matrix, labels: &[usize]) -> Result<LossOutput>;
}
