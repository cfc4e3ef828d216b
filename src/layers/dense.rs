use rand::Rng;

use crate::{activation::activation::ActivationFunction, math::matrix::Matrix};
use crate::error::{MonitorError, Result};
use crate::network::model::Param;

/// Fully connected layer operating on a whole batch at once.
///
/// Weights are (input_size, size) so that `output = input * W + b` with one
/// sample per row.
#[derive(Debug)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    weights_grad: Matrix,
    biases_grad: Matrix,
    // Saved by a tracked forward pass; consumed by backward.
    input: Option<Matrix>,
    pre_activation: Option<Matrix>,
}

impl Layer {
    pub fn new<R: Rng>(size: usize, input_size: usize, activation: ActivationFunction, rng: &mut R) -> Layer {
        Layer {
            size,
            weights: Matrix::he(input_size, size, rng),
            biases: Matrix::zeros(1, size),
            activator: activation,
            weights_grad: Matrix::zeros(input_size, size),
            biases_grad: Matrix::zeros(1, size),
            input: None,
            pre_activation: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Forward pass. With `track` set, keeps what backward needs.
    pub fn feed_from(&mut self, input: &Matrix, track: bool) -> Matrix {
        let mut z = input * &self.weights;
        z.add_row(&self.biases);
        let a = z.map(|x| self.activator.function(x));
        if track {
            self.input = Some(input.clone());
            self.pre_activation = Some(z);
        } else {
            self.input = None;
            self.pre_activation = None;
        }
        a
    }

    /// Accumulates parameter gradients and returns ∂L/∂input.
    ///
    /// `grad_output` is ∂L/∂a for this layer's activations.
    pub fn backward(&mut self, grad_output: &Matrix) -> Result<Matrix> {
        let (input, z) = match (self.input.take(), self.pre_activation.take()) {
            (Some(input), Some(z)) => (input, z),
            _ => {
                return Err(MonitorError::Model(
                    "backward called without a tracked forward pass".into(),
                ))
            }
        };
        let delta = grad_output.hadamard(&z.map(|x| self.activator.derivative(x)));

        self.weights_grad.axpy(1.0, &(&input.transpose() * &delta));
        self.biases_grad.axpy(1.0, &delta.sum_rows());

        Ok(&delta * &self.weights.transpose())
    }

    pub fn parameters(&mut self) -> [Param<'_>; 2] {
        [
            Param { value: &mut self.weights, grad: &mut self.weights_grad },
            Param { value: &mut self.biases, grad: &mut self.biases_grad },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_layer() -> Layer {
        let mut layer = Layer::new(2, 2, ActivationFunction::Identity, &mut rand::thread_rng());
        layer.weights = Matrix::from_vec(2, 2, vec![1.0, 0.0, 0.0, 1.0]);
        layer.biases = Matrix::from_vec(1, 2, vec![0.5, -0.5]);
        layer
    }

    #[test]
    fn forward_applies_weights_and_bias() {
        let mut layer = identity_layer();
        let out = layer.feed_from(&Matrix::from_vec(1, 2, vec![1.0, 2.0]), false);
        assert_eq!(out.data, vec![1.5, 1.5]);
    }

    #[test]
    fn backward_accumulates_gradients() {
        let mut layer = identity_layer();
        let input = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let grad = Matrix::from_vec(2, 2, vec![1.0, 0.0, 0.0, 1.0]);

        layer.feed_from(&input, true);
        let grad_in = layer.backward(&grad).unwrap();
        assert_eq!(grad_in.data, vec![1.0, 0.0, 0.0, 1.0]);

        let [w, b] = layer.parameters();
        assert_eq!(w.grad.data, vec![1.0, 3.0, 2.0, 4.0]);
        assert_eq!(b.grad.data, vec![1.0, 1.0]);
    }

    #[test]
    fn untracked_forward_cannot_backpropagate() {
        let mut layer = identity_layer();
        layer.feed_from(&Matrix::from_vec(1, 2, vec![1.0, 2.0]), false);
        assert!(matches!(
            layer.backward(&Matrix::zeros(1, 2)),
            Err(MonitorError::Model(_))
        ));
    }
}
