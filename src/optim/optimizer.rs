use crate::error::Result;
use crate::network::model::Model;

/// Updates a model's parameters from their accumulated gradients.
pub trait Optimizer {
    /// Clears every accumulated gradient.
    fn zero_grad<M: Model + ?Sized>(&mut self, model: &mut M) {
        for param in model.parameters() {
            param.grad.fill(0.0);
        }
    }

    /// Applies one update.
    fn step<M: Model + ?Sized>(&mut self, model: &mut M) -> Result<()>;
}
