use serde::{Serialize, Deserialize};

use crate::error::{MonitorError, Result};
use crate::math::matrix::Matrix;
use crate::network::model::Model;
use crate::optim::optimizer::Optimizer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SgdConfig {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        SgdConfig { learning_rate: 0.001, momentum: 0.9 }
    }
}

/// Stochastic gradient descent with classical momentum:
///   v = momentum * v + g
///   p = p - lr * v
pub struct Sgd {
    pub config: SgdConfig,
    velocity: Vec<Matrix>,
}

impl Sgd {
    pub fn new(config: SgdConfig) -> Sgd {
        Sgd { config, velocity: Vec::new() }
    }
}

impl Optimizer for Sgd {
    fn step<M: Model + ?Sized>(&mut self, model: &mut M) -> Result<()> {
        let params = model.parameters();
        if self.velocity.is_empty() {
            self.velocity = params
                .iter()
                .map(|p| Matrix::zeros(p.value.rows, p.value.cols))
                .collect();
        }
        if self.velocity.len() != params.len() {
            return Err(MonitorError::Model(format!(
                "optimizer tracks {} parameters but the model exposes {}",
                self.velocity.len(),
                params.len()
            )));
        }

        let SgdConfig { learning_rate, momentum } = self.config;
        for (param, v) in params.into_iter().zip(&mut self.velocity) {
            if (v.rows, v.cols) != (param.grad.rows, param.grad.cols) {
                return Err(MonitorError::Model("parameter shape changed between steps".into()));
            }
            for (vi, gi) in v.data.iter_mut().zip(&param.grad.data) {
                *vi = momentum * *vi + gi;
            }
            param.value.axpy(-learning_rate, v);
        }
        Ok(())
    }
}
