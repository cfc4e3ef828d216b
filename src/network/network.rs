use rand::Rng;

use crate::{activation::activation::ActivationFunction, layers::dense::Layer};
use crate::data::batch::Batch;
use crate::device::device_id::{DeviceId, Placement};
use crate::error::{MonitorError, Result};
use crate::math::matrix::Matrix;
use crate::network::model::{Mode, Model, Param};

/// Stack of dense layers producing raw class logits.
#[derive(Debug)]
pub struct Network {
    pub layers: Vec<Layer>,
    mode: Mode,
    grad_enabled: bool,
    placement: Placement,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    pub fn new<R: Rng>(layer_specs: Vec<(usize, usize, ActivationFunction)>, rng: &mut R) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Network {
            layers,
            mode: Mode::Train,
            grad_enabled: true,
            placement: Placement::Host,
        }
    }

    /// ReLU hidden layers followed by a linear logits layer.
    pub fn classifier<R: Rng>(in_features: usize, hidden: &[usize], num_classes: usize, rng: &mut R) -> Network {
        let mut specs = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = in_features;
        for &size in hidden {
            specs.push((size, fan_in, ActivationFunction::ReLU));
            fan_in = size;
        }
        specs.push((num_classes, fan_in, ActivationFunction::Identity));
        Network::new(specs, rng)
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }
}

impl Model for Network {
    fn forward(&mut self, batch: &Batch) -> Result<Matrix> {
        if batch.placement() != self.placement {
            return Err(MonitorError::DeviceMismatch {
                expected: self.placement,
                found: batch.placement(),
            });
        }
        if batch.inputs.cols != self.input_size() {
            return Err(MonitorError::Data(format!(
                "batch has {} features, network expects {}",
                batch.inputs.cols,
                self.input_size()
            )));
        }
        let track = self.grad_enabled;
        let mut current = batch.inputs.clone();
        for layer in &mut self.layers {
            current = layer.feed_from(&current, track);
        }
        Ok(current)
    }

    fn backward(&mut self, grad_output: &Matrix) -> Result<()> {
        let mut grad = grad_output.clone();
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad)?;
        }
        Ok(())
    }

    fn parameters(&mut self) -> Vec<Param<'_>> {
        self.layers.iter_mut().flat_map(|l| l.parameters()).collect()
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn grad_enabled(&self) -> bool {
        self.grad_enabled
    }

    fn set_grad_enabled(&mut self, enabled: bool) {
        self.grad_enabled = enabled;
    }

    fn placement(&self) -> Placement {
        self.placement
    }

    fn to_device(&mut self, device: DeviceId) {
        self.placement = Placement::Device(device);
    }
}
