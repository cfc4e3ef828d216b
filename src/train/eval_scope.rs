use std::ops::{Deref, DerefMut};

use crate::network::model::{Mode, Model};

/// Puts a model in evaluation mode with gradient tracking off for as long as
/// the scope lives. Dropping it restores the previous mode and tracking flag,
/// also when the scope is left through `?` or a panic.
pub struct EvalScope<'a, M: Model + ?Sized> {
    model: &'a mut M,
    prev_mode: Mode,
    prev_grad: bool,
}

impl<'a, M: Model + ?Sized> EvalScope<'a, M> {
    pub fn enter(model: &'a mut M) -> Self {
        let prev_mode = model.mode();
        let prev_grad = model.grad_enabled();
        model.set_mode(Mode::Eval);
        model.set_grad_enabled(false);
        EvalScope { model, prev_mode, prev_grad }
    }
}

impl<M: Model + ?Sized> Deref for EvalScope<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.model
    }
}

impl<M: Model + ?Sized> DerefMut for EvalScope<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        self.model
    }
}

impl<M: Model + ?Sized> Drop for EvalScope<'_, M> {
    fn drop(&mut self) {
        self.model.set_mode(self.prev_mode);
        self.model.set_grad_enabled(self.prev_grad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MonitorError, Result};
    use crate::network::network::Network;

    fn fails_inside(model: &mut Network) -> Result<()> {
        let scope = EvalScope::enter(model);
        assert_eq!(scope.mode(), Mode::Eval);
        Err(MonitorError::Data("boom".into()))
    }

    #[test]
    fn restores_training_state_on_error() {
        let mut net = Network::classifier(2, &[], 2, &mut rand::thread_rng());
        assert!(fails_inside(&mut net).is_err());
        assert_eq!(net.mode(), Mode::Train);
        assert!(net.grad_enabled());
    }

    #[test]
    fn disables_gradients_inside() {
        let mut net = Network::classifier(2, &[], 2, &mut rand::thread_rng());
        {
            let scope = EvalScope::enter(&mut net);
            assert!(!scope.grad_enabled());
        }
        assert!(net.grad_enabled());
    }

    #[test]
    fn nested_scopes_restore_the_outer_state() {
        let mut net = Network::classifier(2, &[], 2, &mut rand::thread_rng());
        let mut outer = EvalScope::enter(&mut net);
        {
            let inner = EvalScope::enter(&mut *outer);
            assert_eq!(inner.mode(), Mode::Eval);
        }
        assert_eq!(outer.mode(), Mode::Eval);
        assert!(!outer.grad_enabled());
        drop(outer);
        assert_eq!(net.mode(), Mode::Train);
    }
}
