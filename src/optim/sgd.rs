use crate::{layers::dense::Layer, math::matrix::Matrix};

/// Plain mini-batch SGD. `learning_rate` is public so the plateau schedule
/// can lower it between epochs.
#[derive(Debug, Clone, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one update from gradients summed over `batch_len` samples.
    pub fn step(&self, layer: &mut Layer, weights_grad_sum: &Matrix, biases_grad_sum: &Matrix, batch_len: usize) {
        let lr = self.learning_rate / batch_len.max(1) as f64;
        layer.apply_gradients(weights_grad_sum, biases_grad_sum, lr);
    }
}
