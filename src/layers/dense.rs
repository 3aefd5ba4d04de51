use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    /// Activations from the last training forward pass.
    #[serde(skip)]
    pub neurons: Matrix,
    /// Pre-activations (z = xW + b) from the last training forward pass.
    #[serde(skip)]
    pre_neurons: Matrix,
}

impl Layer {
    /// He init for ReLU layers, Xavier for everything else. Biases start at zero.
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> Layer {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, size),
            _ => Matrix::xavier(input_size, size),
        };

        Layer {
            size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
            neurons: Matrix::zeros(1, size),
            pre_neurons: Matrix::zeros(1, size),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Training forward pass; caches z and a for backprop.
    pub fn feed_from(&mut self, input: &Matrix) -> Matrix {
        let z = input * &self.weights + self.biases.clone();
        let a = Matrix::row(self.activator.apply(&z.data));
        self.pre_neurons = z;
        self.neurons = a.clone();
        a
    }

    /// Forward pass without touching the caches.
    pub fn infer(&self, input: &[f64]) -> Vec<f64> {
        let z = &Matrix::row(input.to_vec()) * &self.weights + self.biases.clone();
        self.activator.apply(&z.data)
    }

    /// Computes gradient adjustments. Returns (weights_grad, biases_grad).
    /// `next_layer_delta` is ∂L/∂a for this layer (error in activation space).
    pub fn compute_gradients(&self, next_layer_delta: &Matrix, inputs: &Matrix) -> (Matrix, Matrix) {
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        // δ = error ⊙ σ'(z)
        let layer_delta = next_layer_delta.hadamard(&act_derivative);
        let weights_adjustment = &inputs.transpose() * &layer_delta;

        (weights_adjustment, layer_delta)
    }

    /// Applies pre-computed gradients scaled by lr.
    pub fn apply_gradients(&mut self, weights_grad: &Matrix, biases_grad: &Matrix, lr: f64) {
        self.weights.data.iter_mut().zip(&weights_grad.data).for_each(|(w, g)| *w -= g * lr);
        self.biases.data.iter_mut().zip(&biases_grad.data).for_each(|(b, g)| *b -= g * lr);
    }
}
