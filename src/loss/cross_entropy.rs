/// Categorical cross-entropy for a Softmax output layer.
pub struct CrossEntropyLoss;

/// Keeps log() finite when a probability underflows to 0.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// L = -Σ expected[i] · ln(predicted[i] + ε)
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Combined Softmax + cross-entropy gradient w.r.t. the logits:
    /// ∂L/∂z_i = predicted[i] - expected[i].
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect()
    }
}
