use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::{
    activation::activation::ActivationFunction,
    layers::dense::Layer,
    math::matrix::Matrix,
    network::metadata::ModelMetadata,
};

/// A layer whose stored shapes do not fit its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("layer {layer}: {reason}")]
pub struct ShapeError {
    pub layer: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    pub fn new(layer_specs: Vec<(usize, usize, ActivationFunction)>) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation))
            .collect();
        Network { layers, metadata: None }
    }

    /// ReLU hidden layers of the given widths followed by a Softmax output.
    pub fn classifier(input_size: usize, hidden: &[usize], classes: usize) -> Network {
        let mut specs = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = input_size;
        for &width in hidden {
            specs.push((width, fan_in, ActivationFunction::ReLU));
            fan_in = width;
        }
        specs.push((classes, fan_in, ActivationFunction::Softmax));
        Network::new(specs)
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    /// Checks that every layer's matrices are well-formed and chain into the
    /// next. Freshly built networks always pass; loaded ones may not.
    pub fn check_shapes(&self) -> Result<(), ShapeError> {
        let mut fan_in = self.input_size();
        for (i, layer) in self.layers.iter().enumerate() {
            let err = |reason: String| Err(ShapeError { layer: i, reason });
            let (w, b) = (&layer.weights, &layer.biases);
            if w.data.len() != w.rows * w.cols {
                return err(format!("weights hold {} values, expected {}x{}", w.data.len(), w.rows, w.cols));
            }
            if b.data.len() != b.rows * b.cols {
                return err(format!("biases hold {} values, expected {}x{}", b.data.len(), b.rows, b.cols));
            }
            if w.rows != fan_in {
                return err(format!("takes {} inputs but receives {}", w.rows, fan_in));
            }
            if w.cols != layer.size || b.rows != 1 || b.cols != layer.size {
                return err(format!(
                    "size {} with weights {}x{} and biases {}x{}",
                    layer.size, w.rows, w.cols, b.rows, b.cols
                ));
            }
            fan_in = layer.size;
        }
        Ok(())
    }

    /// Total weights + biases. Every parameter is trainable.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Forward pass; stores activations in each layer for backprop.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let mut current = Matrix::row(input.to_vec());
        for layer in &mut self.layers {
            current = layer.feed_from(&current);
        }
        current.data
    }

    /// Forward pass for evaluation and inference; leaves caches untouched.
    pub fn infer(&self, input: &[f64]) -> Vec<f64> {
        self.layers.iter().fold(input.to_vec(), |current, layer| layer.infer(&current))
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> std::io::Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_shapes_and_parameter_count() {
        let net = Network::classifier(10, &[4, 3], 7);
        assert_eq!(net.layers.len(), 3);
        assert_eq!(net.input_size(), 10);
        assert_eq!(net.output_size(), 7);
        assert_eq!(net.parameter_count(), (10 * 4 + 4) + (4 * 3 + 3) + (3 * 7 + 7));
    }

    #[test]
    fn infer_matches_forward_and_is_a_distribution() {
        let mut net = Network::classifier(5, &[6], 3);
        let input = [0.1, 0.9, 0.3, 0.0, 1.0];
        let a = net.infer(&input);
        let b = net.forward(&input);
        assert_eq!(a, b);
        assert!((a.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn json_roundtrip_keeps_weights_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        let mut net = Network::classifier(4, &[2], 7);
        net.metadata = Some(ModelMetadata {
            description: Some("test".into()),
            input_shape: Some((2, 2, 1)),
            labels: crate::emotion::EMOTIONS.to_vec(),
        });
        net.save_json(&path).unwrap();

        let loaded = Network::load_json(&path).unwrap();
        assert_eq!(loaded.metadata, net.metadata);
        assert_eq!(loaded.layers[0].weights, net.layers[0].weights);
        assert_eq!(loaded.infer(&[1.0, 0.0, 0.5, 0.5]), net.infer(&[1.0, 0.0, 0.5, 0.5]));
    }

    #[test]
    fn check_shapes_catches_broken_chain_and_storage() {
        let net = Network::classifier(6, &[4, 3], 2);
        assert_eq!(net.check_shapes(), Ok(()));

        let mut chained = net.clone();
        chained.layers[1] = Layer::new(3, 5, ActivationFunction::ReLU);
        assert_eq!(chained.check_shapes().unwrap_err().layer, 1);

        let mut truncated = net.clone();
        truncated.layers[2].weights.data.pop();
        assert_eq!(truncated.check_shapes().unwrap_err().layer, 2);

        let mut biases = net;
        biases.layers[0].biases = Matrix::zeros(1, 3);
        assert_eq!(biases.check_shapes().unwrap_err().layer, 0);
    }
}
