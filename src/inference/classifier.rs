use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::emotion::{EmotionLabel, EMOTIONS, NUM_CLASSES};
use crate::network::{Network, ShapeError};
use crate::preprocess::{load_image_tensor, DecodeError, ImageTensor, IMAGE_INPUT_LEN};
use crate::train::argmax;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("cannot load model {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model labels {found:?} do not match {expected:?}")]
    LabelMismatch { expected: Vec<EmotionLabel>, found: Vec<EmotionLabel> },
    #[error("model takes {got} inputs and gives {outputs} outputs, need {} and {}", IMAGE_INPUT_LEN, NUM_CLASSES)]
    Shape { got: usize, outputs: usize },
    #[error("malformed model: {0}")]
    Layers(#[from] ShapeError),
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// One classified image. Percentages are in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: EmotionLabel,
    pub confidence: f64,
    /// Per-label percentages in label-set order.
    pub scores: Vec<(EmotionLabel, f64)>,
}

/// A trained network checked against the label set and input shape.
#[derive(Debug, Clone)]
pub struct Classifier {
    network: Network,
}

impl Classifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Classifier, ModelError> {
        let path = path.as_ref();
        let network = Network::load_json(path)
            .map_err(|source| ModelError::Load { path: path.to_path_buf(), source })?;
        Classifier::from_network(network)
    }

    pub fn from_network(network: Network) -> Result<Classifier, ModelError> {
        let found = network.metadata.as_ref().map(|m| m.labels.clone()).unwrap_or_default();
        if found != EMOTIONS {
            return Err(ModelError::LabelMismatch { expected: EMOTIONS.to_vec(), found });
        }
        network.check_shapes()?;
        if network.input_size() != IMAGE_INPUT_LEN || network.output_size() != NUM_CLASSES {
            return Err(ModelError::Shape { got: network.input_size(), outputs: network.output_size() });
        }
        Ok(Classifier { network })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn predict(&self, tensor: &ImageTensor) -> Prediction {
        let probs = self.network.infer(&tensor.to_input());
        let best = argmax(&probs);
        let scores: Vec<(EmotionLabel, f64)> = EMOTIONS
            .iter()
            .zip(&probs)
            .map(|(&label, &p)| (label, p * 100.0))
            .collect();
        Prediction { label: EMOTIONS[best], confidence: probs[best] * 100.0, scores }
    }

    pub fn classify_file(&self, path: impl AsRef<Path>) -> Result<Prediction, InferenceError> {
        let tensor = load_image_tensor(path)?;
        Ok(self.predict(&tensor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::dense::Layer;
    use crate::network::ModelMetadata;

    fn labelled(mut net: Network, labels: Vec<EmotionLabel>) -> Network {
        net.metadata = Some(ModelMetadata { labels, ..ModelMetadata::default() });
        net
    }

    #[test]
    fn predicts_a_distribution_over_all_labels() {
        let net = labelled(Network::classifier(IMAGE_INPUT_LEN, &[3], NUM_CLASSES), EMOTIONS.to_vec());
        let clf = Classifier::from_network(net).unwrap();
        let tensor = ImageTensor::from_normalized(vec![0.5; IMAGE_INPUT_LEN]).unwrap();

        let p = clf.predict(&tensor);
        assert_eq!(p.scores.len(), NUM_CLASSES);
        let total: f64 = p.scores.iter().map(|(_, s)| s).sum();
        assert!((total - 100.0).abs() < 1e-6);
        let max = p.scores.iter().map(|(_, s)| *s).fold(f64::MIN, f64::max);
        assert_eq!(p.confidence, max);
        assert_eq!(p.scores[p.label.index()].1, p.confidence);
    }

    #[test]
    fn rejects_reordered_labels() {
        let mut labels = EMOTIONS.to_vec();
        labels.swap(0, 6);
        let net = labelled(Network::classifier(IMAGE_INPUT_LEN, &[], NUM_CLASSES), labels);
        assert!(matches!(Classifier::from_network(net), Err(ModelError::LabelMismatch { .. })));

        let bare = Network::classifier(IMAGE_INPUT_LEN, &[], NUM_CLASSES);
        assert!(matches!(Classifier::from_network(bare), Err(ModelError::LabelMismatch { .. })));
    }

    #[test]
    fn rejects_wrong_input_size() {
        let net = labelled(Network::classifier(10, &[], NUM_CLASSES), EMOTIONS.to_vec());
        assert!(matches!(Classifier::from_network(net), Err(ModelError::Shape { got: 10, .. })));
    }

    #[test]
    fn load_and_classify_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        labelled(Network::classifier(IMAGE_INPUT_LEN, &[], NUM_CLASSES), EMOTIONS.to_vec())
            .save_json(&path)
            .unwrap();

        let clf = Classifier::load(&path).unwrap();
        let err = clf.classify_file(dir.path().join("face.png")).unwrap_err();
        assert!(matches!(err, InferenceError::Decode(DecodeError::Missing { .. })));

        assert!(matches!(Classifier::load(dir.path().join("none.json")), Err(ModelError::Load { .. })));
    }

    #[test]
    fn rejects_mis_chained_layers_instead_of_panicking() {
        let mut net = labelled(Network::classifier(IMAGE_INPUT_LEN, &[4], NUM_CLASSES), EMOTIONS.to_vec());
        net.layers[1] = Layer::new(NUM_CLASSES, 5, ActivationFunction::Softmax);
        let err = Classifier::from_network(net).unwrap_err();
        assert!(matches!(err, ModelError::Layers(ShapeError { layer: 1, .. })));
    }

    #[test]
    fn rejects_truncated_weights_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut net = labelled(Network::classifier(IMAGE_INPUT_LEN, &[], NUM_CLASSES), EMOTIONS.to_vec());
        net.layers[0].weights.data.truncate(10);
        net.save_json(&path).unwrap();

        assert!(matches!(Classifier::load(&path), Err(ModelError::Layers(_))));
    }
}
