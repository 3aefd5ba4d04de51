use serde::{Deserialize, Serialize};

use crate::emotion::EmotionLabel;

/// Annotations saved alongside the weights.
///
/// `labels` is written from the shared label set at training time and checked
/// against it again when a model is loaded for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// (height, width, channels) of one input sample.
    pub input_shape: Option<(usize, usize, usize)>,
    /// Output neuron `i` corresponds to `labels[i]`.
    #[serde(default)]
    pub labels: Vec<EmotionLabel>,
}
