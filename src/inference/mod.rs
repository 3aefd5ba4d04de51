pub mod classifier;

pub use classifier::{Classifier, InferenceError, ModelError, Prediction};
