pub mod emotion;
pub mod preprocess;
pub mod dataset;
pub mod progress;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod inference;
pub mod config;

// Convenience re-exports
pub use emotion::{EmotionLabel, EMOTIONS, NUM_CLASSES};
pub use preprocess::{load_image_tensor, DecodeError, ImageTensor};
pub use dataset::{load_split, LabeledImages};
pub use progress::{JsonFileStore, LoadOutcome, ProgressRecord, ProgressRecorder, ProgressStore};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use loss::cross_entropy::CrossEntropyLoss;
pub use optim::sgd::Sgd;
pub use train::{run_session, train_loop, TrainConfig};
pub use inference::{Classifier, Prediction};
pub use config::TrainSettings;
