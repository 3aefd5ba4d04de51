pub mod settings;

pub use settings::{ConfigError, TrainSettings};
