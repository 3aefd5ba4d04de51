pub mod label;

pub use label::{EmotionLabel, UnknownLabel, EMOTIONS, NUM_CLASSES};
