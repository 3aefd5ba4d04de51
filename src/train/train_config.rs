use crate::train::schedule::{EarlyStopping, ReduceLrOnPlateau};

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`         — maximum number of full passes over the training data
/// - `batch_size`     — samples per mini-batch; use `1` for online SGD
/// - `early_stopping` — optional stop-on-`val_loss`-plateau callback
/// - `reduce_lr`      — optional learning-rate reduction on `val_loss` plateau
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub early_stopping: Option<EarlyStopping>,
    pub reduce_lr: Option<ReduceLrOnPlateau>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no callbacks.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            early_stopping: None,
            reduce_lr: None,
        }
    }
}
