use serde::{Serialize, Deserialize};

use crate::progress::record::EpochMetrics;

/// Per-epoch training statistics emitted by `train_loop`.
///
/// Handed to `TrainingObserver::on_epoch_end` once per completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training loss over all samples in this epoch.
    pub train_loss: f64,
    /// Training accuracy as a fraction in [0, 1].
    pub train_accuracy: f64,
    /// Mean validation loss, if a validation set was provided.
    pub val_loss: Option<f64>,
    /// Validation accuracy in [0, 1], if a validation set was provided.
    pub val_accuracy: Option<f64>,
    /// Learning rate the epoch ran with.
    pub learning_rate: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

impl EpochStats {
    /// Metrics in the shape the progress document records; absent
    /// validation values are recorded as 0.
    pub fn metrics(&self) -> EpochMetrics {
        EpochMetrics {
            accuracy: self.train_accuracy,
            loss: self.train_loss,
            val_accuracy: self.val_accuracy.unwrap_or(0.0),
            val_loss: self.val_loss.unwrap_or(0.0),
            learning_rate: Some(self.learning_rate),
        }
    }
}
