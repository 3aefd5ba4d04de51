use tracing::warn;

use crate::progress::{Clock, ProgressRecorder, ProgressStore};
use crate::train::epoch_stats::EpochStats;

/// Summary returned by `train_loop` and passed to `on_train_end`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    /// Epochs actually run (less than requested if stopped early).
    pub epochs_run: usize,
    /// Mean training loss of the last completed epoch.
    pub final_train_loss: f64,
    pub stopped_early: bool,
    /// Early stopping fired and rolled the network back to its best epoch.
    pub restored_best_weights: bool,
    /// Lowest validation loss seen, if a validation set was provided.
    pub best_val_loss: Option<f64>,
    /// Learning rate in effect when training ended.
    pub final_learning_rate: f64,
}

/// Lifecycle hooks called by `train_loop`. All hooks default to no-ops.
///
/// `on_train_end` fires exactly once per run, including runs cut short by
/// early stopping.
pub trait TrainingObserver {
    fn on_train_begin(&mut self) {}
    /// `epoch` is 1-based.
    fn on_epoch_begin(&mut self, _epoch: usize) {}
    fn on_epoch_end(&mut self, _stats: &EpochStats) {}
    fn on_train_end(&mut self, _summary: &TrainSummary) {}
}

/// An observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TrainingObserver for NoopObserver {}

/// Progress reporting must never stop training, so rejected transitions are
/// logged and dropped here.
impl<S: ProgressStore, C: Clock> TrainingObserver for ProgressRecorder<S, C> {
    fn on_train_begin(&mut self) {
        if let Err(e) = self.begin() {
            warn!(error = %e, "progress recorder rejected train begin");
        }
    }

    fn on_epoch_begin(&mut self, epoch: usize) {
        if let Err(e) = self.epoch_begin(epoch) {
            warn!(error = %e, epoch, "progress recorder rejected epoch begin");
        }
    }

    fn on_epoch_end(&mut self, stats: &EpochStats) {
        if let Err(e) = self.epoch_end(stats.epoch, &stats.metrics()) {
            warn!(error = %e, epoch = stats.epoch, "progress recorder rejected epoch end");
        }
    }

    fn on_train_end(&mut self, _summary: &TrainSummary) {
        if let Err(e) = self.complete() {
            warn!(error = %e, "progress recorder rejected train end");
        }
    }
}

/// Records every hook call; handy for asserting call order in tests.
#[derive(Debug, Default, Clone)]
pub struct HistoryObserver {
    pub events: Vec<String>,
    pub epochs: Vec<EpochStats>,
}

impl TrainingObserver for HistoryObserver {
    fn on_train_begin(&mut self) {
        self.events.push("train_begin".into());
    }

    fn on_epoch_begin(&mut self, epoch: usize) {
        self.events.push(format!("epoch_begin:{epoch}"));
    }

    fn on_epoch_end(&mut self, stats: &EpochStats) {
        self.events.push(format!("epoch_end:{}", stats.epoch));
        self.epochs.push(stats.clone());
    }

    fn on_train_end(&mut self, summary: &TrainSummary) {
        self.events.push(format!("train_end:{}", summary.epochs_run));
    }
}
