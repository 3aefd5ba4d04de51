use crate::network::network::Network;

/// Stop training once `val_loss` has not improved for `patience` epochs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarlyStopping {
    pub patience: usize,
    /// Minimum decrease that counts as an improvement.
    pub min_delta: f64,
    /// Put the best-scoring weights back when the patience runs out.
    pub restore_best_weights: bool,
}

impl Default for EarlyStopping {
    fn default() -> Self {
        EarlyStopping { patience: 10, min_delta: 0.0, restore_best_weights: true }
    }
}

impl EarlyStopping {
    pub fn tracker(&self) -> EarlyStoppingTracker {
        EarlyStoppingTracker { params: *self, best: f64::INFINITY, wait: 0, best_weights: None }
    }
}

/// Per-run state of an [`EarlyStopping`] callback.
#[derive(Debug)]
pub struct EarlyStoppingTracker {
    params: EarlyStopping,
    best: f64,
    wait: usize,
    best_weights: Option<Network>,
}

impl EarlyStoppingTracker {
    /// Feeds one epoch's validation loss. Returns `true` when training should stop.
    /// Epochs without a validation loss are ignored.
    pub fn observe(&mut self, val_loss: Option<f64>, network: &Network) -> bool {
        let Some(current) = val_loss else { return false };

        self.wait += 1;
        if current < self.best - self.params.min_delta {
            self.best = current;
            self.wait = 0;
            if self.params.restore_best_weights {
                self.best_weights = Some(network.clone());
            }
        }
        self.wait >= self.params.patience
    }

    pub fn best(&self) -> Option<f64> {
        self.best.is_finite().then_some(self.best)
    }

    /// The best-scoring weights, to put back once the patience has run out.
    pub fn take_best_weights(&mut self) -> Option<Network> {
        self.best_weights.take()
    }
}

/// Multiply the learning rate by `factor` once `val_loss` has not improved
/// for `patience` epochs, never going below `min_lr`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReduceLrOnPlateau {
    pub factor: f64,
    pub patience: usize,
    pub min_lr: f64,
    pub min_delta: f64,
}

impl Default for ReduceLrOnPlateau {
    fn default() -> Self {
        ReduceLrOnPlateau { factor: 0.5, patience: 5, min_lr: 1e-7, min_delta: 1e-4 }
    }
}

impl ReduceLrOnPlateau {
    pub fn tracker(&self) -> PlateauTracker {
        PlateauTracker { params: *self, best: f64::INFINITY, wait: 0 }
    }
}

/// Per-run state of a [`ReduceLrOnPlateau`] callback.
#[derive(Debug, Clone)]
pub struct PlateauTracker {
    params: ReduceLrOnPlateau,
    best: f64,
    wait: usize,
}

impl PlateauTracker {
    /// Feeds one epoch's validation loss. Returns the new learning rate when
    /// it should change.
    pub fn observe(&mut self, val_loss: Option<f64>, current_lr: f64) -> Option<f64> {
        let current = val_loss?;

        if current < self.best - self.params.min_delta {
            self.best = current;
            self.wait = 0;
            return None;
        }

        self.wait += 1;
        if self.wait < self.params.patience || current_lr <= self.params.min_lr {
            return None;
        }
        self.wait = 0;
        Some((current_lr * self.params.factor).max(self.params.min_lr))
    }
}
