use std::time::Instant;

use rand::seq::SliceRandom;
use tracing::info;

use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::sgd::Sgd;
use crate::train::epoch_stats::EpochStats;
use crate::train::observer::{TrainSummary, TrainingObserver};
use crate::train::train_config::TrainConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrainError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("{inputs} inputs but {labels} labels")]
    LengthMismatch { inputs: usize, labels: usize },
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("sample has {got} values, network expects {expected}")]
    InputSize { expected: usize, got: usize },
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` with softmax cross-entropy for up to `config.epochs`
/// epochs.
///
/// # Arguments
/// - `network`      — mutable reference to the network; modified in place
/// - `train_inputs` — training samples, each a `Vec<f64>` of length `input_size`
/// - `train_labels` — one-hot targets, same length as `train_inputs`
/// - `val_inputs`   — optional validation samples
/// - `val_labels`   — optional validation targets (required iff `val_inputs` is `Some`)
/// - `optimizer`    — SGD optimizer; its learning rate may be lowered by `config.reduce_lr`
/// - `config`       — epochs, batch size and plateau callbacks
/// - `observer`     — lifecycle hooks (progress recording, call recording in tests)
///
/// # Early termination
/// Stops before `config.epochs` when `config.early_stopping` fires. When it
/// fires and is configured to restore weights, the best-`val_loss` weights
/// are put back before `on_train_end`. A run that never fires keeps the
/// weights of its last epoch.
#[allow(clippy::too_many_arguments)]
pub fn train_loop(
    network: &mut Network,
    train_inputs: &[Vec<f64>],
    train_labels: &[Vec<f64>],
    val_inputs: Option<&[Vec<f64>]>,
    val_labels: Option<&[Vec<f64>]>,
    optimizer: &mut Sgd,
    config: &TrainConfig,
    observer: &mut dyn TrainingObserver,
) -> Result<TrainSummary, TrainError> {
    validate(network, train_inputs, train_labels)?;
    if config.batch_size == 0 {
        return Err(TrainError::ZeroBatchSize);
    }
    let validation = match (val_inputs, val_labels) {
        (Some(vi), Some(vl)) if !vi.is_empty() => {
            validate(network, vi, vl)?;
            Some((vi, vl))
        }
        _ => None,
    };

    let mut early_stopping = config.early_stopping.map(|es| es.tracker());
    let mut reduce_lr = config.reduce_lr.map(|r| r.tracker());

    let mut last_train_loss = 0.0;
    let mut epochs_run = 0;
    let mut stopped_early = false;
    let mut early_stop_fired = false;

    observer.on_train_begin();

    for epoch in 1..=config.epochs {
        observer.on_epoch_begin(epoch);
        let t_start = Instant::now();

        // ── One full pass over the training data ───────────────────────────
        let train_loss = run_one_epoch(network, train_inputs, train_labels, optimizer, config.batch_size);
        last_train_loss = train_loss;
        epochs_run = epoch;

        let train_accuracy = compute_accuracy(network, train_inputs, train_labels);

        // ── Validation ────────────────────────────────────────────────────
        let (val_loss, val_accuracy) = match validation {
            Some((vi, vl)) => (
                Some(compute_eval_loss(network, vi, vl)),
                Some(compute_accuracy(network, vi, vl)),
            ),
            None => (None, None),
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
            learning_rate: optimizer.learning_rate,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        info!(
            epoch,
            total = config.epochs,
            loss = stats.train_loss,
            accuracy = stats.train_accuracy,
            val_loss = ?stats.val_loss,
            val_accuracy = ?stats.val_accuracy,
            lr = stats.learning_rate,
            elapsed_ms = stats.elapsed_ms,
            "epoch finished"
        );
        observer.on_epoch_end(&stats);

        // ── Callbacks (same order as they observe the epoch) ───────────────
        if let Some(tracker) = reduce_lr.as_mut() {
            if let Some(new_lr) = tracker.observe(val_loss, optimizer.learning_rate) {
                info!(from = optimizer.learning_rate, to = new_lr, "reducing learning rate on plateau");
                optimizer.learning_rate = new_lr;
            }
        }

        if let Some(tracker) = early_stopping.as_mut() {
            if tracker.observe(val_loss, network) {
                info!(epoch, "early stopping: val_loss stopped improving");
                early_stop_fired = true;
                stopped_early = epoch < config.epochs;
                break;
            }
        }
    }

    let best_val_loss = early_stopping.as_ref().and_then(|t| t.best());
    // Weights are only rolled back when the patience actually ran out.
    let mut restored_best_weights = false;
    if early_stop_fired {
        if let Some(best) = early_stopping.as_mut().and_then(|t| t.take_best_weights()) {
            info!(best_val_loss = ?best_val_loss, "restoring best weights");
            *network = best;
            restored_best_weights = true;
        }
    }

    let summary = TrainSummary {
        epochs_run,
        final_train_loss: last_train_loss,
        stopped_early,
        restored_best_weights,
        best_val_loss,
        final_learning_rate: optimizer.learning_rate,
    };
    observer.on_train_end(&summary);

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn validate(network: &Network, inputs: &[Vec<f64>], labels: &[Vec<f64>]) -> Result<(), TrainError> {
    if inputs.is_empty() {
        return Err(TrainError::EmptyTrainingSet);
    }
    if inputs.len() != labels.len() {
        return Err(TrainError::LengthMismatch { inputs: inputs.len(), labels: labels.len() });
    }
    let expected = network.input_size();
    if let Some(bad) = inputs.iter().find(|x| x.len() != expected) {
        return Err(TrainError::InputSize { expected, got: bad.len() });
    }
    Ok(())
}

/// Runs one full epoch of mini-batch SGD over the training data.
/// Returns the mean loss over all samples.
fn run_one_epoch(
    network: &mut Network,
    inputs: &[Vec<f64>],
    labels: &[Vec<f64>],
    optimizer: &Sgd,
    batch_size: usize,
) -> f64 {
    let n = inputs.len();
    let mut total_loss = 0.0;

    // Shuffle sample order each epoch.
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rand::thread_rng());

    for batch in indices.chunks(batch_size) {
        let mut acc_grads: Vec<(Matrix, Matrix)> = network.layers.iter()
            .map(|layer| (
                Matrix::zeros(layer.weights.rows, layer.weights.cols),
                Matrix::zeros(layer.biases.rows, layer.biases.cols),
            ))
            .collect();

        for &idx in batch {
            let input    = &inputs[idx];
            let expected = &labels[idx];

            let output = network.forward(input);
            total_loss += CrossEntropyLoss::loss(&output, expected);

            let mut delta = Matrix::row(CrossEntropyLoss::derivative(&output, expected));

            // Backward pass.
            for i in (0..network.layers.len()).rev() {
                let input_for_layer = if i == 0 {
                    Matrix::row(input.clone())
                } else {
                    network.layers[i - 1].neurons.clone()
                };

                let (w_grad, b_grad) = network.layers[i].compute_gradients(&delta, &input_for_layer);

                if i > 0 {
                    // Propagate δ_i through weights to get ∂L/∂a_{i-1}
                    delta = &b_grad * &network.layers[i].weights.transpose();
                }

                let (w_acc, b_acc) = &mut acc_grads[i];
                *w_acc = std::mem::take(w_acc) + w_grad;
                *b_acc = std::mem::take(b_acc) + b_grad;
            }
        }

        for (layer, (w_acc, b_acc)) in network.layers.iter_mut().zip(&acc_grads) {
            optimizer.step(layer, w_acc, b_acc, batch.len());
        }
    }

    total_loss / n as f64
}

/// Loss and accuracy of a network on a labelled set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    /// Fraction in [0, 1].
    pub accuracy: f64,
}

/// Scores `network` on `inputs` without touching its training caches.
/// An empty set scores 0 on both.
pub fn evaluate(network: &Network, inputs: &[Vec<f64>], labels: &[Vec<f64>]) -> Evaluation {
    Evaluation {
        loss: compute_eval_loss(network, inputs, labels),
        accuracy: compute_accuracy(network, inputs, labels),
    }
}

/// Mean loss over a full dataset without gradient accumulation (eval mode).
fn compute_eval_loss(network: &Network, inputs: &[Vec<f64>], labels: &[Vec<f64>]) -> f64 {
    let n = inputs.len();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = inputs.iter().zip(labels.iter())
        .map(|(input, label)| CrossEntropyLoss::loss(&network.infer(input), label))
        .sum();
    total / n as f64
}

/// Fraction of samples classified correctly (argmax match).
fn compute_accuracy(network: &Network, inputs: &[Vec<f64>], labels: &[Vec<f64>]) -> f64 {
    let n = inputs.len();
    if n == 0 {
        return 0.0;
    }
    let correct = inputs.iter().zip(labels.iter())
        .filter(|(input, label)| argmax(&network.infer(input)) == argmax(label))
        .count();
    correct as f64 / n as f64
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
