use std::path::PathBuf;

use tracing::info;

use crate::config::{ConfigError, TrainSettings};
use crate::dataset::{load_split, DatasetError, LabeledImages};
use crate::emotion::{EMOTIONS, NUM_CLASSES};
use crate::network::{ModelMetadata, Network};
use crate::optim::sgd::Sgd;
use crate::preprocess::{IMAGE_INPUT_LEN, IMG_CHANNELS, IMG_SIZE};
use crate::progress::{JsonFileStore, ModelInfo, ProgressRecorder, ProgressStore};
use crate::train::loop_fn::{evaluate, train_loop, Evaluation, TrainError};
use crate::train::observer::TrainSummary;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error("cannot save model to {}: {source}", path.display())]
    SaveModel {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a finished session produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub summary: TrainSummary,
    pub model_path: PathBuf,
    pub train_samples: usize,
    pub val_samples: usize,
    /// The saved model scored on the validation split; `None` when it is empty.
    pub validation: Option<Evaluation>,
}

/// Trains on `settings.train_dir`, validates on `settings.val_dir`, records
/// progress to `settings.progress_path` and saves the model.
pub fn run_session(settings: &TrainSettings) -> Result<SessionOutcome, SessionError> {
    run_session_with(settings, JsonFileStore::new(&settings.progress_path))
}

/// Like [`run_session`] but with progress written to `store`.
pub fn run_session_with<S: ProgressStore>(
    settings: &TrainSettings,
    store: S,
) -> Result<SessionOutcome, SessionError> {
    settings.validate()?;

    info!(dir = %settings.train_dir.display(), "loading training images");
    let train = load_split(&settings.train_dir)?;
    info!(dir = %settings.val_dir.display(), "loading validation images");
    let val = load_split(&settings.val_dir)?;
    info!(train = train.len(), val = val.len(), skipped = train.skipped + val.skipped, "dataset ready");

    let mut network = Network::classifier(IMAGE_INPUT_LEN, &settings.hidden_layers, NUM_CLASSES);
    let info = model_info(&network, &train, &val, settings.batch_size);
    info!(params = info.total_params, size_mb = info.model_size_mb, "model built");

    let mut recorder = ProgressRecorder::new(store, settings.epochs, info);
    let mut optimizer = Sgd::new(settings.learning_rate);

    let (val_inputs, val_labels) = if val.is_empty() {
        (None, None)
    } else {
        (Some(val.inputs.as_slice()), Some(val.labels.as_slice()))
    };

    let summary = train_loop(
        &mut network,
        &train.inputs,
        &train.labels,
        val_inputs,
        val_labels,
        &mut optimizer,
        &settings.train_config(),
        &mut recorder,
    )?;

    let validation = (!val.is_empty()).then(|| evaluate(&network, &val.inputs, &val.labels));
    if let Some(eval) = validation {
        info!(val_loss = eval.loss, val_accuracy = eval.accuracy, "final validation");
    }

    network.metadata = Some(ModelMetadata {
        description: Some(format!(
            "dense softmax classifier, hidden layers {:?}, {} epochs",
            settings.hidden_layers, summary.epochs_run
        )),
        input_shape: Some((IMG_SIZE as usize, IMG_SIZE as usize, IMG_CHANNELS)),
        labels: EMOTIONS.to_vec(),
    });
    network
        .save_json(&settings.model_path)
        .map_err(|source| SessionError::SaveModel { path: settings.model_path.clone(), source })?;
    info!(path = %settings.model_path.display(), "model saved");

    Ok(SessionOutcome {
        summary,
        model_path: settings.model_path.clone(),
        train_samples: train.len(),
        val_samples: val.len(),
        validation,
    })
}

fn model_info(network: &Network, train: &LabeledImages, val: &LabeledImages, batch_size: usize) -> ModelInfo {
    let params = network.parameter_count();
    ModelInfo {
        total_params: params,
        trainable_params: params,
        // f64 weights
        model_size_mb: (params * std::mem::size_of::<f64>()) as f64 / (1024.0 * 1024.0),
        train_samples: train.len(),
        val_samples: val.len(),
        batch_size,
        img_size: IMG_SIZE,
        num_classes: NUM_CLASSES,
        emotions: EMOTIONS.to_vec(),
    }
}
