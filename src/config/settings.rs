use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::train::schedule::{EarlyStopping, ReduceLrOnPlateau};
use crate::train::train_config::TrainConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot write settings {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything a training session needs. Missing JSON fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainSettings {
    pub train_dir: PathBuf,
    pub val_dir: PathBuf,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub hidden_layers: Vec<usize>,
    pub progress_path: PathBuf,
    pub model_path: PathBuf,
    /// `0` disables early stopping.
    pub early_stopping_patience: usize,
    /// `0` disables learning-rate reduction.
    pub lr_patience: usize,
    pub lr_factor: f64,
    pub min_learning_rate: f64,
}

impl Default for TrainSettings {
    fn default() -> Self {
        TrainSettings {
            train_dir: PathBuf::from("data/subset/train"),
            val_dir: PathBuf::from("data/subset/test"),
            epochs: 20,
            batch_size: 64,
            learning_rate: 0.01,
            hidden_layers: vec![256, 128],
            progress_path: PathBuf::from("training_progress.json"),
            model_path: PathBuf::from("face_emotion_model.json"),
            early_stopping_patience: 10,
            lr_patience: 5,
            lr_factor: 0.5,
            min_learning_rate: 1e-7,
        }
    }
}

impl TrainSettings {
    pub fn load_json(path: impl AsRef<Path>) -> Result<TrainSettings, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let settings: TrainSettings = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Write { path: path.to_path_buf(), source: e.into() })?;
        std::fs::write(path, text)
            .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| Err(ConfigError::Invalid { field, reason: reason.to_string() });

        if self.epochs == 0 {
            return invalid("epochs", "must be at least 1");
        }
        if self.batch_size == 0 {
            return invalid("batch_size", "must be at least 1");
        }
        if !(self.learning_rate > 0.0) {
            return invalid("learning_rate", "must be positive");
        }
        if !(self.lr_factor > 0.0 && self.lr_factor < 1.0) {
            return invalid("lr_factor", "must be between 0 and 1 (exclusive)");
        }
        if self.hidden_layers.contains(&0) {
            return invalid("hidden_layers", "layer widths must be at least 1");
        }
        Ok(())
    }

    /// The loop configuration these settings describe.
    pub fn train_config(&self) -> TrainConfig {
        let mut config = TrainConfig::new(self.epochs, self.batch_size);
        if self.early_stopping_patience > 0 {
            config.early_stopping = Some(EarlyStopping {
                patience: self.early_stopping_patience,
                ..EarlyStopping::default()
            });
        }
        if self.lr_patience > 0 {
            config.reduce_lr = Some(ReduceLrOnPlateau {
                factor: self.lr_factor,
                patience: self.lr_patience,
                min_lr: self.min_learning_rate,
                ..ReduceLrOnPlateau::default()
            });
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = TrainSettings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.epochs, 20);
        assert_eq!(s.hidden_layers, vec![256, 128]);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "epochs": 3, "hidden_layers": [16] }"#).unwrap();

        let s = TrainSettings::load_json(&path).unwrap();
        assert_eq!(s.epochs, 3);
        assert_eq!(s.hidden_layers, vec![16]);
        assert_eq!(s.batch_size, 64);
        assert_eq!(s.model_path, PathBuf::from("face_emotion_model.json"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = TrainSettings { epochs: 7, learning_rate: 0.05, ..TrainSettings::default() };
        s.save_json(&path).unwrap();
        assert_eq!(TrainSettings::load_json(&path).unwrap(), s);
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            TrainSettings { epochs: 0, ..TrainSettings::default() },
            TrainSettings { batch_size: 0, ..TrainSettings::default() },
            TrainSettings { learning_rate: 0.0, ..TrainSettings::default() },
            TrainSettings { learning_rate: f64::NAN, ..TrainSettings::default() },
            TrainSettings { lr_factor: 1.0, ..TrainSettings::default() },
            TrainSettings { hidden_layers: vec![8, 0], ..TrainSettings::default() },
        ];
        for s in cases {
            assert!(matches!(s.validate(), Err(ConfigError::Invalid { .. })), "{s:?}");
        }
    }

    #[test]
    fn zero_patience_disables_callbacks() {
        let s = TrainSettings { early_stopping_patience: 0, lr_patience: 0, ..TrainSettings::default() };
        let c = s.train_config();
        assert!(c.early_stopping.is_none());
        assert!(c.reduce_lr.is_none());
        assert!(TrainSettings::default().train_config().early_stopping.is_some());
    }

    #[test]
    fn unreadable_file_is_reported() {
        let err = TrainSettings::load_json("/no/such/settings.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
