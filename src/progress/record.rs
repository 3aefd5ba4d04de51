use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::emotion::EmotionLabel;

/// Learning rate recorded when an epoch reports none.
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    #[default]
    Training,
    Completed,
}

/// Parallel per-epoch sequences. All six always have the same length;
/// entry `i` of each belongs to `epoch[i]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct History {
    pub epoch: Vec<usize>,
    #[serde(deserialize_with = "nan_for_null_seq")]
    pub accuracy: Vec<f64>,
    #[serde(deserialize_with = "nan_for_null_seq")]
    pub loss: Vec<f64>,
    #[serde(deserialize_with = "nan_for_null_seq")]
    pub val_accuracy: Vec<f64>,
    #[serde(deserialize_with = "nan_for_null_seq")]
    pub val_loss: Vec<f64>,
    #[serde(deserialize_with = "nan_for_null_seq")]
    pub learning_rate: Vec<f64>,
}

// serde_json writes NaN and ±inf as `null`; read those back as NaN so a
// diverged epoch does not make the whole document unreadable.
fn nan_for_null<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
}

fn nan_for_null_seq<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
    let values = Vec::<Option<f64>>::deserialize(d)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

impl History {
    pub fn push(&mut self, epoch: usize, metrics: &EpochMetrics) {
        self.epoch.push(epoch);
        self.accuracy.push(metrics.accuracy);
        self.loss.push(metrics.loss);
        self.val_accuracy.push(metrics.val_accuracy);
        self.val_loss.push(metrics.val_loss);
        self.learning_rate.push(metrics.learning_rate.unwrap_or(DEFAULT_LEARNING_RATE));
    }

    /// Length of the `epoch` sequence.
    pub fn len(&self) -> usize {
        self.epoch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epoch.is_empty()
    }

    /// Readers polling a document written by someone else should check this
    /// before zipping the sequences together.
    pub fn is_consistent(&self) -> bool {
        let n = self.epoch.len();
        [
            self.accuracy.len(),
            self.loss.len(),
            self.val_accuracy.len(),
            self.val_loss.len(),
            self.learning_rate.len(),
        ]
        .iter()
        .all(|&len| len == n)
    }
}

/// Static description of the run, written once at `begin`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    pub total_params: usize,
    pub trainable_params: usize,
    pub model_size_mb: f64,
    pub train_samples: usize,
    pub val_samples: usize,
    pub batch_size: usize,
    pub img_size: u32,
    pub num_classes: usize,
    pub emotions: Vec<EmotionLabel>,
}

/// The four core metrics of the most recent epoch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatestMetrics {
    pub epoch: usize,
    #[serde(deserialize_with = "nan_for_null")]
    pub accuracy: f64,
    #[serde(deserialize_with = "nan_for_null")]
    pub loss: f64,
    #[serde(deserialize_with = "nan_for_null")]
    pub val_accuracy: f64,
    #[serde(deserialize_with = "nan_for_null")]
    pub val_loss: f64,
}

/// Metrics reported at the end of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EpochMetrics {
    pub accuracy: f64,
    pub loss: f64,
    pub val_accuracy: f64,
    pub val_loss: f64,
    /// `None` is stored as [`DEFAULT_LEARNING_RATE`].
    pub learning_rate: Option<f64>,
}

/// The persisted progress document.
///
/// Every field falls back to its default when absent so that a reader can
/// still parse a document that is partial or from an older writer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    pub status: TrainingStatus,
    pub start_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
    pub total_epochs: usize,
    pub current_epoch: usize,
    pub epochs_completed: usize,
    pub history: History,
    pub model_info: ModelInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_metrics: Option<LatestMetrics>,
    /// Whole seconds; `null` until the first epoch has finished.
    pub estimated_time_remaining: Option<u64>,
    /// Whole seconds since `start_time`.
    pub elapsed_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_training_time: Option<u64>,
}

impl ProgressRecord {
    /// A fresh record for a run that has just started.
    pub fn started(start_time: NaiveDateTime, total_epochs: usize, model_info: ModelInfo) -> ProgressRecord {
        ProgressRecord {
            status: TrainingStatus::Training,
            start_time: Some(start_time),
            total_epochs,
            model_info,
            ..ProgressRecord::default()
        }
    }

    /// Fraction of `total_epochs` finished, in [0, 1].
    pub fn fraction_complete(&self) -> f64 {
        if self.total_epochs == 0 {
            return if self.status == TrainingStatus::Completed { 1.0 } else { 0.0 };
        }
        (self.epochs_completed as f64 / self.total_epochs as f64).min(1.0)
    }

    /// One-line human summary, used by the CLI and the monitor.
    pub fn summary(&self) -> String {
        let state = match self.status {
            TrainingStatus::Training  => "training",
            TrainingStatus::Completed => "completed",
        };
        let mut line = format!(
            "{} - epoch {}/{} ({:.0}%), elapsed {}s",
            state,
            self.current_epoch,
            self.total_epochs,
            self.fraction_complete() * 100.0,
            self.elapsed_time,
        );
        if let Some(m) = &self.latest_metrics {
            line.push_str(&format!(
                ", acc {:.4} loss {:.4} val_acc {:.4} val_loss {:.4}",
                m.accuracy, m.loss, m.val_accuracy, m.val_loss
            ));
        }
        match (self.status, self.estimated_time_remaining, self.total_training_time) {
            (TrainingStatus::Completed, _, Some(total)) => line.push_str(&format!(", total {}s", total)),
            (TrainingStatus::Training, Some(eta), _) => line.push_str(&format!(", eta {}s", eta)),
            _ => {}
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_serializes_expected_keys() {
        let start = NaiveDateTime::parse_from_str("2026-01-02 03:04:05", "%Y-%m-%d %H:%M:%S").unwrap();
        let record = ProgressRecord::started(start, 20, ModelInfo::default());
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["status"], "training");
        assert_eq!(obj["start_time"], "2026-01-02T03:04:05");
        assert!(obj["estimated_time_remaining"].is_null());
        assert_eq!(obj["elapsed_time"], 0);
        for key in ["epoch", "accuracy", "loss", "val_accuracy", "val_loss", "learning_rate"] {
            assert_eq!(obj["history"][key], serde_json::json!([]), "history.{key}");
        }
        // Only present once completed / after the first epoch.
        assert!(!obj.contains_key("end_time"));
        assert!(!obj.contains_key("total_training_time"));
        assert!(!obj.contains_key("latest_metrics"));
    }

    #[test]
    fn partial_document_parses_with_defaults() {
        let record: ProgressRecord =
            serde_json::from_str(r#"{"status":"completed","current_epoch":3,"history":{"epoch":[1]}}"#).unwrap();
        assert_eq!(record.status, TrainingStatus::Completed);
        assert_eq!(record.current_epoch, 3);
        assert_eq!(record.total_epochs, 0);
        assert!(!record.history.is_consistent());
    }

    #[test]
    fn history_push_defaults_learning_rate() {
        let mut h = History::default();
        h.push(1, &EpochMetrics { accuracy: 0.5, ..EpochMetrics::default() });
        h.push(2, &EpochMetrics { learning_rate: Some(0.0005), ..EpochMetrics::default() });
        assert!(h.is_consistent());
        assert_eq!(h.learning_rate, vec![DEFAULT_LEARNING_RATE, 0.0005]);
    }

    #[test]
    fn null_metrics_read_back_as_nan() {
        let text = r#"{
            "history": {"epoch":[1,2],"accuracy":[0.2,0.3],"loss":[null,1.5],
                        "val_accuracy":[0.1,0.2],"val_loss":[null,null],"learning_rate":[0.01,0.01]},
            "latest_metrics": {"epoch":2,"accuracy":0.3,"loss":1.5,"val_accuracy":0.2,"val_loss":null}
        }"#;
        let record: ProgressRecord = serde_json::from_str(text).unwrap();
        assert!(record.history.is_consistent());
        assert!(record.history.loss[0].is_nan());
        assert_eq!(record.history.loss[1], 1.5);
        assert!(record.history.val_loss.iter().all(|v| v.is_nan()));
        assert!(record.latest_metrics.unwrap().val_loss.is_nan());
    }
}
