use std::fmt;
use std::time::Instant;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::progress::clock::{Clock, SystemClock};
use crate::progress::record::{EpochMetrics, LatestMetrics, ModelInfo, ProgressRecord, TrainingStatus};
use crate::progress::store::{LoadKind, LoadOutcome, ProgressStore};

/// Where the recorder is in a run's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Training,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle      => f.write_str("idle"),
            Phase::Training  => f.write_str("training"),
            Phase::Completed => f.write_str("completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition { phase: Phase, action: &'static str },
}

/// What a transition did with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionReport {
    /// How the prior record was obtained; `None` for `begin`, which never reads.
    pub loaded: Option<LoadKind>,
    /// Whether the updated record reached the store.
    pub persisted: bool,
}

/// Maintains the progress document for one training run.
///
/// Each transition re-reads the document from the store, mutates it and
/// writes it back whole. A missing or unreadable document never fails a
/// transition: the step starts over from a fresh record carrying only the
/// static run fields, and the report says so. Write failures are logged
/// and reported, never returned as errors.
pub struct ProgressRecorder<S, C = SystemClock> {
    store: S,
    clock: C,
    total_epochs: usize,
    model_info: ModelInfo,
    phase: Phase,
    started: Option<(Instant, NaiveDateTime)>,
}

impl<S: ProgressStore> ProgressRecorder<S, SystemClock> {
    pub fn new(store: S, total_epochs: usize, model_info: ModelInfo) -> Self {
        ProgressRecorder::with_clock(store, SystemClock, total_epochs, model_info)
    }
}

impl<S: ProgressStore, C: Clock> ProgressRecorder<S, C> {
    pub fn with_clock(store: S, clock: C, total_epochs: usize, model_info: ModelInfo) -> Self {
        ProgressRecorder {
            store,
            clock,
            total_epochs,
            model_info,
            phase: Phase::Idle,
            started: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Idle → Training. Writes a fresh record; does not read.
    pub fn begin(&mut self) -> Result<TransitionReport, TransitionError> {
        self.require(Phase::Idle, "begin training")?;

        let started = (self.clock.now(), self.clock.wall_time());
        self.started = Some(started);
        self.phase = Phase::Training;

        let record = ProgressRecord::started(started.1, self.total_epochs, self.model_info.clone());
        let persisted = self.persist(&record);
        Ok(TransitionReport { loaded: None, persisted })
    }

    /// Training → Training at the start of `epoch` (1-based).
    pub fn epoch_begin(&mut self, epoch: usize) -> Result<TransitionReport, TransitionError> {
        self.require(Phase::Training, "begin an epoch")?;

        let (mut record, loaded) = self.load_for_update();
        record.current_epoch = epoch;
        record.status = TrainingStatus::Training;

        let persisted = self.persist(&record);
        Ok(TransitionReport { loaded: Some(loaded), persisted })
    }

    /// Training → Training once `epoch` (1-based) has finished.
    pub fn epoch_end(&mut self, epoch: usize, metrics: &EpochMetrics) -> Result<TransitionReport, TransitionError> {
        self.require(Phase::Training, "end an epoch")?;

        let (mut record, loaded) = self.load_for_update();
        record.history.push(epoch, metrics);
        record.epochs_completed = epoch;
        record.current_epoch = epoch;

        let elapsed = self.elapsed_secs();
        record.elapsed_time = elapsed as u64;
        if record.epochs_completed >= 1 {
            let per_epoch = elapsed / record.epochs_completed as f64;
            let remaining = self.total_epochs.saturating_sub(record.epochs_completed);
            record.estimated_time_remaining = Some((per_epoch * remaining as f64) as u64);
        }

        record.latest_metrics = Some(LatestMetrics {
            epoch,
            accuracy: metrics.accuracy,
            loss: metrics.loss,
            val_accuracy: metrics.val_accuracy,
            val_loss: metrics.val_loss,
        });

        let persisted = self.persist(&record);
        Ok(TransitionReport { loaded: Some(loaded), persisted })
    }

    /// Training → Completed. Terminal; every later transition is rejected.
    pub fn complete(&mut self) -> Result<TransitionReport, TransitionError> {
        self.require(Phase::Training, "complete training")?;

        let (mut record, loaded) = self.load_for_update();
        record.status = TrainingStatus::Completed;
        record.end_time = Some(self.clock.wall_time());
        let total = self.elapsed_secs() as u64;
        record.total_training_time = Some(total);
        record.elapsed_time = total;

        self.phase = Phase::Completed;
        let persisted = self.persist(&record);
        Ok(TransitionReport { loaded: Some(loaded), persisted })
    }

    fn require(&self, expected: Phase, action: &'static str) -> Result<(), TransitionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { phase: self.phase, action })
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .map(|(instant, _)| self.clock.now().saturating_duration_since(instant).as_secs_f64())
            .unwrap_or(0.0)
    }

    /// A record holding only what the recorder knows on its own.
    fn reset_record(&self) -> ProgressRecord {
        let start = self.started.map(|(_, wall)| wall).unwrap_or_else(|| self.clock.wall_time());
        ProgressRecord::started(start, self.total_epochs, self.model_info.clone())
    }

    fn load_for_update(&self) -> (ProgressRecord, LoadKind) {
        match self.store.load() {
            LoadOutcome::Loaded(record) => (record, LoadKind::Loaded),
            LoadOutcome::Missing => {
                warn!("progress record missing; starting this step from an empty history");
                (self.reset_record(), LoadKind::Missing)
            }
            LoadOutcome::Corrupt(e) => {
                warn!(error = %e, "progress record unreadable; starting this step from an empty history");
                (self.reset_record(), LoadKind::Corrupt)
            }
        }
    }

    fn persist(&mut self, record: &ProgressRecord) -> bool {
        match self.store.save(record) {
            Ok(()) => {
                debug!(status = ?record.status, epoch = record.current_epoch, "progress saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "could not save progress record");
                false
            }
        }
    }
}
