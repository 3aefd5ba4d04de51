use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::progress::record::ProgressRecord;

#[derive(Debug, thiserror::Error)]
pub enum ProgressIoError {
    #[error("cannot read progress from {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("progress in {location} is not valid JSON: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write progress to {location}: {source}")]
    Write {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot encode progress record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result of reading the persisted record.
///
/// Keeps "nothing has been written yet" apart from "something was there but
/// could not be used", which matters to tests and to pollers.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(ProgressRecord),
    Missing,
    Corrupt(ProgressIoError),
}

impl LoadOutcome {
    pub fn kind(&self) -> LoadKind {
        match self {
            LoadOutcome::Loaded(_)  => LoadKind::Loaded,
            LoadOutcome::Missing    => LoadKind::Missing,
            LoadOutcome::Corrupt(_) => LoadKind::Corrupt,
        }
    }

    pub fn record(self) -> Option<ProgressRecord> {
        match self {
            LoadOutcome::Loaded(record) => Some(record),
            _ => None,
        }
    }
}

/// Payload-free tag of a [`LoadOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Loaded,
    Missing,
    Corrupt,
}

/// Where the progress document lives between transitions.
///
/// Every `save` replaces the whole document; every `load` re-reads it.
/// Nothing is cached between calls.
pub trait ProgressStore {
    fn load(&self) -> LoadOutcome;
    fn save(&mut self, record: &ProgressRecord) -> Result<(), ProgressIoError>;
}

impl<S: ProgressStore + ?Sized> ProgressStore for &mut S {
    fn load(&self) -> LoadOutcome {
        (**self).load()
    }

    fn save(&mut self, record: &ProgressRecord) -> Result<(), ProgressIoError> {
        (**self).save(record)
    }
}

/// Pretty-printed JSON file, overwritten in place on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> JsonFileStore {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> LoadOutcome {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadOutcome::Missing,
            Err(source) => {
                return LoadOutcome::Corrupt(ProgressIoError::Read { location: self.location(), source })
            }
        };
        parse(&text, self.location())
    }

    fn save(&mut self, record: &ProgressRecord) -> Result<(), ProgressIoError> {
        let write_err = |source: io::Error| ProgressIoError::Write { location: self.location(), source };

        let file = std::fs::File::create(&self.path).map_err(write_err)?;
        let mut writer = io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record).map_err(ProgressIoError::Encode)?;
        writer.flush().map_err(write_err)
    }
}

/// Keeps the serialized text in memory so that tests exercise the same
/// encode/parse path as the file store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    text: Option<String>,
    /// When set, every `save` fails.
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Replaces the stored document with arbitrary text, e.g. a torn write.
    pub fn set_raw(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn clear(&mut self) {
        self.text = None;
    }

    pub fn raw(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> LoadOutcome {
        match &self.text {
            None => LoadOutcome::Missing,
            Some(text) => parse(text, "memory".to_owned()),
        }
    }

    fn save(&mut self, record: &ProgressRecord) -> Result<(), ProgressIoError> {
        if self.fail_writes {
            return Err(ProgressIoError::Write {
                location: "memory".to_owned(),
                source: io::Error::new(io::ErrorKind::Other, "writes disabled"),
            });
        }
        self.text = Some(serde_json::to_string_pretty(record).map_err(ProgressIoError::Encode)?);
        Ok(())
    }
}

fn parse(text: &str, location: String) -> LoadOutcome {
    match serde_json::from_str(text) {
        Ok(record) => LoadOutcome::Loaded(record),
        Err(source) => LoadOutcome::Corrupt(ProgressIoError::Parse { location, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::record::{EpochMetrics, TrainingStatus};

    fn sample() -> ProgressRecord {
        let mut r = ProgressRecord::default();
        r.total_epochs = 5;
        r.current_epoch = 2;
        r.epochs_completed = 2;
        r.history.push(1, &EpochMetrics { accuracy: 0.2, loss: 1.9, val_accuracy: 0.18, val_loss: 2.0, learning_rate: None });
        r.history.push(2, &EpochMetrics { accuracy: 0.3, loss: 1.7, val_accuracy: 0.25, val_loss: 1.8, learning_rate: Some(0.01) });
        r.estimated_time_remaining = Some(12);
        r
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("progress.json"));
        assert!(matches!(store.load(), LoadOutcome::Missing));

        let record = sample();
        store.save(&record).unwrap();
        assert_eq!(store.load().record(), Some(record));
    }

    #[test]
    fn file_store_overwrites_completely() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("progress.json"));
        store.save(&sample()).unwrap();

        let mut done = ProgressRecord::default();
        done.status = TrainingStatus::Completed;
        store.save(&done).unwrap();
        assert_eq!(store.load().record(), Some(done));
    }

    #[test]
    fn truncated_file_is_corrupt_not_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{\"status\": \"train").unwrap();
        let outcome = JsonFileStore::new(&path).load();
        assert_eq!(outcome.kind(), LoadKind::Corrupt);
        assert!(matches!(outcome, LoadOutcome::Corrupt(ProgressIoError::Parse { .. })));
    }

    #[test]
    fn memory_store_distinguishes_missing_and_corrupt() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load().kind(), LoadKind::Missing);
        store.set_raw("not json");
        assert_eq!(store.load().kind(), LoadKind::Corrupt);
        store.save(&sample()).unwrap();
        assert_eq!(store.load().kind(), LoadKind::Loaded);
    }

    #[test]
    fn memory_store_can_refuse_writes() {
        let mut store = MemoryStore { fail_writes: true, ..MemoryStore::default() };
        assert!(matches!(store.save(&sample()), Err(ProgressIoError::Write { .. })));
        assert!(store.raw().is_none());
    }
}
