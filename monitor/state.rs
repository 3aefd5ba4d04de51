use std::sync::{Arc, Mutex};

use emotion_net::progress::{JsonFileStore, LoadOutcome, ProgressRecord, ProgressStore};
use tracing::warn;

pub type SharedState = Arc<Mutex<MonitorState>>;

/// What a request gets to see of the progress file.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Parsed just now.
    Fresh(ProgressRecord),
    /// The file is unreadable right now (usually mid-write); this is the
    /// last version that parsed.
    Stale(ProgressRecord),
    /// No progress file: nothing has been trained yet.
    Idle,
    /// The file is unreadable and nothing good has been seen yet.
    Unavailable(String),
}

/// The progress file plus the last document that parsed.
#[derive(Debug)]
pub struct MonitorState {
    pub store: JsonFileStore,
    last_good: Option<ProgressRecord>,
}

impl MonitorState {
    pub fn new(store: JsonFileStore) -> MonitorState {
        MonitorState { store, last_good: None }
    }

    /// Re-reads the file on every call.
    pub fn snapshot(&mut self) -> Snapshot {
        match self.store.load() {
            LoadOutcome::Loaded(record) => {
                self.last_good = Some(record.clone());
                Snapshot::Fresh(record)
            }
            LoadOutcome::Missing => {
                self.last_good = None;
                Snapshot::Idle
            }
            LoadOutcome::Corrupt(e) => {
                warn!(error = %e, "progress file unreadable");
                match &self.last_good {
                    Some(record) => Snapshot::Stale(record.clone()),
                    None => Snapshot::Unavailable(e.to_string()),
                }
            }
        }
    }
}
