pub mod record;
pub mod store;
pub mod clock;
pub mod recorder;

pub use record::{
    EpochMetrics, History, LatestMetrics, ModelInfo, ProgressRecord, TrainingStatus,
    DEFAULT_LEARNING_RATE,
};
pub use store::{JsonFileStore, LoadKind, LoadOutcome, MemoryStore, ProgressIoError, ProgressStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use recorder::{Phase, ProgressRecorder, TransitionError, TransitionReport};
