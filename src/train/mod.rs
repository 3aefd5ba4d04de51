pub mod epoch_stats;
pub mod train_config;
pub mod schedule;
pub mod observer;
pub mod loop_fn;
pub mod session;

pub use epoch_stats::EpochStats;
pub use train_config::TrainConfig;
pub use schedule::{EarlyStopping, EarlyStoppingTracker, PlateauTracker, ReduceLrOnPlateau};
pub use observer::{HistoryObserver, NoopObserver, TrainSummary, TrainingObserver};
pub use loop_fn::{argmax, evaluate, train_loop, Evaluation, TrainError};
pub use session::{run_session, run_session_with, SessionError, SessionOutcome};
