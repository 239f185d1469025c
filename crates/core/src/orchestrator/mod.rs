//! Tracker rewrite orchestration.
//!
//! One run is strictly sequential: authenticate, list torrents, then for each
//! torrent fetch its trackers and rewrite the matching ones. Loop mode repeats
//! the run on a fixed interval.

mod config;
mod runner;
mod schedule;
mod types;

pub use config::{parse_interval_secs, ScheduleConfig, DEFAULT_INTERVAL_SECS};
pub use runner::TrackerRewriter;
pub use schedule::{LoopDriver, Sleeper, TokioSleeper};
pub use types::{
    RunError, RunSummary, TrackerChange, EXIT_CONFIG_ERROR, EXIT_RUN_ERROR, EXIT_SUCCESS,
};
