//! File-backed FIFO job queue.
//!
//! [`QueueService`] owns `queue.json` and `current.json` under
//! `Config::queue_dir`, serialized through a single named lock so multiple
//! `reachlab-cli` processes sharing the same directory never interleave
//! writes.

mod error;
mod persist;
mod queue;
mod state;

pub use error::QueueError;
pub use queue::QueueService;
pub use state::{CancelMarker, QueueState, QueuedJob, RunMeta, RunningState};

pub type Result<T> = std::result::Result<T, QueueError>;

#[cfg(test)]
mod tests;
