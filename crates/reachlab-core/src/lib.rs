//! Domain types and shared collaborator traits for the reachlab scheduler.
//!
//! This crate has no I/O of its own. It defines the data that the other
//! `reachlab-*` crates persist and pass around, the `Config` that tunes
//! their behavior, and the narrow capability traits (`TestRunner`,
//! `HostBackend`) that the executor invokes without knowing how a test is
//! actually run.

mod config;
mod error;
mod job;
mod progress;
mod traits;

pub use config::Config;
pub use error::CoreError;
pub use job::{Job, JobStatus, JobType};
pub use progress::{PhaseEntry, ProgressRecord};
pub use traits::{CancelToken, Counters, HostBackend, TestOutcome, TestRunner};

/// Identifier for a single test run, assigned at submission time.
pub type RunId = String;
