//! In-memory authoritative progress tracking, mirrored to per-run files.
//!
//! [`ProgressTracker`] owns a single mutex-guarded `run_id -> ProgressRecord`
//! map. Every mutation also rewrites that run's `progress.json` atomically
//! and appends a line to `timing.log`/`audit.log`, so a front-end streaming
//! endpoint backed by a different process can tail the files without ever
//! taking the in-process lock.

mod error;
mod mirror;
mod tracker;

pub use error::ProgressError;
pub use tracker::ProgressTracker;

pub type Result<T> = std::result::Result<T, ProgressError>;

#[cfg(test)]
mod tests;
