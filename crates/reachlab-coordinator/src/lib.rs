//! Submit/cancel/progress facade over the queue, registry, progress
//! tracker, and scheduler crates.
//!
//! `Coordinator` is the thing a front end actually holds: it generates
//! `run_id`s, enforces the one-job-per-user rule across both the pending
//! queue and the running table, and exposes the scheduler's run loop for
//! its caller to drive on its own task.

mod coordinator;
mod error;

pub use coordinator::{Coordinator, MaintenanceReport};
pub use error::CoordinatorError;

pub type Result<T> = std::result::Result<T, CoordinatorError>;

#[cfg(test)]
mod tests;
