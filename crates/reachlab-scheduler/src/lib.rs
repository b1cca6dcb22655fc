//! Leader-elected dispatch loop.
//!
//! Exactly one process holds the `scheduler_leader` named lock at a time
//! ([`Scheduler::run`]); the holder pops jobs off the [`reachlab_queue`]
//! queue and hands them to a bounded [`tokio::task::JoinSet`], respecting
//! the quick-concurrency cap and the quick-before-detailed priority rule
//! from `spec.md` §4.E. Everything else (locks, leases, the test itself)
//! is the [`reachlab_executor::JobExecutor`]'s job.

mod error;
mod inflight;
mod scheduler;

pub use error::SchedulerError;
pub use scheduler::{Scheduler, TickOutcome};

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[cfg(test)]
mod tests;
