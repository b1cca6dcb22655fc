//! Per-job orchestration.
//!
//! [`JobExecutor`] is the single entrypoint the scheduler hands a popped
//! [`reachlab_core::Job`] to. It distinguishes the quick and detailed
//! executor flows (`spec.md` §4.F.1/§4.F.2) and is responsible for
//! rollback on any failure path — the registry and queue crates only
//! provide the primitives (leases, locks, cancellation markers); the
//! executor owns the acquire-order bookkeeping needed to unwind them.

mod detailed;
mod error;
mod executor;
mod plan;
mod quick;

pub use error::ExecutorError;
pub use executor::JobExecutor;
pub use plan::{HostSpec, JobPlan};

pub type Result<T> = std::result::Result<T, ExecutorError>;

#[cfg(test)]
mod tests;
