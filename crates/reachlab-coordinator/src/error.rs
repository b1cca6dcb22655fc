use thiserror::Error;

use reachlab_lockd::LockError;
use reachlab_progress::ProgressError;
use reachlab_queue::QueueError;
use reachlab_registry::RegistryError;

/// Errors surfaced at the submit/cancel/progress seam.
#[derive(Debug, Error)]
pub enum CoordinatorError {
	/// `spec.md` P7/S4: a user may have at most one non-terminal job at a
	/// time, counting both the queued table and the running table.
	#[error("user {0} already has a queued or running job")]
	UserHasActiveJob(String),

	#[error("job {0} not found")]
	NotFound(String),

	#[error(transparent)]
	Queue(#[from] QueueError),

	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error(transparent)]
	Progress(#[from] ProgressError),

	#[error(transparent)]
	Lock(#[from] LockError),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
