use thiserror::Error;

/// Errors surfaced by the job executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
	#[error("timed out acquiring a required lock")]
	LockTimeout,

	#[error(transparent)]
	Registry(#[from] reachlab_registry::RegistryError),

	#[error(transparent)]
	Queue(#[from] reachlab_queue::QueueError),

	#[error(transparent)]
	Progress(#[from] reachlab_progress::ProgressError),

	#[error("no DSCP value available for this job")]
	Capacity,

	#[error("run was cancelled")]
	Cancelled,

	#[error("job params did not match the expected shape: {0}")]
	InvalidParams(String),

	#[error("test runner failed: {0}")]
	TestRunner(String),

	#[error("host backend operation failed: {0}")]
	HostBackend(String),
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
