use thiserror::Error;

/// Errors surfaced by the scheduler loop.
#[derive(Debug, Error)]
pub enum SchedulerError {
	#[error("lost scheduler leadership")]
	LeaderLost,

	#[error(transparent)]
	Lock(#[from] reachlab_lockd::LockError),

	#[error(transparent)]
	Queue(#[from] reachlab_queue::QueueError),

	#[error(transparent)]
	Registry(#[from] reachlab_registry::RegistryError),

	#[error(transparent)]
	Progress(#[from] reachlab_progress::ProgressError),

	#[error("dispatched job task panicked: {0}")]
	Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
