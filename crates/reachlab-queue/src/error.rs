use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
	#[error("timed out acquiring the queue lock")]
	LockTimeout,

	#[error("run {0} not found in the queue")]
	NotFound(String),

	#[error("queue file corrupt at {path}: {reason}")]
	Corruption { path: PathBuf, reason: String },

	#[error("I/O error on {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error(transparent)]
	Lock(#[from] reachlab_lockd::LockError),
}

pub type Result<T> = std::result::Result<T, QueueError>;
