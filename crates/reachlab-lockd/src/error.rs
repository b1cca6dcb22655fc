use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while acquiring, releasing, or inspecting named locks.
#[derive(Debug, Error)]
pub enum LockError {
	#[error("timed out acquiring lock {name}")]
	Timeout { name: String },

	#[error("I/O error on lock file {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error("lock task panicked: {0}")]
	Join(#[from] tokio::task::JoinError),

	#[error("file watcher error: {0}")]
	Watch(String),
}

/// Result type for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;
