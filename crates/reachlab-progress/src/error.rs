use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the progress tracker.
#[derive(Debug, Error)]
pub enum ProgressError {
	#[error("no progress record for run {0}")]
	NotFound(String),

	#[error("I/O error on {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},
}

pub type Result<T> = std::result::Result<T, ProgressError>;
