//! Error type shared by `Config` loading and domain-type validation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while loading configuration or validating domain types.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("I/O error reading {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error("malformed config at {path}: {error}")]
	Malformed {
		path: PathBuf,
		error: serde_json::Error,
	},

	#[error("missing required config field: {0}")]
	MissingField(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
