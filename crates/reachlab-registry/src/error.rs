use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the registry manager.
#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("timed out acquiring {0} lock")]
	LockTimeout(&'static str),

	#[error("host {0} is already registered with different attributes")]
	Collision(String),

	#[error("host {0} not found")]
	NotFound(String),

	#[error("run {1} holds no lease on {0}")]
	NoSuchLease(String, String),

	#[error("host {0} still has {1} active lease(s)")]
	LeasesOutstanding(String, usize),

	#[error("no DSCP value available in configured range")]
	Capacity,

	#[error("registry file corrupt at {path}: {reason}")]
	Corruption { path: PathBuf, reason: String },

	#[error("I/O error on {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error(transparent)]
	Lock(#[from] reachlab_lockd::LockError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
