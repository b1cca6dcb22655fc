use std::fs::File;
use std::path::PathBuf;

/// A held named lock, released when dropped.
///
/// Releasing is implicit: the `flock` is tied to the open file descriptor,
/// so closing it (which `File`'s `Drop` does for us) releases the lock.
/// Callers must not hold a `LockGuard` across an `.await` without the
/// runtime making progress underneath it — see the `await_holding_lock`
/// workspace lint.
#[must_use = "the lock is released as soon as this guard is dropped"]
pub struct LockGuard {
	pub(crate) name: String,
	pub(crate) path: PathBuf,
	pub(crate) _file: File,
}

impl LockGuard {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn path(&self) -> &std::path::Path {
		&self.path
	}
}

impl Drop for LockGuard {
	fn drop(&mut self) {
		tracing::debug!(name = %self.name, "releasing lock guard");
		let _ = std::fs::remove_file(&self.path);
	}
}
