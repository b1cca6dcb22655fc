use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use rustix::fd::AsFd;
use rustix::fs::{flock, FlockOperation};
use tokio::sync::Mutex;

use crate::error::{LockError, Result};
use crate::guard::LockGuard;

/// Named, advisory, cross-process file locks under a shared directory.
///
/// Each name maps to one file `<lock_dir>/<name>.lock`. Acquisition takes
/// an OS `flock(2)` exclusive lock on that file via a blocking syscall
/// dispatched through `tokio::task::spawn_blocking`, so callers can `.await`
/// acquisition without stalling the runtime.
pub struct LockManager {
	lock_dir: PathBuf,
	retry_interval: Duration,
	held: Mutex<HashMap<String, File>>,
}

impl LockManager {
	pub fn new(lock_dir: impl Into<PathBuf>, retry_interval: Duration) -> Self {
		Self {
			lock_dir: lock_dir.into(),
			retry_interval,
			held: Mutex::new(HashMap::new()),
		}
	}

	pub fn lock_dir(&self) -> &Path {
		&self.lock_dir
	}

	fn lock_path(&self, name: &str) -> PathBuf {
		self.lock_dir.join(format!("{name}.lock"))
	}

	/// Attempts to acquire `name` within `timeout`. Returns `Ok(false)` on a
	/// plain timeout rather than an error, matching the original service's
	/// boolean-returning API.
	pub async fn acquire(&self, name: &str, timeout: Duration) -> Result<bool> {
		match self.try_acquire_file(name, timeout).await? {
			Some(file) => {
				self.held.lock().await.insert(name.to_string(), file);
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Releases `name`. Idempotent: returns `Ok(false)` if it wasn't held by
	/// this process.
	pub async fn release(&self, name: &str) -> Result<bool> {
		let removed = self.held.lock().await.remove(name);
		match removed {
			Some(file) => {
				drop(file);
				let _ = fs::remove_file(self.lock_path(name));
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Acquires `name` as a scoped guard, for callers that want RAII release
	/// instead of the named acquire/release pair.
	pub async fn acquire_guard(&self, name: &str, timeout: Duration) -> Result<LockGuard> {
		match self.try_acquire_file(name, timeout).await? {
			Some(file) => Ok(LockGuard {
				name: name.to_string(),
				path: self.lock_path(name),
				_file: file,
			}),
			None => Err(LockError::Timeout {
				name: name.to_string(),
			}),
		}
	}

	async fn try_acquire_file(&self, name: &str, timeout: Duration) -> Result<Option<File>> {
		let path = self.lock_path(name);
		let retry_interval = self.retry_interval;
		tokio::task::spawn_blocking(move || acquire_blocking(&path, timeout, retry_interval))
			.await?
	}

	/// Removes lock files older than `max_age` with no live holder, returning
	/// the names reclaimed. A lock is "stale" only if we can immediately take
	/// it ourselves; age alone never overrides an actual held lock.
	pub async fn cleanup_stale(&self, max_age: Duration) -> Result<Vec<String>> {
		let lock_dir = self.lock_dir.clone();
		tokio::task::spawn_blocking(move || cleanup_stale_blocking(&lock_dir, max_age)).await?
	}
}

fn acquire_blocking(path: &Path, timeout: Duration, retry_interval: Duration) -> Result<Option<File>> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).map_err(|error| LockError::Io {
			path: path.to_path_buf(),
			error,
		})?;
	}

	let deadline = Instant::now() + timeout;
	loop {
		let file = OpenOptions::new()
			.create(true)
			.write(true)
			.open(path)
			.map_err(|error| LockError::Io {
				path: path.to_path_buf(),
				error,
			})?;

		match flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive) {
			Ok(()) => {
				write_holder_info(&file, path)?;
				return Ok(Some(file));
			}
			Err(rustix::io::Errno::WOULDBLOCK) | Err(rustix::io::Errno::AGAIN) => {
				if Instant::now() >= deadline {
					return Ok(None);
				}
				std::thread::sleep(retry_interval.min(deadline - Instant::now()));
			}
			Err(errno) => {
				return Err(LockError::Io {
					path: path.to_path_buf(),
					error: std::io::Error::from_raw_os_error(errno.raw_os_error()),
				})
			}
		}
	}
}

fn write_holder_info(mut file: &File, path: &Path) -> Result<()> {
	use std::io::Seek;

	file.set_len(0).map_err(|error| LockError::Io {
		path: path.to_path_buf(),
		error,
	})?;
	file.rewind().map_err(|error| LockError::Io {
		path: path.to_path_buf(),
		error,
	})?;
	let now = chrono_like_timestamp();
	writeln!(file, "{}\n{}", std::process::id(), now).map_err(|error| LockError::Io {
		path: path.to_path_buf(),
		error,
	})
}

fn chrono_like_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(SystemTime::UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

fn cleanup_stale_blocking(lock_dir: &Path, max_age: Duration) -> Result<Vec<String>> {
	let mut reclaimed = Vec::new();
	let entries = match fs::read_dir(lock_dir) {
		Ok(entries) => entries,
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(reclaimed),
		Err(error) => {
			return Err(LockError::Io {
				path: lock_dir.to_path_buf(),
				error,
			})
		}
	};

	for entry in entries {
		let entry = entry.map_err(|error| LockError::Io {
			path: lock_dir.to_path_buf(),
			error,
		})?;
		let path = entry.path();
		if path.extension().and_then(|e| e.to_str()) != Some("lock") {
			continue;
		}

		let metadata = match entry.metadata() {
			Ok(m) => m,
			Err(_) => continue,
		};
		let age = metadata
			.modified()
			.ok()
			.and_then(|m| m.elapsed().ok())
			.unwrap_or_default();
		if age < max_age {
			continue;
		}

		let file = match OpenOptions::new().write(true).open(&path) {
			Ok(f) => f,
			Err(_) => continue,
		};
		if flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive).is_ok() {
			let name = path
				.file_stem()
				.and_then(|s| s.to_str())
				.unwrap_or_default()
				.to_string();
			drop(file);
			let _ = fs::remove_file(&path);
			reclaimed.push(name);
		}
	}

	Ok(reclaimed)
}
