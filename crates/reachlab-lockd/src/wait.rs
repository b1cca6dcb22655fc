use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{LockError, Result};
use crate::manager::LockManager;

/// Waits for a named lock to become available without polling in a tight
/// loop: installs a native file watcher on the lock directory and wakes as
/// soon as the lock file is removed or unlocked, falling back to bounded
/// polling if the watcher can't be installed.
pub async fn wait_for_free(manager: &LockManager, name: &str, timeout: Duration) -> Result<bool> {
	let lock_dir = manager.lock_dir().to_path_buf();
	let name = name.to_string();

	let outcome = tokio::task::spawn_blocking(move || wait_for_free_blocking(&lock_dir, &name, timeout)).await?;
	outcome
}

fn wait_for_free_blocking(lock_dir: &Path, name: &str, timeout: Duration) -> Result<bool> {
	let target = lock_dir.join(format!("{name}.lock"));
	if !target.exists() {
		return Ok(true);
	}

	match install_watcher(lock_dir) {
		Ok((rx, _watcher)) => wait_on_channel(&rx, &target, timeout),
		Err(_) => poll_until_free(&target, timeout),
	}
}

fn install_watcher(dir: &Path) -> Result<(Receiver<notify::Result<Event>>, RecommendedWatcher)> {
	let (tx, rx) = mpsc::channel();
	let mut watcher = RecommendedWatcher::new(
		move |res| {
			let _ = tx.send(res);
		},
		notify::Config::default(),
	)
	.map_err(|e| LockError::Watch(e.to_string()))?;

	watcher
		.watch(dir, RecursiveMode::NonRecursive)
		.map_err(|e| LockError::Watch(e.to_string()))?;

	Ok((rx, watcher))
}

fn wait_on_channel(rx: &Receiver<notify::Result<Event>>, target: &Path, timeout: Duration) -> Result<bool> {
	let deadline = Instant::now() + timeout;
	loop {
		if !target.exists() {
			return Ok(true);
		}
		let remaining = deadline.saturating_duration_since(Instant::now());
		if remaining.is_zero() {
			return Ok(false);
		}
		match rx.recv_timeout(remaining) {
			Ok(Ok(event)) => {
				if matches!(event.kind, EventKind::Remove(_) | EventKind::Modify(_)) && !target.exists() {
					return Ok(true);
				}
			}
			Ok(Err(_)) | Err(mpsc::RecvTimeoutError::Timeout) => {
				if !target.exists() {
					return Ok(true);
				}
			}
			Err(mpsc::RecvTimeoutError::Disconnected) => return poll_until_free(target, remaining),
		}
	}
}

fn poll_until_free(target: &Path, timeout: Duration) -> Result<bool> {
	let deadline = Instant::now() + timeout;
	loop {
		if !target.exists() {
			return Ok(true);
		}
		if Instant::now() >= deadline {
			return Ok(false);
		}
		std::thread::sleep(Duration::from_millis(20).min(deadline - Instant::now()));
	}
}
