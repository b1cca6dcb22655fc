//! Named, advisory, cross-process file locks.
//!
//! Every coordination point in reachlab (leader election, router locks, the
//! queue lock) goes through a [`LockManager`]. Locks are `flock(2)`-backed
//! files under a shared directory; acquisition is dispatched through
//! `tokio::task::spawn_blocking` since `flock` is a blocking syscall.

mod error;
mod guard;
mod manager;
mod wait;

pub use error::LockError;
pub use guard::LockGuard;
pub use manager::LockManager;
pub use wait::wait_for_free;

pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use tempfile::TempDir;

	use super::*;

	#[tokio::test]
	async fn acquire_and_release_round_trip() {
		let dir = TempDir::new().unwrap();
		let manager = LockManager::new(dir.path(), Duration::from_millis(5));

		assert!(manager.acquire("router1", Duration::from_millis(100)).await.unwrap());
		assert!(manager.release("router1").await.unwrap());
		assert!(!manager.release("router1").await.unwrap());
	}

	#[tokio::test]
	async fn second_acquire_times_out_while_held() {
		let dir = TempDir::new().unwrap();
		let manager = LockManager::new(dir.path(), Duration::from_millis(5));

		assert!(manager.acquire("router1", Duration::from_millis(100)).await.unwrap());
		assert!(!manager.acquire("router1", Duration::from_millis(50)).await.unwrap());
	}

	#[tokio::test]
	async fn guard_releases_on_drop() {
		let dir = TempDir::new().unwrap();
		let manager = LockManager::new(dir.path(), Duration::from_millis(5));

		{
			let _guard = manager.acquire_guard("router1", Duration::from_millis(100)).await.unwrap();
			assert!(!manager.acquire("router1", Duration::from_millis(20)).await.unwrap());
		}

		assert!(manager.acquire("router1", Duration::from_millis(100)).await.unwrap());
	}

	#[tokio::test]
	async fn cleanup_stale_reclaims_abandoned_lock_files() {
		let dir = TempDir::new().unwrap();
		let manager = LockManager::new(dir.path(), Duration::from_millis(5));

		// Simulate a lock file left behind by a crashed holder: present on
		// disk but not actually flocked by anyone.
		std::fs::write(dir.path().join("old.lock"), "12345\n0\n").unwrap();

		let reclaimed = manager.cleanup_stale(Duration::from_secs(0)).await.unwrap();
		assert!(reclaimed.contains(&"old".to_string()));
		assert!(!dir.path().join("old.lock").exists());
	}

	#[tokio::test]
	async fn wait_for_free_wakes_on_release() {
		let dir = TempDir::new().unwrap();
		let manager = std::sync::Arc::new(LockManager::new(dir.path(), Duration::from_millis(5)));

		assert!(manager.acquire("router1", Duration::from_millis(100)).await.unwrap());

		let waiter = {
			let manager = manager.clone();
			tokio::spawn(async move { wait_for_free(&manager, "router1", Duration::from_secs(2)).await })
		};

		tokio::time::sleep(Duration::from_millis(50)).await;
		manager.release("router1").await.unwrap();

		assert!(waiter.await.unwrap().unwrap());
	}
}
