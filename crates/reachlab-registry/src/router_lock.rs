use std::sync::Arc;
use std::time::{Duration, Instant};

use reachlab_lockd::{LockGuard, LockManager};

use crate::error::{RegistryError, Result};

fn lock_name(router_name: &str) -> String {
	format!("router_{router_name}")
}

/// Exclusive per-router locks, held by detailed jobs for the duration of a
/// measurement so a quick job never races a detailed one for the same
/// router's rule tables.
pub struct RouterLocks {
	lockd: Arc<LockManager>,
	atomic_timeout: Duration,
}

/// A set of router locks acquired together. Dropping it releases every lock
/// in the set, in reverse acquisition order.
#[must_use = "router locks are released as soon as this guard is dropped"]
pub struct RouterLockSet {
	guards: Vec<LockGuard>,
}

impl RouterLockSet {
	pub fn routers(&self) -> impl Iterator<Item = &str> {
		self.guards.iter().map(|g| g.name().trim_start_matches("router_"))
	}
}

impl RouterLocks {
	pub fn new(lockd: Arc<LockManager>, atomic_timeout: Duration) -> Self {
		Self { lockd, atomic_timeout }
	}

	pub async fn acquire(&self, router_name: &str, timeout: Duration) -> Result<bool> {
		Ok(self.lockd.acquire(&lock_name(router_name), timeout).await?)
	}

	pub async fn release(&self, router_name: &str) -> Result<bool> {
		Ok(self.lockd.release(&lock_name(router_name)).await?)
	}

	/// Blocks (without polling) until `router_name` is free, or `timeout`
	/// elapses. Used by quick jobs that must wait out a detailed job holding
	/// the router before proceeding.
	pub async fn wait_for_router(&self, router_name: &str, timeout: Duration) -> Result<bool> {
		Ok(reachlab_lockd::wait_for_free(&self.lockd, &lock_name(router_name), timeout).await?)
	}

	/// Acquires every router in `router_names` atomically: sorted by name,
	/// so two callers racing over the same set never deadlock each other by
	/// acquiring in opposite orders. On any failure, every lock already
	/// acquired in this call is released before returning.
	///
	/// The overall call is bounded by `atomic_timeout` regardless of how
	/// many routers are in the set: each router's individual acquisition
	/// gets only the time remaining until that one deadline, not a fresh
	/// `atomic_timeout` of its own, so N routers can't each wait the full
	/// budget for a worst case of N times the documented timeout.
	pub async fn all_router_locks(&self, router_names: &[String]) -> Result<RouterLockSet> {
		let mut sorted: Vec<&String> = router_names.iter().collect();
		sorted.sort();
		sorted.dedup();

		let deadline = Instant::now() + self.atomic_timeout;
		let mut guards = Vec::with_capacity(sorted.len());
		for router_name in sorted {
			let remaining = deadline.saturating_duration_since(Instant::now());
			match self.lockd.acquire_guard(&lock_name(router_name), remaining).await {
				Ok(guard) => guards.push(guard),
				Err(_) => {
					// `guards` drops here, releasing everything acquired so far.
					return Err(RegistryError::LockTimeout("router_lock_atomic"));
				}
			}
		}

		Ok(RouterLockSet { guards })
	}
}
