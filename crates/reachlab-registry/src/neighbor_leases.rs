use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reachlab_lockd::LockManager;

use crate::error::Result;
use crate::persist;

const LOCK_NAME: &str = "neighbor_leases";

/// Reference-counted leases on neighbor (ephemeral destination) hosts.
///
/// Tracked separately from `HostLeaseTable` because neighbor hosts never
/// carry DSCP or router metadata — they exist only for the lifetime of a
/// measurement and are shared across concurrent runs purely by name.
///
/// Guarded by the cross-process `neighbor_leases` named lock, third in the
/// `spec.md` §4.B strict lock-ordering chain
/// (`host_registry < host_leases < neighbor_leases < router_lock(...)`) —
/// see `HostLeaseTable`'s doc comment for why this re-reads the file under
/// the lock rather than caching in process memory.
pub struct NeighborLeaseTable {
	path: PathBuf,
	lockd: Arc<LockManager>,
	lock_timeout: Duration,
}

impl NeighborLeaseTable {
	pub fn load(path: PathBuf, lockd: Arc<LockManager>, lock_timeout: Duration) -> Result<Self> {
		persist::load::<HashMap<String, HashSet<String>>>(&path, HashMap::new)?;
		Ok(Self { path, lockd, lock_timeout })
	}

	async fn lock(&self) -> Result<reachlab_lockd::LockGuard> {
		self.lockd
			.acquire_guard(LOCK_NAME, self.lock_timeout)
			.await
			.map_err(|_| crate::error::RegistryError::LockTimeout("neighbor_leases"))
	}

	fn load_table(&self) -> Result<HashMap<String, HashSet<String>>> {
		persist::load(&self.path, HashMap::new)
	}

	fn save_table(&self, table: &HashMap<String, HashSet<String>>) -> Result<()> {
		persist::save(&self.path, table)
	}

	pub async fn acquire(&self, run_id: &str, neighbor_name: &str) -> Result<usize> {
		let _guard = self.lock().await?;
		let mut leases = self.load_table()?;
		let holders = leases.entry(neighbor_name.to_string()).or_default();
		holders.insert(run_id.to_string());
		let count = holders.len();
		self.save_table(&leases)?;
		Ok(count)
	}

	/// Fails with `NoSuchLease` if `run_id` holds no lease on
	/// `neighbor_name`, matching `HostLeaseTable::release`'s contract.
	pub async fn release(&self, run_id: &str, neighbor_name: &str) -> Result<(usize, bool)> {
		let _guard = self.lock().await?;
		let mut leases = self.load_table()?;
		let Some(holders) = leases.get_mut(neighbor_name) else {
			return Err(crate::error::RegistryError::NoSuchLease(neighbor_name.to_string(), run_id.to_string()));
		};
		if !holders.remove(run_id) {
			return Err(crate::error::RegistryError::NoSuchLease(neighbor_name.to_string(), run_id.to_string()));
		}
		let count = holders.len();
		let should_delete = count == 0;
		if should_delete {
			leases.remove(neighbor_name);
		}
		self.save_table(&leases)?;
		Ok((count, should_delete))
	}
}
