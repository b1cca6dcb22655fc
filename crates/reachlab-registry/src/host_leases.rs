use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reachlab_lockd::LockManager;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::persist;

const LOCK_NAME: &str = "host_leases";

/// Metadata recorded the first time a run takes a lease on a host, used to
/// answer "what DSCP/router is this host allocated under" without a second
/// table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostLeaseEntry {
	pub job_type: String,
	pub router_name: String,
	pub dscp: Option<u8>,
	pub holders: HashSet<String>,
}

/// Reference-counted leases on source hosts, one entry per host name.
///
/// Acquiring is idempotent per `(run_id, host_name)`: a run that calls
/// acquire twice for the same host holds one lease, not two, matching the
/// "re-entrant from the same run" rule used throughout the original
/// service's lease bookkeeping.
///
/// Guarded by the cross-process `host_leases` named lock, second in the
/// `spec.md` §4.B strict lock-ordering chain
/// (`host_registry < host_leases < neighbor_leases < router_lock(...)`):
/// every read-modify-write re-reads `host_leases.json` from disk under that
/// lock rather than trusting an in-process cache, so a second process
/// sharing the same `data_dir` sees a consistent view.
pub struct HostLeaseTable {
	path: PathBuf,
	lockd: Arc<LockManager>,
	lock_timeout: Duration,
}

impl HostLeaseTable {
	pub fn load(path: PathBuf, lockd: Arc<LockManager>, lock_timeout: Duration) -> Result<Self> {
		persist::load::<HashMap<String, HostLeaseEntry>>(&path, HashMap::new)?;
		Ok(Self { path, lockd, lock_timeout })
	}

	async fn lock(&self) -> Result<reachlab_lockd::LockGuard> {
		self.lockd
			.acquire_guard(LOCK_NAME, self.lock_timeout)
			.await
			.map_err(|_| crate::error::RegistryError::LockTimeout("host_leases"))
	}

	fn load_table(&self) -> Result<HashMap<String, HostLeaseEntry>> {
		persist::load(&self.path, HashMap::new)
	}

	fn save_table(&self, table: &HashMap<String, HostLeaseEntry>) -> Result<()> {
		persist::save(&self.path, table)
	}

	/// Acquires a lease for `run_id` on `host_name`, returning the resulting
	/// reference count.
	pub async fn acquire(
		&self,
		run_id: &str,
		host_name: &str,
		job_type: &str,
		router_name: &str,
		dscp: Option<u8>,
	) -> Result<usize> {
		let _guard = self.lock().await?;
		let mut leases = self.load_table()?;
		let entry = leases.entry(host_name.to_string()).or_insert_with(|| HostLeaseEntry {
			job_type: job_type.to_string(),
			router_name: router_name.to_string(),
			dscp,
			holders: HashSet::new(),
		});
		entry.holders.insert(run_id.to_string());
		let count = entry.holders.len();
		self.save_table(&leases)?;
		Ok(count)
	}

	/// Releases `run_id`'s lease on `host_name`. Returns the remaining
	/// reference count and whether the physical host should now be deleted
	/// (count dropped to zero).
	///
	/// Fails with `NoSuchLease` if `run_id` holds no lease on `host_name` —
	/// releasing a lease you never acquired is always a caller bug or a race
	/// that must be surfaced, not silently ignored.
	pub async fn release(&self, run_id: &str, host_name: &str) -> Result<(usize, bool)> {
		let _guard = self.lock().await?;
		let mut leases = self.load_table()?;
		let Some(entry) = leases.get_mut(host_name) else {
			return Err(crate::error::RegistryError::NoSuchLease(host_name.to_string(), run_id.to_string()));
		};
		if !entry.holders.remove(run_id) {
			return Err(crate::error::RegistryError::NoSuchLease(host_name.to_string(), run_id.to_string()));
		}
		let count = entry.holders.len();
		let should_delete = count == 0;
		if should_delete {
			leases.remove(host_name);
		}
		self.save_table(&leases)?;
		Ok((count, should_delete))
	}

	pub async fn lease_count(&self, host_name: &str) -> usize {
		let Ok(_guard) = self.lock().await else {
			return 0;
		};
		self.load_table()
			.ok()
			.and_then(|leases| leases.get(host_name).map(|e| e.holders.len()))
			.unwrap_or(0)
	}
}
