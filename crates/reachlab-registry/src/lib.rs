//! Host registry, reference-counted leases, and router locks.
//!
//! `RegistryManager` owns four tables (`hosts`, `host_leases`,
//! `neighbor_leases`, and the router lock set) and is the only writer to
//! their backing JSON files. Everything else in this crate is a building
//! block it composes.

mod dscp;
mod error;
mod host_leases;
mod neighbor_leases;
mod persist;
mod registry;
mod router_lock;

pub use dscp::DscpPool;
pub use error::RegistryError;
pub use host_leases::{HostLeaseEntry, HostLeaseTable};
pub use neighbor_leases::NeighborLeaseTable;
pub use registry::{HostRegistryEntry, HostTable};
pub use router_lock::{RouterLockSet, RouterLocks};

use std::sync::Arc;
use std::time::Duration;

use reachlab_core::Config;
use reachlab_lockd::LockManager;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// `NeighborLeaseTable` is keyed by a single string; this composes the
/// `(host_name, neighbor_ip)` pair `spec.md` §4.B.2 describes into one,
/// using a separator that can't appear in either component (host names and
/// IP/CIDR strings never contain whitespace).
fn neighbor_key(host_name: &str, neighbor_ip: &str) -> String {
	format!("{host_name} {neighbor_ip}")
}

/// Facade over the host registry, both lease tables, router locks, and the
/// DSCP pool, wired from a single [`Config`].
pub struct RegistryManager {
	pub hosts: HostTable,
	pub host_leases: HostLeaseTable,
	pub neighbor_leases: NeighborLeaseTable,
	pub router_locks: RouterLocks,
	pub dscp: DscpPool,
}

impl RegistryManager {
	pub fn new(config: &Config, lockd: Arc<LockManager>) -> Result<Self> {
		let data_dir = &config.data_dir;
		Ok(Self {
			hosts: HostTable::load(
				data_dir.join("hosts.json"),
				lockd.clone(),
				Duration::from_secs(config.lock_timeouts.host_registry),
			)?,
			host_leases: HostLeaseTable::load(
				data_dir.join("host_leases.json"),
				lockd.clone(),
				Duration::from_secs(config.lock_timeouts.host_leases),
			)?,
			neighbor_leases: NeighborLeaseTable::load(
				data_dir.join("neighbor_leases.json"),
				lockd.clone(),
				Duration::from_secs(config.lock_timeouts.neighbor_leases),
			)?,
			router_locks: RouterLocks::new(
				lockd,
				Duration::from_secs(config.lock_timeouts.router_lock_atomic),
			),
			dscp: DscpPool::new(config.dscp_range),
		})
	}

	/// Acquires a source host lease for `run_id` on `host_name`, failing
	/// with `NotFound` if `host_name` was never registered. `HostLeaseTable`
	/// itself has no reference to the host registry, so this existence
	/// check lives here rather than being left to caller discipline
	/// (`spec.md` §4.B.2).
	pub async fn acquire_host_lease(
		&self,
		run_id: &str,
		host_name: &str,
		job_type: &str,
		router_name: &str,
		dscp: Option<u8>,
	) -> Result<usize> {
		if self.hosts.get_host_info(host_name).await.is_none() {
			return Err(RegistryError::NotFound(host_name.to_string()));
		}
		self.host_leases.acquire(run_id, host_name, job_type, router_name, dscp).await
	}

	/// Acquires a neighbor-entry lease for `run_id` on `(host_name,
	/// neighbor_ip)`, failing with `NotFound` if `host_name` was never
	/// registered — same existence check as [`Self::acquire_host_lease`],
	/// since `NeighborLeaseTable` is likewise just a bare reference-count
	/// table with no view of the host registry.
	pub async fn acquire_neighbor_lease(&self, run_id: &str, host_name: &str, neighbor_ip: &str) -> Result<usize> {
		if self.hosts.get_host_info(host_name).await.is_none() {
			return Err(RegistryError::NotFound(host_name.to_string()));
		}
		self.neighbor_leases.acquire(run_id, &neighbor_key(host_name, neighbor_ip)).await
	}

	/// Releases a neighbor-entry lease acquired via
	/// [`Self::acquire_neighbor_lease`].
	pub async fn release_neighbor_lease(&self, run_id: &str, host_name: &str, neighbor_ip: &str) -> Result<(usize, bool)> {
		self.neighbor_leases.release(run_id, &neighbor_key(host_name, neighbor_ip)).await
	}

	/// Removes `host_name` from the registry. Fails if any lease on it is
	/// still outstanding: the registry never lets a host disappear out from
	/// under a run that still holds a reference.
	pub async fn unregister_host(&self, host_name: &str) -> Result<()> {
		let outstanding = self.host_leases.lease_count(host_name).await;
		if outstanding > 0 {
			return Err(RegistryError::LeasesOutstanding(host_name.to_string(), outstanding));
		}
		if !self.hosts.remove(host_name).await? {
			return Err(RegistryError::NotFound(host_name.to_string()));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;

#[cfg(test)]
pub(crate) fn test_lockd(root: &std::path::Path) -> Arc<LockManager> {
	Arc::new(LockManager::new(root.join("locks"), Duration::from_millis(5)))
}
