use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reachlab_lockd::LockManager;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::persist;

const LOCK_NAME: &str = "host_registry";

/// A registered physical host namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRegistryEntry {
	pub host_name: String,
	pub primary_ip: String,
	pub connected_to: String,
	pub mac_address: String,
	pub registered_at: DateTime<Utc>,
}

/// The host registry table (`hosts.json`).
///
/// Guarded by the cross-process `host_registry` named lock rather than a
/// bare in-process mutex: `spec.md` §4.B's lock-ordering invariant
/// (`host_registry < host_leases < neighbor_leases < router_lock(...)`)
/// only means something if a second process racing to register the same
/// host is actually locked out, not just a second task in this one.
/// `check_and_register_host` is TOCTOU-free because the check and the
/// insert happen under the same lock-guarded read-modify-write, so two
/// concurrent callers — same process or not — racing to create the same
/// host never both observe "not registered".
pub struct HostTable {
	path: PathBuf,
	lockd: Arc<LockManager>,
	lock_timeout: Duration,
}

impl HostTable {
	pub fn load(path: PathBuf, lockd: Arc<LockManager>, lock_timeout: Duration) -> Result<Self> {
		// Touch the file once up front so a missing `hosts.json` surfaces as
		// an empty table immediately rather than on first use.
		persist::load::<HashMap<String, HostRegistryEntry>>(&path, HashMap::new)?;
		Ok(Self { path, lockd, lock_timeout })
	}

	async fn lock(&self) -> Result<reachlab_lockd::LockGuard> {
		self.lockd
			.acquire_guard(LOCK_NAME, self.lock_timeout)
			.await
			.map_err(|_| crate::error::RegistryError::LockTimeout("host_registry"))
	}

	fn load_table(&self) -> Result<HashMap<String, HostRegistryEntry>> {
		persist::load(&self.path, HashMap::new)
	}

	fn save_table(&self, table: &HashMap<String, HostRegistryEntry>) -> Result<()> {
		persist::save(&self.path, table)
	}

	/// Registers `host_name` if absent. Returns `true` if this call created
	/// the entry (caller must create the physical host), `false` if it
	/// already existed with matching attributes.
	///
	/// Returns `Collision` if `host_name` exists with different attributes,
	/// or if `primary_ip`/`mac_address` is already claimed by a *different*
	/// host_name: the registry holds at most one entry matching any of the
	/// three identifying fields.
	pub async fn check_and_register_host(
		&self,
		host_name: &str,
		primary_ip: &str,
		connected_to: &str,
		mac_address: &str,
	) -> Result<bool> {
		let _guard = self.lock().await?;
		let mut hosts = self.load_table()?;
		if let Some(existing) = hosts.get(host_name) {
			if existing.primary_ip == primary_ip
				&& existing.connected_to == connected_to
				&& existing.mac_address == mac_address
			{
				return Ok(false);
			}
			return Err(crate::error::RegistryError::Collision(host_name.to_string()));
		}

		if let Some(other) = hosts
			.values()
			.find(|entry| entry.primary_ip == primary_ip || entry.mac_address == mac_address)
		{
			return Err(crate::error::RegistryError::Collision(other.host_name.clone()));
		}

		hosts.insert(
			host_name.to_string(),
			HostRegistryEntry {
				host_name: host_name.to_string(),
				primary_ip: primary_ip.to_string(),
				connected_to: connected_to.to_string(),
				mac_address: mac_address.to_string(),
				registered_at: Utc::now(),
			},
		);
		self.save_table(&hosts)?;
		Ok(true)
	}

	pub async fn get_host_info(&self, host_name: &str) -> Option<HostRegistryEntry> {
		let _guard = self.lock().await.ok()?;
		self.load_table().ok()?.get(host_name).cloned()
	}

	pub async fn list_all_hosts(&self) -> Vec<HostRegistryEntry> {
		let Ok(_guard) = self.lock().await else {
			return Vec::new();
		};
		self.load_table().map(|hosts| hosts.into_values().collect()).unwrap_or_default()
	}

	/// Removes `host_name` from the registry. Callers must ensure no leases
	/// remain first; the registry itself does not check, since that check
	/// spans a different table and must be made atomic by the caller
	/// (`RegistryManager::unregister_host` does this, acquiring the
	/// `host_registry` lock before checking `host_leases`, per the strict
	/// lock-ordering invariant).
	pub async fn remove(&self, host_name: &str) -> Result<bool> {
		let _guard = self.lock().await?;
		let mut hosts = self.load_table()?;
		let removed = hosts.remove(host_name).is_some();
		if removed {
			self.save_table(&hosts)?;
		}
		Ok(removed)
	}
}
