use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::error::{RegistryError, Result};

/// DSCP value allocation for quick jobs, so concurrently running quick jobs
/// never collide on the same marking and cross-contaminate each other's
/// packet captures.
pub struct DscpPool {
	range: (u8, u8),
	allocated: Mutex<HashMap<String, u8>>,
}

impl DscpPool {
	pub fn new(range: (u8, u8)) -> Self {
		Self {
			range,
			allocated: Mutex::new(HashMap::new()),
		}
	}

	/// Allocates the lowest free DSCP value in range for `run_id`.
	/// Re-entrant: calling again for a `run_id` that already holds a value
	/// returns that same value.
	pub async fn allocate(&self, run_id: &str) -> Result<u8> {
		let mut allocated = self.allocated.lock().await;
		if let Some(existing) = allocated.get(run_id) {
			return Ok(*existing);
		}

		let taken: std::collections::HashSet<u8> = allocated.values().copied().collect();
		for value in self.range.0..=self.range.1 {
			if !taken.contains(&value) {
				allocated.insert(run_id.to_string(), value);
				return Ok(value);
			}
		}
		Err(RegistryError::Capacity)
	}

	pub async fn release(&self, run_id: &str) {
		self.allocated.lock().await.remove(run_id);
	}
}
