use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Per-category lock acquisition timeouts, in seconds.
///
/// Mirrors the `registry_manager.lock_timeouts` block of the original
/// service's JSON config: each table the registry manager guards gets its
/// own timeout rather than a single global value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LockTimeouts {
	pub host_registry: u64,
	pub host_leases: u64,
	pub neighbor_leases: u64,
	pub router_lock: u64,
	pub router_lock_atomic: u64,
}

impl Default for LockTimeouts {
	fn default() -> Self {
		Self {
			host_registry: 10,
			host_leases: 10,
			neighbor_leases: 10,
			router_lock: 30,
			router_lock_atomic: 30,
		}
	}
}

/// Tunable parameters for every component crate.
///
/// A single `Config` is constructed once (by `reachlab-cli` or a test) and
/// passed by reference or `Arc` into every component; nothing reaches for
/// an ambient global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	/// Root directory for registry state (hosts.json, host_leases.json,
	/// neighbor_leases.json).
	pub data_dir: PathBuf,
	/// Directory holding named-lock files.
	pub lock_dir: PathBuf,
	/// Directory holding queue.json and current.json.
	pub queue_dir: PathBuf,
	/// Directory holding progress.json / timing.log / audit.log mirrors.
	pub progress_dir: PathBuf,
	/// Directory holding one subdirectory per run (cancel.json, run.json,
	/// and whatever the `TestRunner` writes there).
	pub run_dir: PathBuf,

	pub lock_timeouts: LockTimeouts,
	/// Polling interval while waiting to re-attempt a lock, in milliseconds.
	pub lock_retry_interval_ms: u64,
	/// Locks older than this with no live holder are reclaimed by `cleanup_stale`.
	pub stale_lock_max_age_secs: u64,

	/// Max concurrently running quick jobs.
	pub quick_concurrency: usize,
	/// How often the scheduler polls the queue when jobs are waiting.
	pub queue_poll_interval_ms: u64,
	/// How long the scheduler sleeps when the queue is empty.
	pub idle_backoff_ms: u64,
	/// When true, quick jobs are dispatched ahead of detailed jobs at equal
	/// queue position.
	pub quick_priority: bool,

	/// Default ordered phase list used to size `expected_steps` before a job
	/// reports its own phase count.
	pub expected_phases: Vec<String>,

	/// Inclusive DSCP value range available for allocation.
	pub dscp_range: (u8, u8),
}

impl Config {
	/// Loads configuration from a JSON file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|error| CoreError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		serde_json::from_str(&text).map_err(|error| CoreError::Malformed {
			path: path.to_path_buf(),
			error,
		})
	}

	/// Builds a config rooted at `root`, with every directory a subdirectory
	/// of it. Intended for tests: callers pass a `TempDir` path so every
	/// component gets isolated, disposable storage.
	pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
		let root = root.into();
		Self {
			data_dir: root.join("registry"),
			lock_dir: root.join("locks"),
			queue_dir: root.join("queue"),
			progress_dir: root.join("progress"),
			run_dir: root.join("runs"),
			lock_timeouts: LockTimeouts::default(),
			lock_retry_interval_ms: 20,
			stale_lock_max_age_secs: 3600,
			quick_concurrency: 4,
			queue_poll_interval_ms: 50,
			idle_backoff_ms: 200,
			quick_priority: true,
			expected_phases: default_expected_phases(),
			dscp_range: (0, 63),
		}
	}
}

fn default_expected_phases() -> Vec<String> {
	[
		"INIT",
		"HOST_REGISTRATION",
		"ROUTER_LOCK",
		"RULE_INSTALL",
		"TEST_EXECUTION",
		"RULE_CLEANUP",
		"ANALYSIS",
	]
	.into_iter()
	.map(String::from)
	.collect()
}
