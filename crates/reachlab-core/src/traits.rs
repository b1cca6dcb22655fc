use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::RunId;

/// Result of running a test against a host pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
	pub success: bool,
	pub raw_facts: serde_json::Value,
}

/// Packet/byte counters read back from an installed rule set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Counters {
	pub packets: u64,
	pub bytes: u64,
}

/// Cooperative cancellation signal handed to a `TestRunner` invocation.
///
/// The executor flips this when it observes `cancel_requested` on the
/// current-job marker; a well-behaved `TestRunner` polls `is_cancelled`
/// between its own internal steps and returns early rather than racing the
/// executor's own unwind.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Release);
	}
}

/// The reachability test itself, opaque to the scheduler and executor.
///
/// Neither the executor nor the scheduler interprets `TestOutcome::raw_facts`
/// or the parameters passed in; failures surface as
/// `ExecutorError::TestRunner(String)` with no further structure.
#[async_trait]
pub trait TestRunner: Send + Sync {
	async fn run_test(
		&self,
		run_id: &RunId,
		params: &serde_json::Value,
		dscp: Option<u8>,
		cancel_token: CancelToken,
	) -> Result<TestOutcome, String>;
}

/// Namespace and rule lifecycle, injected so the executor never shells out
/// directly to `ip netns` / `iptables` / `ipset`.
#[async_trait]
pub trait HostBackend: Send + Sync {
	async fn create_host(&self, host_name: &str, primary_ip: &str, router_name: &str, mac_address: &str) -> Result<(), String>;
	async fn delete_host(&self, host_name: &str) -> Result<(), String>;
	/// Installs DSCP-scoped rules for `router_name` in non-destructive mode
	/// (never flushes rules already present for other DSCP values on the
	/// same router).
	async fn install_rules(&self, router_name: &str, dscp: u8) -> Result<(), String>;
	/// Removes only the rules matching `dscp` on `router_name`, leaving any
	/// other DSCP-scoped rule set on that router untouched.
	async fn remove_rules(&self, router_name: &str, dscp: u8) -> Result<(), String>;
	async fn read_counters(&self, router_name: &str) -> Result<Counters, String>;
}
