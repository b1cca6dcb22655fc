//! Default `TestRunner`/`HostBackend` wiring for the `run` subcommand.
//!
//! The real namespace/iptables backend these traits front is out of scope
//! here exactly as it was in the original: the source this crate is
//! modeled on left `_create_physical_host`/`_run_tests` as bodies that log
//! and return rather than shelling out to `ip netns`/`iptables`. A caller
//! embedding `reachlab-coordinator` in a real deployment supplies its own
//! `TestRunner`/`HostBackend` to `Coordinator::new`; this module exists so
//! `reachlab run` has something concrete to hand it.

use async_trait::async_trait;
use reachlab_core::{CancelToken, Counters, HostBackend, RunId, TestOutcome, TestRunner};

pub struct UnconfiguredTestRunner;

#[async_trait]
impl TestRunner for UnconfiguredTestRunner {
	async fn run_test(
		&self,
		run_id: &RunId,
		_params: &serde_json::Value,
		_dscp: Option<u8>,
		_cancel_token: CancelToken,
	) -> Result<TestOutcome, String> {
		tracing::warn!(run_id, "no TestRunner backend configured; failing the job");
		Err("no TestRunner backend configured for this reachlab-cli build".to_string())
	}
}

pub struct LoggingHostBackend;

#[async_trait]
impl HostBackend for LoggingHostBackend {
	async fn create_host(&self, host_name: &str, primary_ip: &str, router_name: &str, mac_address: &str) -> Result<(), String> {
		tracing::info!(host_name, primary_ip, router_name, mac_address, "create_host (no-op backend)");
		Ok(())
	}

	async fn delete_host(&self, host_name: &str) -> Result<(), String> {
		tracing::info!(host_name, "delete_host (no-op backend)");
		Ok(())
	}

	async fn install_rules(&self, router_name: &str, dscp: u8) -> Result<(), String> {
		tracing::info!(router_name, dscp, "install_rules (no-op backend)");
		Ok(())
	}

	async fn remove_rules(&self, router_name: &str, dscp: u8) -> Result<(), String> {
		tracing::info!(router_name, dscp, "remove_rules (no-op backend)");
		Ok(())
	}

	async fn read_counters(&self, router_name: &str) -> Result<Counters, String> {
		tracing::info!(router_name, "read_counters (no-op backend)");
		Ok(Counters::default())
	}
}
