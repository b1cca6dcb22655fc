use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reachlab_core::{CancelToken, Counters, HostBackend, TestOutcome, TestRunner};

/// In-memory stand-in for the `ip netns`/`iptables` collaborator, grounded
/// in the placeholder `_create_physical_host`/`_delete_physical_host`
/// hooks of the original integration shim: it records what the executor
/// asked for instead of touching the network stack.
#[derive(Default)]
pub struct FakeHostBackend {
	pub created: Mutex<Vec<String>>,
	pub deleted: Mutex<Vec<String>>,
	pub rules_installed: Mutex<Vec<(String, u8)>>,
	pub rules_removed: Mutex<Vec<(String, u8)>>,
	pub counters: Mutex<HashMap<String, Counters>>,
	pub fail_create_host: Mutex<Option<String>>,
	pub fail_install_rules: Mutex<Option<String>>,
}

#[async_trait]
impl HostBackend for FakeHostBackend {
	async fn create_host(&self, host_name: &str, _primary_ip: &str, _router_name: &str, _mac_address: &str) -> Result<(), String> {
		if let Some(target) = self.fail_create_host.lock().unwrap().as_deref()
			&& target == host_name
		{
			return Err(format!("simulated create_host failure for {host_name}"));
		}
		self.created.lock().unwrap().push(host_name.to_string());
		Ok(())
	}

	async fn delete_host(&self, host_name: &str) -> Result<(), String> {
		self.deleted.lock().unwrap().push(host_name.to_string());
		Ok(())
	}

	async fn install_rules(&self, router_name: &str, dscp: u8) -> Result<(), String> {
		if let Some(target) = self.fail_install_rules.lock().unwrap().as_deref()
			&& target == router_name
		{
			return Err(format!("simulated install_rules failure for {router_name}"));
		}
		self.rules_installed.lock().unwrap().push((router_name.to_string(), dscp));
		Ok(())
	}

	async fn remove_rules(&self, router_name: &str, dscp: u8) -> Result<(), String> {
		self.rules_removed.lock().unwrap().push((router_name.to_string(), dscp));
		Ok(())
	}

	async fn read_counters(&self, router_name: &str) -> Result<Counters, String> {
		Ok(self.counters.lock().unwrap().get(router_name).copied().unwrap_or_default())
	}
}

/// In-memory stand-in for the reachability test itself.
#[derive(Default)]
pub struct FakeTestRunner {
	pub should_fail: Mutex<bool>,
	pub calls: Mutex<Vec<String>>,
	pub observed_cancelled: Mutex<bool>,
}

#[async_trait]
impl TestRunner for FakeTestRunner {
	async fn run_test(
		&self,
		run_id: &String,
		_params: &serde_json::Value,
		_dscp: Option<u8>,
		cancel_token: CancelToken,
	) -> Result<TestOutcome, String> {
		self.calls.lock().unwrap().push(run_id.clone());
		tokio::time::sleep(std::time::Duration::from_millis(5)).await;
		*self.observed_cancelled.lock().unwrap() = cancel_token.is_cancelled();
		Ok(TestOutcome {
			success: !*self.should_fail.lock().unwrap(),
			raw_facts: serde_json::json!({}),
		})
	}
}
