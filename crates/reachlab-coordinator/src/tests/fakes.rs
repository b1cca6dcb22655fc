use async_trait::async_trait;
use reachlab_core::{CancelToken, Counters, HostBackend, TestOutcome, TestRunner};

/// A `TestRunner` that returns success immediately, for coordinator tests
/// that only care about submit/cancel/progress bookkeeping rather than the
/// executor's own flows.
pub(crate) struct ImmediateTestRunner;

#[async_trait]
impl TestRunner for ImmediateTestRunner {
	async fn run_test(
		&self,
		_run_id: &String,
		_params: &serde_json::Value,
		_dscp: Option<u8>,
		_cancel_token: CancelToken,
	) -> Result<TestOutcome, String> {
		Ok(TestOutcome {
			success: true,
			raw_facts: serde_json::json!({}),
		})
	}
}

pub(crate) struct NoopHostBackend;

#[async_trait]
impl HostBackend for NoopHostBackend {
	async fn create_host(&self, _host_name: &str, _primary_ip: &str, _router_name: &str, _mac_address: &str) -> Result<(), String> {
		Ok(())
	}

	async fn delete_host(&self, _host_name: &str) -> Result<(), String> {
		Ok(())
	}

	async fn install_rules(&self, _router_name: &str, _dscp: u8) -> Result<(), String> {
		Ok(())
	}

	async fn remove_rules(&self, _router_name: &str, _dscp: u8) -> Result<(), String> {
		Ok(())
	}

	async fn read_counters(&self, _router_name: &str) -> Result<Counters, String> {
		Ok(Counters::default())
	}
}
