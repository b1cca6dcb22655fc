use async_trait::async_trait;
use reachlab_core::{CancelToken, Counters, HostBackend, TestOutcome, TestRunner};
use tokio::sync::watch;

/// Test runner that blocks until released, so tests can hold a job
/// "in-flight" for as long as they need to observe scheduler gating
/// decisions before letting it complete.
pub struct GatedTestRunner {
	tx: watch::Sender<bool>,
	rx: watch::Receiver<bool>,
}

impl Default for GatedTestRunner {
	fn default() -> Self {
		let (tx, rx) = watch::channel(false);
		Self { tx, rx }
	}
}

impl GatedTestRunner {
	pub fn release(&self) {
		let _ = self.tx.send(true);
	}
}

#[async_trait]
impl TestRunner for GatedTestRunner {
	async fn run_test(&self, _run_id: &String, _params: &serde_json::Value, _dscp: Option<u8>, _cancel_token: CancelToken) -> Result<TestOutcome, String> {
		let mut rx = self.rx.clone();
		while !*rx.borrow() {
			if rx.changed().await.is_err() {
				break;
			}
		}
		Ok(TestOutcome {
			success: true,
			raw_facts: serde_json::json!({}),
		})
	}
}

/// Host backend that never fails, used wherever a scheduler test needs a
/// `HostBackend` but isn't exercising host lifecycle behavior itself.
#[derive(Default)]
pub struct NoopHostBackend;

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
