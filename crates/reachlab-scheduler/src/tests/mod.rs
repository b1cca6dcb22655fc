mod concurrency_cap;
mod detailed_exclusivity;
mod fakes;
mod quick_priority;

use std::sync::Arc;
use std::time::Duration;

use reachlab_core::{Config, JobType};
use reachlab_executor::JobExecutor;
use reachlab_lockd::LockManager;
use reachlab_progress::ProgressTracker;
use reachlab_queue::QueueService;
use reachlab_registry::RegistryManager;
use tempfile::TempDir;

use crate::Scheduler;
use fakes::{GatedTestRunner, NoopHostBackend};

pub(crate) struct Harness {
	pub scheduler: Arc<Scheduler>,
	pub queue: Arc<QueueService>,
	pub test_runner: Arc<GatedTestRunner>,
	_dir: TempDir,
}

pub(crate) fn build_harness(quick_concurrency: usize) -> Harness {
	let dir = TempDir::new().unwrap();
	let mut config = Config::rooted_at(dir.path());
	config.quick_concurrency = quick_concurrency;
	config.lock_retry_interval_ms = 5;
	config.queue_poll_interval_ms = 5;
	config.idle_backoff_ms = 5;
	let config = Arc::new(config);

	let lockd = Arc::new(LockManager::new(config.lock_dir.clone(), Duration::from_millis(5)));
	let registry = Arc::new(RegistryManager::new(&config, lockd.clone()).unwrap());
	let queue = Arc::new(QueueService::new(&config, lockd.clone()));
	let progress = Arc::new(ProgressTracker::new(&config));
	let test_runner = Arc::new(GatedTestRunner::default());
	let host_backend = Arc::new(NoopHostBackend);

	let executor = Arc::new(JobExecutor::new(config.clone(), registry.clone(), queue.clone(), progress.clone(), test_runner.clone(), host_backend));

	let scheduler = Arc::new(Scheduler::new(config, lockd, queue.clone(), registry, executor));

	Harness {
		scheduler,
		queue,
		test_runner,
		_dir: dir,
	}
}

/// A job plan with no routers or hosts: quick enough to reach
/// `TEST_EXECUTION` and block on the gated test runner without touching
/// the registry, which is all scheduler-gating tests need.
pub(crate) fn bare_params() -> serde_json::Value {
	serde_json::json!({ "routers": [] })
}

pub(crate) async fn enqueue(harness: &Harness, run_id: &str, username: &str, job_type: JobType) {
	harness.queue.enqueue(run_id, username, job_type, bare_params()).await.unwrap();
}
