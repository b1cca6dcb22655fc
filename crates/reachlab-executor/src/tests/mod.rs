mod fakes;

use std::sync::Arc;
use std::time::Duration;

use reachlab_core::Config;
use reachlab_lockd::LockManager;
use reachlab_progress::ProgressTracker;
use reachlab_queue::QueueService;
use reachlab_registry::RegistryManager;
use tempfile::TempDir;

use crate::JobExecutor;
use fakes::{FakeHostBackend, FakeTestRunner};

pub(crate) struct Harness {
	pub executor: JobExecutor,
	pub host_backend: Arc<FakeHostBackend>,
	pub test_runner: Arc<FakeTestRunner>,
	pub queue: Arc<QueueService>,
	pub progress: Arc<ProgressTracker>,
	pub registry: Arc<RegistryManager>,
}

pub(crate) fn temp_dir() -> TempDir {
	TempDir::new().unwrap()
}

pub(crate) fn build_harness(dir: &std::path::Path) -> Harness {
	let config = Arc::new(Config::rooted_at(dir));
	let lockd = Arc::new(LockManager::new(config.lock_dir.clone(), Duration::from_millis(5)));
	let registry = Arc::new(RegistryManager::new(&config, lockd.clone()).unwrap());
	let queue = Arc::new(QueueService::new(&config, lockd));
	let progress = Arc::new(ProgressTracker::new(&config));
	let host_backend = Arc::new(FakeHostBackend::default());
	let test_runner = Arc::new(FakeTestRunner::default());

	let executor = JobExecutor::new(
		config,
		registry.clone(),
		queue.clone(),
		progress.clone(),
		test_runner.clone(),
		host_backend.clone(),
	);

	Harness {
		executor,
		host_backend,
		test_runner,
		queue,
		progress,
		registry,
	}
}

pub(crate) fn quick_job(run_id: &str, username: &str, params: serde_json::Value) -> reachlab_core::Job {
	reachlab_core::Job::new(run_id.to_string(), username, reachlab_core::JobType::Quick, params)
}

pub(crate) fn detailed_job(run_id: &str, username: &str, params: serde_json::Value) -> reachlab_core::Job {
	reachlab_core::Job::new(run_id.to_string(), username, reachlab_core::JobType::Detailed, params)
}
