use std::sync::Arc;

use reachlab_core::{CancelToken, Config, HostBackend, Job, JobType, TestRunner};
use reachlab_progress::ProgressTracker;
use reachlab_queue::QueueService;
use reachlab_registry::RegistryManager;

use crate::detailed;
use crate::error::{ExecutorError, Result};
use crate::quick;

/// Per-job entrypoint. Holds references to every collaborator a job body
/// needs and dispatches to the quick or detailed flow based on
/// `Job::job_type`; all resource operations flow through `registry`.
pub struct JobExecutor {
	pub(crate) config: Arc<Config>,
	pub(crate) registry: Arc<RegistryManager>,
	pub(crate) queue: Arc<QueueService>,
	pub(crate) progress: Arc<ProgressTracker>,
	pub(crate) test_runner: Arc<dyn TestRunner>,
	pub(crate) host_backend: Arc<dyn HostBackend>,
}

impl JobExecutor {
	pub fn new(
		config: Arc<Config>,
		registry: Arc<RegistryManager>,
		queue: Arc<QueueService>,
		progress: Arc<ProgressTracker>,
		test_runner: Arc<dyn TestRunner>,
		host_backend: Arc<dyn HostBackend>,
	) -> Self {
		Self {
			config,
			registry,
			queue,
			progress,
			test_runner,
			host_backend,
		}
	}

	/// Runs `job` to completion, reporting its terminal outcome to the
	/// progress tracker. Returns `Ok(())` even when the job itself failed —
	/// failure is recorded as a `FAILED` progress record, not an error
	/// return, except when the caller needs to know the failure reason for
	/// scheduler-level bookkeeping (e.g. releasing a DSCP slot), in which
	/// case the error is also returned.
	pub async fn run(&self, job: Job, dscp: Option<u8>) -> Result<()> {
		self.progress.start_run(&job.run_id, &job.username, None).await?;
		self.progress.set_active_run_for_user(&job.username, &job.run_id).await;

		let outcome = match job.job_type {
			JobType::Quick => {
				let dscp = dscp.ok_or(ExecutorError::Capacity)?;
				quick::run(self, &job, dscp).await
			}
			JobType::Detailed => detailed::run(self, &job).await,
		};

		match &outcome {
			Ok(()) => {
				self.progress.mark_complete(&job.run_id, true, None, None).await?;
			}
			Err(ExecutorError::Cancelled) => {
				self.progress.mark_complete(&job.run_id, false, None, Some("cancelled")).await?;
			}
			Err(error) => {
				self.progress
					.mark_complete(&job.run_id, false, None, Some(&error.to_string()))
					.await?;
			}
		}

		outcome
	}

	/// A cancellation checkpoint: reads `run_id`'s running-job entry and
	/// returns `Err(Cancelled)` if its `cancel_requested` flag is set. Called
	/// at every major step boundary in both executor flows, per the
	/// cooperative-cancellation contract.
	pub(crate) async fn check_cancelled(&self, run_id: &str) -> Result<()> {
		match self.queue.get_running(run_id).await? {
			Some(current) if current.cancel_requested => Err(ExecutorError::Cancelled),
			_ => Ok(()),
		}
	}

	/// Runs the test runner with a live cancellation token: a background
	/// task polls `run_id`'s running-job entry every `queue_poll_interval`
	/// and flips the token the moment `cancel_requested` is observed, so a
	/// `TestRunner` that checks `is_cancelled` between its own internal
	/// steps can abort without waiting for the whole test to finish.
	pub(crate) async fn run_test_watched(
		&self,
		run_id: &str,
		params: &serde_json::Value,
		dscp: Option<u8>,
	) -> Result<reachlab_core::TestOutcome> {
		let token = CancelToken::new();
		let watch_token = token.clone();
		let watch_queue = self.queue.clone();
		let run_id_owned = run_id.to_string();
		let poll_interval = std::time::Duration::from_millis(self.config.queue_poll_interval_ms);

		let watcher = tokio::spawn(async move {
			loop {
				tokio::time::sleep(poll_interval).await;
				match watch_queue.get_running(&run_id_owned).await {
					Ok(Some(current)) if current.cancel_requested => {
						watch_token.cancel();
						return;
					}
					Ok(_) => continue,
					Err(_) => continue,
				}
			}
		});

		let result = self
			.test_runner
			.run_test(&run_id.to_string(), params, dscp, token)
			.await
			.map_err(ExecutorError::TestRunner);
		watcher.abort();
		result
	}
}
