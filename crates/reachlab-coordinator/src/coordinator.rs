use std::sync::Arc;
use std::time::Duration;

use reachlab_core::{Config, HostBackend, Job, JobType, ProgressRecord, RunId, TestRunner};
use reachlab_executor::JobExecutor;
use reachlab_lockd::LockManager;
use reachlab_progress::ProgressTracker;
use reachlab_queue::{QueueService, QueuedJob};
use reachlab_registry::RegistryManager;
use reachlab_scheduler::Scheduler;
use tokio_util::sync::CancellationToken;

use crate::error::{CoordinatorError, Result};

/// Counts of reclaimed state from a single maintenance sweep, for the
/// periodic housekeeping pass `reachlab-cli` (or a cron-style caller) runs
/// alongside the scheduler loop.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
	pub stale_locks_reclaimed: Vec<String>,
	pub progress_records_evicted_from_memory: usize,
	pub progress_runs_reclaimed_from_disk: Vec<String>,
}

/// The single entrypoint a front end (CLI, web handler, whatever) talks to.
///
/// `Coordinator` does not itself speak HTTP or a CLI protocol: it is the
/// library-level realization of `spec.md` §6's Exposed interface, wiring the
/// queue, registry, progress tracker, and scheduler into the handful of
/// operations a caller actually needs — submit, cancel, inspect progress,
/// list the queue, and drive the scheduler's run loop.
pub struct Coordinator {
	lockd: Arc<LockManager>,
	queue: Arc<QueueService>,
	registry: Arc<RegistryManager>,
	progress: Arc<ProgressTracker>,
	scheduler: Arc<Scheduler>,
}

impl Coordinator {
	pub fn new(
		config: Arc<Config>,
		test_runner: Arc<dyn TestRunner>,
		host_backend: Arc<dyn HostBackend>,
	) -> Result<Self> {
		let lockd = Arc::new(LockManager::new(config.lock_dir.clone(), Duration::from_millis(config.lock_retry_interval_ms)));
		let registry = Arc::new(RegistryManager::new(&config, lockd.clone())?);
		let queue = Arc::new(QueueService::new(&config, lockd.clone()));
		let progress = Arc::new(ProgressTracker::new(&config));
		let executor = Arc::new(JobExecutor::new(
			config.clone(),
			registry.clone(),
			queue.clone(),
			progress.clone(),
			test_runner,
			host_backend,
		));
		let scheduler = Arc::new(Scheduler::new(config, lockd.clone(), queue.clone(), registry.clone(), executor));

		Ok(Self {
			lockd,
			queue,
			registry,
			progress,
			scheduler,
		})
	}

	/// Enqueues a new job for `username`, generating its `run_id`. Rejects
	/// the submission (`UserHasActiveJob`) if the same user already has a
	/// job sitting in the queue or actively running — `spec.md` P7/S4's
	/// at-most-one-job-per-user invariant. Checked against `queue.json`'s
	/// pending jobs, `current.json`'s running jobs, and the in-process
	/// active-run map; the first two are cross-process (a dispatched job
	/// leaves `queue.json` but lands in `current.json`, both read under the
	/// queue's file lock regardless of which process is asking), while the
	/// active-run map only helps a caller sharing this process's memory.
	pub async fn submit(&self, username: &str, job_type: JobType, params: serde_json::Value) -> Result<(RunId, usize)> {
		if self.queue.has_user_job(username).await?
			|| self.queue.has_running_user_job(username).await?
			|| self.progress.get_active_run_for_user(username).await.is_some()
		{
			return Err(CoordinatorError::UserHasActiveJob(username.to_string()));
		}

		let run_id = uuid::Uuid::new_v4().to_string();
		let position = self.queue.enqueue(&run_id, username, job_type, params).await?;
		tracing::info!(run_id, username, ?job_type, position, "submitted job");
		Ok((run_id, position))
	}

	/// Requests cancellation of `run_id`, whether it is still queued or
	/// already running. Returns `NotFound` if it is neither.
	pub async fn cancel(&self, run_id: &str, cancelled_by: Option<&str>) -> Result<()> {
		if self.queue.request_cancel(run_id, cancelled_by).await? {
			Ok(())
		} else {
			Err(CoordinatorError::NotFound(run_id.to_string()))
		}
	}

	/// Returns a snapshot of `run_id`'s progress record, or `None` if the
	/// run hasn't been dispatched yet (it is still waiting in the queue —
	/// see [`Self::position`]) or its history has since been reclaimed.
	pub async fn progress(&self, run_id: &str) -> Result<Option<ProgressRecord>> {
		Ok(self.progress.get_progress(run_id).await?)
	}

	/// Returns `run_id`'s 1-based position in the pending queue, or `None`
	/// once it has been dispatched or was never enqueued.
	pub async fn position(&self, run_id: &str) -> Result<Option<usize>> {
		Ok(self.queue.get_position(run_id).await?)
	}

	/// Lists every job still waiting in the queue, in dispatch order.
	pub async fn list_queue(&self) -> Result<Vec<QueuedJob>> {
		Ok(self.queue.list_jobs().await?)
	}

	/// The singular admin view named in `spec.md` §6: the most recently
	/// dispatched running job. Use [`Self::list_running`] for a
	/// concurrency-aware view of every job in flight.
	pub async fn get_current(&self) -> Result<Option<Job>> {
		Ok(self.queue.get_current().await?)
	}

	pub async fn list_running(&self) -> Result<Vec<Job>> {
		Ok(self.queue.list_running().await?)
	}

	/// Hands back the shared scheduler so a caller (typically
	/// `reachlab-cli`) can drive its run loop on its own task, passing a
	/// `CancellationToken` it controls for graceful shutdown.
	pub fn scheduler(&self) -> Arc<Scheduler> {
		self.scheduler.clone()
	}

	/// Runs the scheduler's leader-election-and-dispatch loop until
	/// `shutdown` fires. Convenience wrapper around
	/// `self.scheduler().run(shutdown)` for callers that don't need the
	/// `Arc<Scheduler>` handle directly.
	pub async fn run_scheduler(&self, shutdown: CancellationToken) -> reachlab_scheduler::Result<()> {
		self.scheduler.clone().run(shutdown).await
	}

	/// Reclaims stale advisory locks and old progress history. Intended to
	/// run on a slow, independent interval (e.g. once an hour) alongside the
	/// scheduler loop, never inline with request handling.
	pub async fn run_maintenance(&self, stale_lock_age: Duration, progress_age: Duration) -> Result<MaintenanceReport> {
		let stale_locks_reclaimed = self.lockd.cleanup_stale(stale_lock_age).await?;
		let progress_records_evicted_from_memory = self.progress.cleanup_memory(progress_age).await;
		let progress_runs_reclaimed_from_disk = self.progress.cleanup_disk(progress_age).await?;
		Ok(MaintenanceReport {
			stale_locks_reclaimed,
			progress_records_evicted_from_memory,
			progress_runs_reclaimed_from_disk,
		})
	}

	pub fn registry(&self) -> &Arc<RegistryManager> {
		&self.registry
	}
}
