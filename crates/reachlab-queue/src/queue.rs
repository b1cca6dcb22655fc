use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reachlab_core::{Config, Job, JobStatus};
use reachlab_lockd::LockManager;

use crate::error::{QueueError, Result};
use crate::persist;
use crate::state::{CancelMarker, QueueState, QueuedJob, RunMeta, RunningState};

const LOCK_NAME: &str = "queue";

/// File-backed FIFO queue for test run jobs, serializing job submission
/// across however many `reachlab-cli` processes talk to the same
/// `queue_dir`.
pub struct QueueService {
	queue_file: PathBuf,
	current_file: PathBuf,
	run_dir: PathBuf,
	lockd: Arc<LockManager>,
	lock_timeout: Duration,
}

impl QueueService {
	pub fn new(config: &Config, lockd: Arc<LockManager>) -> Self {
		Self {
			queue_file: config.queue_dir.join("queue.json"),
			current_file: config.queue_dir.join("current.json"),
			run_dir: config.run_dir.clone(),
			lockd,
			lock_timeout: Duration::from_secs(config.lock_timeouts.host_registry),
		}
	}

	async fn lock(&self) -> Result<reachlab_lockd::LockGuard> {
		self.lockd
			.acquire_guard(LOCK_NAME, self.lock_timeout)
			.await
			.map_err(|_| QueueError::LockTimeout)
	}

	fn load(&self) -> Result<QueueState> {
		persist::load(&self.queue_file, QueueState::default)
	}

	fn save(&self, state: &QueueState) -> Result<()> {
		persist::save(&self.queue_file, state)
	}

	/// Enqueues a new job, returning its 1-based position. Re-enqueuing an
	/// existing `run_id` is a no-op that returns its current position.
	pub async fn enqueue(&self, run_id: &str, username: &str, job_type: reachlab_core::JobType, params: serde_json::Value) -> Result<usize> {
		let _guard = self.lock().await?;
		let mut state = self.load()?;

		if let Some(pos) = state.jobs.iter().position(|j| j.run_id == run_id) {
			return Ok(pos + 1);
		}

		state.jobs.push(Job::new(run_id.to_string(), username, job_type, params));
		state.updated_at = Utc::now();
		self.save(&state)?;
		Ok(state.jobs.len())
	}

	pub async fn has_user_job(&self, username: &str) -> Result<bool> {
		let _guard = self.lock().await?;
		let state = self.load()?;
		Ok(state.jobs.iter().any(|j| {
			j.username == username
				&& matches!(j.status, JobStatus::Queued | JobStatus::Starting | JobStatus::Running)
		}))
	}

	pub async fn get_position(&self, run_id: &str) -> Result<Option<usize>> {
		let _guard = self.lock().await?;
		let state = self.load()?;
		Ok(state.jobs.iter().position(|j| j.run_id == run_id).map(|i| i + 1))
	}

	/// Pops and returns the head of the queue (FIFO).
	pub async fn pop_next(&self) -> Result<Option<Job>> {
		let _guard = self.lock().await?;
		let mut state = self.load()?;
		if state.jobs.is_empty() {
			return Ok(None);
		}
		let job = state.jobs.remove(0);
		state.updated_at = Utc::now();
		self.save(&state)?;
		Ok(Some(job))
	}

	/// Pops the head of the queue only if it is still `expected_run_id`.
	///
	/// Used by callers that peeked the head to make a dispatch decision
	/// (e.g. allocating a DSCP value keyed by its `run_id`) before popping:
	/// if a concurrent cancel removed that job in the meantime, this
	/// returns `Ok(None)` instead of silently popping and returning
	/// whatever job is now at the front.
	pub async fn pop_next_if(&self, expected_run_id: &str) -> Result<Option<Job>> {
		let _guard = self.lock().await?;
		let mut state = self.load()?;
		match state.jobs.first() {
			Some(job) if job.run_id == expected_run_id => {
				let job = state.jobs.remove(0);
				state.updated_at = Utc::now();
				self.save(&state)?;
				Ok(Some(job))
			}
			_ => Ok(None),
		}
	}

	pub async fn update_status(&self, run_id: &str, status: JobStatus) -> Result<()> {
		let _guard = self.lock().await?;
		let mut state = self.load()?;
		let Some(job) = state.jobs.iter_mut().find(|j| j.run_id == run_id) else {
			return Ok(());
		};
		job.status = status;
		state.updated_at = Utc::now();
		self.save(&state)
	}

	pub async fn remove(&self, run_id: &str) -> Result<bool> {
		let _guard = self.lock().await?;
		let mut state = self.load()?;
		let before = state.jobs.len();
		state.jobs.retain(|j| j.run_id != run_id);
		let removed = state.jobs.len() != before;
		if removed {
			state.updated_at = Utc::now();
			self.save(&state)?;
		}
		Ok(removed)
	}

	pub async fn list_jobs(&self) -> Result<Vec<QueuedJob>> {
		let _guard = self.lock().await?;
		let state = self.load()?;
		Ok(state
			.jobs
			.into_iter()
			.enumerate()
			.map(|(idx, job)| QueuedJob { job, position: idx + 1 })
			.collect())
	}

	fn load_running(&self) -> Result<RunningState> {
		persist::load(&self.current_file, RunningState::default)
	}

	fn save_running(&self, state: &RunningState) -> Result<()> {
		persist::save(&self.current_file, state)
	}

	/// Records `job` as running. Upserts by `run_id`: dispatching the same
	/// run again (e.g. a retry) updates its entry in place rather than
	/// duplicating it.
	pub async fn set_current(&self, job: &Job) -> Result<()> {
		let _guard = self.lock().await?;
		let mut state = self.load_running()?;
		match state.jobs.iter_mut().find(|j| j.run_id == job.run_id) {
			Some(existing) => *existing = job.clone(),
			None => state.jobs.push(job.clone()),
		}
		self.save_running(&state)
	}

	/// Returns the most recently dispatched running job, for the simple
	/// single-job admin view named in `spec.md` §6. Use [`Self::list_running`]
	/// or [`Self::get_running`] for concurrency-aware callers.
	pub async fn get_current(&self) -> Result<Option<Job>> {
		let _guard = self.lock().await?;
		Ok(self.load_running()?.jobs.into_iter().next_back())
	}

	/// Returns the running job matching `run_id`, if any.
	pub async fn get_running(&self, run_id: &str) -> Result<Option<Job>> {
		let _guard = self.lock().await?;
		Ok(self.load_running()?.jobs.into_iter().find(|j| j.run_id == run_id))
	}

	/// Returns every currently-running job, in dispatch order.
	pub async fn list_running(&self) -> Result<Vec<Job>> {
		let _guard = self.lock().await?;
		Ok(self.load_running()?.jobs)
	}

	/// True iff `username` has a job in the running table, read from
	/// `current.json` under the same cross-process file lock as every
	/// other queue operation. Unlike an in-memory active-run map, this is
	/// visible to a short-lived process (e.g. a `submit` CLI invocation)
	/// distinct from the long-lived process that actually dispatched the
	/// job.
	pub async fn has_running_user_job(&self, username: &str) -> Result<bool> {
		let _guard = self.lock().await?;
		Ok(self.load_running()?.jobs.iter().any(|j| j.username == username))
	}

	/// Removes `run_id` from the running set once its executor has
	/// finished (successfully, with failure, or cancelled).
	pub async fn clear_current(&self, run_id: &str) -> Result<()> {
		let _guard = self.lock().await?;
		let mut state = self.load_running()?;
		state.jobs.retain(|j| j.run_id != run_id);
		self.save_running(&state)
	}

	/// Requests cancellation of `run_id`.
	///
	/// If the job is still queued, it is removed from the queue and a
	/// `cancel.json` + `run.json` pair is written to its run directory for
	/// history/detail views. If it is the currently running job, only its
	/// `cancel_requested` flag is set (the executor polls this at its
	/// cancellation checkpoints). Returns `false` if `run_id` is neither
	/// queued nor current.
	pub async fn request_cancel(&self, run_id: &str, cancelled_by: Option<&str>) -> Result<bool> {
		{
			let _guard = self.lock().await?;
			let mut state = self.load()?;
			if let Some(pos) = state.jobs.iter().position(|j| j.run_id == run_id) {
				let removed = state.jobs.remove(pos);
				state.updated_at = Utc::now();
				self.save(&state)?;
				self.write_cancel_artifacts(&removed, cancelled_by)?;
				return Ok(true);
			}
		}

		let _guard = self.lock().await?;
		let mut state = self.load_running()?;
		let Some(current) = state.jobs.iter_mut().find(|j| j.run_id == run_id) else {
			return Ok(false);
		};

		current.cancel_requested = true;
		current.cancel_requested_by = cancelled_by.map(String::from);
		current.cancel_requested_at = Some(Utc::now());
		let cancelled_at = current.cancel_requested_at.unwrap();
		self.save_running(&state)?;

		let marker = CancelMarker {
			run_id: run_id.to_string(),
			cancelled_by: cancelled_by.unwrap_or("admin").to_string(),
			cancelled_at,
		};
		self.write_run_file(run_id, "cancel.json", &marker)?;
		Ok(true)
	}

	fn write_cancel_artifacts(&self, job: &Job, cancelled_by: Option<&str>) -> Result<()> {
		let marker = CancelMarker {
			run_id: job.run_id.clone(),
			cancelled_by: cancelled_by.unwrap_or("admin").to_string(),
			cancelled_at: Utc::now(),
		};
		self.write_run_file(&job.run_id, "cancel.json", &marker)?;

		let meta = RunMeta {
			run_id: job.run_id.clone(),
			username: job.username.clone(),
			created_at: job.created_at,
			params: job.params.clone(),
			status: JobStatus::Cancelled,
		};
		self.write_run_file(&job.run_id, "run.json", &meta)
	}

	fn write_run_file<T: serde::Serialize>(&self, run_id: &str, file_name: &str, value: &T) -> Result<()> {
		let path = self.run_dir.join(run_id).join(file_name);
		persist::save(&path, value)
	}
}
