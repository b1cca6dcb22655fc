use std::sync::Arc;
use std::time::Duration;

use reachlab_core::{Config, Job, JobStatus, JobType};
use reachlab_executor::JobExecutor;
use reachlab_lockd::LockManager;
use reachlab_queue::QueueService;
use reachlab_registry::RegistryManager;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SchedulerError};
use crate::inflight::{Inflight, JoinOutcome};

const LEADER_LOCK_NAME: &str = "scheduler_leader";
const LEADER_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(200);

/// Outcome of a single `tick`: what finished and what, if anything, started.
/// Exposed so tests can drive the dispatch logic deterministically instead
/// of racing real sleeps.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
	pub reaped: Vec<String>,
	pub dispatched: Option<String>,
}

/// Leader-elected loop that pops jobs off the queue and hands them to the
/// worker pool, respecting the quick-concurrency cap, the quick-before-
/// detailed priority rule, and detailed-job mutual exclusion.
///
/// Only one `Scheduler` per process holds `scheduler_leader`; other
/// processes (or this one, before it wins) poll for the lock and idle.
pub struct Scheduler {
	config: Arc<Config>,
	lockd: Arc<LockManager>,
	queue: Arc<QueueService>,
	registry: Arc<RegistryManager>,
	executor: Arc<JobExecutor>,
	inflight: Mutex<Inflight>,
}

impl Scheduler {
	pub fn new(config: Arc<Config>, lockd: Arc<LockManager>, queue: Arc<QueueService>, registry: Arc<RegistryManager>, executor: Arc<JobExecutor>) -> Self {
		Self {
			config,
			lockd,
			queue,
			registry,
			executor,
			inflight: Mutex::new(Inflight::default()),
		}
	}

	/// Attempts to become the leader within `timeout`. Exposed directly so
	/// tests (and `run`) can drive leader election as a discrete step.
	pub async fn try_acquire_leadership(&self, timeout: Duration) -> Result<bool> {
		Ok(self.lockd.acquire(LEADER_LOCK_NAME, timeout).await?)
	}

	pub async fn release_leadership(&self) -> Result<bool> {
		Ok(self.lockd.release(LEADER_LOCK_NAME).await?)
	}

	/// Runs the full leader-election-then-dispatch loop until `shutdown` is
	/// triggered. Processes that lose the leadership race sleep and retry;
	/// the winner dispatches jobs until told to stop, then drains in-flight
	/// work before releasing the lock for the next process to take over.
	pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> Result<()> {
		loop {
			if shutdown.is_cancelled() {
				return Ok(());
			}

			if !self.try_acquire_leadership(LEADER_ATTEMPT_TIMEOUT).await? {
				tokio::select! {
					_ = tokio::time::sleep(Duration::from_millis(self.config.idle_backoff_ms)) => {}
					_ = shutdown.cancelled() => return Ok(()),
				}
				continue;
			}

			tracing::info!("acquired scheduler leadership");
			let result = self.lead(&shutdown).await;
			let _ = self.release_leadership().await;
			tracing::info!("released scheduler leadership");
			return result;
		}
	}

	/// The dispatch loop itself, run only while this process holds
	/// leadership. Keeps reaping and dispatching until `shutdown` fires and
	/// every in-flight job has finished.
	async fn lead(&self, shutdown: &CancellationToken) -> Result<()> {
		loop {
			let outcome = self.tick().await?;

			if shutdown.is_cancelled() && self.inflight.lock().await.is_empty() {
				return Ok(());
			}

			let busy = outcome.dispatched.is_some() || !outcome.reaped.is_empty();
			let sleep_for = if busy {
				Duration::from_millis(self.config.queue_poll_interval_ms)
			} else {
				Duration::from_millis(self.config.idle_backoff_ms)
			};

			tokio::select! {
				_ = tokio::time::sleep(sleep_for) => {}
				_ = shutdown.cancelled() => {}
			}
		}
	}

	/// Reaps finished job tasks, then dispatches at most one new job if
	/// capacity and priority rules allow it. Public so tests can step the
	/// scheduler deterministically without going through `run`'s sleeps.
	pub async fn tick(&self) -> Result<TickOutcome> {
		let reaped = self.reap_completed().await?;
		let dispatched = self.maybe_dispatch().await?;
		Ok(TickOutcome { reaped, dispatched })
	}

	async fn reap_completed(&self) -> Result<Vec<String>> {
		let outcomes = {
			let mut inflight = self.inflight.lock().await;
			inflight.reap()?
		};

		let mut reaped = Vec::with_capacity(outcomes.len());
		for JoinOutcome { run_id, job_type, failed } in outcomes {
			if job_type == JobType::Quick {
				self.registry.dscp.release(&run_id).await;
			}
			self.queue.clear_current(&run_id).await?;
			if failed {
				tracing::debug!(run_id, "dispatched job finished with a non-success outcome");
			}
			reaped.push(run_id);
		}
		Ok(reaped)
	}

	/// Looks at the head of the queue and, if concurrency and priority
	/// rules permit, pops and dispatches it. Returns the dispatched
	/// `run_id`, or `None` if nothing was eligible this tick.
	async fn maybe_dispatch(&self) -> Result<Option<String>> {
		let head = match self.queue.list_jobs().await?.into_iter().next() {
			Some(queued) => queued.job,
			None => return Ok(None),
		};

		let mut inflight = self.inflight.lock().await;
		if !self.eligible(&inflight, &head) {
			return Ok(None);
		}

		// DSCP is allocated against the peeked job's `run_id` before the
		// pop: if the pool is unexpectedly exhausted (§7 Capacity), the job
		// is left on the queue untouched and retried next tick, rather than
		// popped and then needing to be pushed back out of FIFO order.
		let dscp = if head.job_type == JobType::Quick {
			match self.registry.dscp.allocate(&head.run_id).await {
				Ok(value) => Some(value),
				Err(_) => return Ok(None),
			}
		} else {
			None
		};

		let Some(mut job) = self.queue.pop_next_if(&head.run_id).await? else {
			// The head vanished (or changed) between peek and pop, e.g. a
			// concurrent cancel. Release any DSCP we just reserved for it
			// and wait for next tick; whatever job now leads the queue
			// gets its own peek-allocate-pop cycle then.
			if head.job_type == JobType::Quick {
				self.registry.dscp.release(&head.run_id).await;
			}
			return Ok(None);
		};

		job.status = JobStatus::Starting;
		self.queue.set_current(&job).await?;
		job.status = JobStatus::Running;
		self.queue.set_current(&job).await?;

		inflight.record_dispatch(job.job_type);
		let run_id = job.run_id.clone();
		let dispatched_run_id = run_id.clone();
		let job_type = job.job_type;
		let executor = self.executor.clone();
		inflight.tasks.spawn(async move {
			let failed = executor.run(job, dscp).await.is_err();
			JoinOutcome { run_id, job_type, failed }
		});

		Ok(Some(dispatched_run_id))
	}

	/// Implements `spec.md` §4.E steps 2–3: the quick-concurrency cap,
	/// detailed-job mutual exclusion, and (when `Config::quick_priority` is
	/// set) letting in-flight quick jobs drain before starting a detailed
	/// job so it never races them for a just-about-to-be-touched router.
	fn eligible(&self, inflight: &Inflight, head: &Job) -> bool {
		match head.job_type {
			JobType::Quick => inflight.quick_count < self.config.quick_concurrency,
			JobType::Detailed => {
				if inflight.detailed_running {
					return false;
				}
				if self.config.quick_priority && inflight.quick_count > 0 {
					return false;
				}
				true
			}
		}
	}
}
