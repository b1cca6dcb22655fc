use reachlab_core::{JobType, RunId};
use tokio::task::JoinSet;

use crate::error::SchedulerError;

/// What a dispatched job task reports back to the scheduler when it
/// finishes, success or not — the reap step only needs enough to release
/// capacity and clear the running marker, not the full error detail (that
/// already landed in the progress record via `JobExecutor::run`).
pub(crate) struct JoinOutcome {
	pub run_id: RunId,
	pub job_type: JobType,
	pub failed: bool,
}

/// Bookkeeping for jobs currently running on the worker pool.
///
/// Tracked locally by the leader rather than derived from
/// `QueueService::list_running` on every tick: the scheduler is the only
/// writer of this process's dispatch decisions, and re-deriving counts from
/// the shared running table on every tick would mean an extra file read
/// under lock per tick for no benefit (another process's leader election
/// would also be looking at a freshly-initialized `Inflight` of its own
/// once it actually becomes leader).
#[derive(Default)]
pub(crate) struct Inflight {
	pub tasks: JoinSet<JoinOutcome>,
	pub quick_count: usize,
	pub detailed_running: bool,
}

impl Inflight {
	pub fn is_empty(&self) -> bool {
		self.tasks.is_empty()
	}

	pub fn record_dispatch(&mut self, job_type: JobType) {
		match job_type {
			JobType::Quick => self.quick_count += 1,
			JobType::Detailed => self.detailed_running = true,
		}
	}

	/// Drains every task that has already finished without blocking,
	/// releasing the capacity slot each one held.
	pub fn reap(&mut self) -> Result<Vec<JoinOutcome>, SchedulerError> {
		let mut reaped = Vec::new();
		while let Some(joined) = self.tasks.try_join_next() {
			let outcome = joined?;
			match outcome.job_type {
				JobType::Quick => self.quick_count = self.quick_count.saturating_sub(1),
				JobType::Detailed => self.detailed_running = false,
			}
			reaped.push(outcome);
		}
		Ok(reaped)
	}
}
