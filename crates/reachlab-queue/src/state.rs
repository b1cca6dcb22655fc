use chrono::{DateTime, Utc};
use reachlab_core::Job;
use serde::{Deserialize, Serialize};

/// On-disk shape of `queue.json`. `version` lets a future format change be
/// detected on load instead of silently misparsing old state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueState {
	pub version: u32,
	pub updated_at: DateTime<Utc>,
	pub jobs: Vec<Job>,
}

impl Default for QueueState {
	fn default() -> Self {
		Self {
			version: 1,
			updated_at: Utc::now(),
			jobs: Vec::new(),
		}
	}
}

/// On-disk shape of `current.json`.
///
/// The worker pool can run several quick jobs concurrently (`spec.md` §5),
/// so a single `Job` cannot represent "what's running" — this is a running
/// table keyed by insertion order, not the literally-singular marker the
/// distilled spec describes. `get_current` preserves the singular admin
/// view (the most recently dispatched job) for the §6 exposed interface;
/// `list_running`/`get_running` are the real multi-job surface the
/// scheduler and executor use for concurrency accounting and per-run
/// cancellation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunningState {
	pub jobs: Vec<Job>,
}

/// A job annotated with its 1-based position for `list_jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
	#[serde(flatten)]
	pub job: Job,
	pub position: usize,
}

/// Marker written to `<run_dir>/<run_id>/cancel.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelMarker {
	pub run_id: String,
	pub cancelled_by: String,
	pub cancelled_at: DateTime<Utc>,
}

/// Snapshot written to `<run_dir>/<run_id>/run.json` when a queued job is
/// cancelled, so history/detail views have something to read even though
/// the job was never started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
	pub run_id: String,
	pub username: String,
	pub created_at: DateTime<Utc>,
	pub params: serde_json::Value,
	pub status: reachlab_core::JobStatus,
}
