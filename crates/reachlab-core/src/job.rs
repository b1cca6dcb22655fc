use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RunId;

/// Lifecycle state of a submitted job.
///
/// Transitions only move forward: `Queued -> Starting -> Running ->
/// (Complete | Failed | Cancelled)`. `Cancelled` is also reachable directly
/// from `Queued` (a job cancelled before the scheduler ever picks it up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Queued,
	Starting,
	Running,
	Complete,
	Failed,
	Cancelled,
}

impl JobStatus {
	/// A status is terminal once the scheduler will never touch the job again.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Complete | Self::Failed | Self::Cancelled)
	}
}

/// Which executor flow a job runs through.
///
/// `Quick` jobs hold a single host lease and run with a concurrency cap
/// separate from `Detailed` jobs, which take an atomic set of router locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
	Quick,
	Detailed,
}

/// A single queued or running test job.
///
/// `params` is deliberately untyped: the core never interprets test
/// parameters, it only threads them through to the `TestRunner` collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
	pub run_id: RunId,
	pub username: String,
	pub job_type: JobType,
	pub status: JobStatus,
	pub created_at: DateTime<Utc>,
	pub params: serde_json::Value,
	#[serde(default)]
	pub cancel_requested: bool,
	#[serde(default)]
	pub cancel_requested_by: Option<String>,
	#[serde(default)]
	pub cancel_requested_at: Option<DateTime<Utc>>,
}

impl Job {
	pub fn new(run_id: RunId, username: impl Into<String>, job_type: JobType, params: serde_json::Value) -> Self {
		Self {
			run_id,
			username: username.into(),
			job_type,
			status: JobStatus::Queued,
			created_at: Utc::now(),
			params,
			cancel_requested: false,
			cancel_requested_by: None,
			cancel_requested_at: None,
		}
	}
}
