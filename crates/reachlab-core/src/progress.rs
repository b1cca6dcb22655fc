use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RunId;

/// One phase transition logged against a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEntry {
	pub phase: String,
	pub timestamp: DateTime<Utc>,
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// The authoritative progress state for a single run.
///
/// Owned by the progress tracker's in-memory map; the file mirrors
/// (`progress.json`, `timing.log`, `audit.log`) are a projection of this
/// struct, never the other way around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
	pub run_id: RunId,
	pub username: String,
	pub start_time: DateTime<Utc>,
	pub phases: Vec<PhaseEntry>,
	pub current_phase: Option<String>,
	pub expected_steps: usize,
	pub overall_progress: f64,
	pub complete: bool,
	pub success: Option<bool>,
	pub error: Option<String>,
	pub pdf_url: Option<String>,
}

impl ProgressRecord {
	pub fn new(run_id: RunId, username: impl Into<String>, expected_steps: usize) -> Self {
		Self {
			run_id,
			username: username.into(),
			start_time: Utc::now(),
			phases: Vec::new(),
			current_phase: None,
			expected_steps,
			overall_progress: 0.0,
			complete: false,
			success: None,
			error: None,
			pdf_url: None,
		}
	}
}
