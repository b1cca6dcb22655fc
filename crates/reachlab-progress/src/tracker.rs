use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use reachlab_core::{Config, PhaseEntry, ProgressRecord, RunId};
use tokio::sync::Mutex;

use crate::error::{ProgressError, Result};
use crate::mirror::RunMirror;

const TERMINAL_PHASES: [&str; 3] = ["COMPLETE", "FAILED", "ERROR"];

/// Single in-memory authoritative map of `run_id -> ProgressRecord`, mirrored
/// to per-run files for cross-process streaming consumers.
///
/// All mutation goes through the crate-internal mutex, so concurrent
/// `log_phase` calls from multiple tasks/threads are serialized: the stored
/// `phases` list is always observed with monotonic non-decreasing
/// timestamps, and readers never see a partial append.
pub struct ProgressTracker {
	progress_dir: PathBuf,
	default_expected_steps: usize,
	records: Mutex<HashMap<RunId, ProgressRecord>>,
	active_runs: Mutex<HashMap<String, RunId>>,
}

impl ProgressTracker {
	pub fn new(config: &Config) -> Self {
		Self {
			progress_dir: config.progress_dir.clone(),
			default_expected_steps: config.expected_phases.len().max(1),
			records: Mutex::new(HashMap::new()),
			active_runs: Mutex::new(HashMap::new()),
		}
	}

	fn mirror(&self, run_id: &str) -> RunMirror {
		RunMirror::new(&self.progress_dir, run_id)
	}

	/// Starts tracking a new run. `expected_steps` defaults to the
	/// configured phase-count constant when `None`.
	pub async fn start_run(&self, run_id: &str, username: &str, expected_steps: Option<usize>) -> Result<()> {
		let record = ProgressRecord::new(
			run_id.to_string(),
			username,
			expected_steps.unwrap_or(self.default_expected_steps),
		);
		self.mirror(run_id).write_snapshot(&record)?;
		self.records.lock().await.insert(run_id.to_string(), record);
		Ok(())
	}

	/// Updates `expected_steps` mid-run, used when a job discovers its
	/// actual phase count (e.g. number of routers it touches) after
	/// `start_run`.
	pub async fn set_expected_steps(&self, run_id: &str, expected_steps: usize) -> Result<()> {
		let mut records = self.records.lock().await;
		let record = records.get_mut(run_id).ok_or_else(|| ProgressError::NotFound(run_id.to_string()))?;
		record.expected_steps = expected_steps.max(1);
		recompute_progress(record);
		self.mirror(run_id).write_snapshot(record)?;
		Ok(())
	}

	/// Appends a phase entry, updates `current_phase` and
	/// `overall_progress`, and mirrors the change to `timing.log`,
	/// `audit.log`, and `progress.json`.
	pub async fn log_phase(
		&self,
		run_id: &str,
		phase: &str,
		message: Option<&str>,
		details: Option<serde_json::Value>,
	) -> Result<()> {
		let mut records = self.records.lock().await;
		let record = records.get_mut(run_id).ok_or_else(|| ProgressError::NotFound(run_id.to_string()))?;

		let entry = PhaseEntry {
			phase: phase.to_string(),
			timestamp: Utc::now(),
			message: message.map(String::from),
			details,
		};
		record.current_phase = Some(phase.to_string());
		let mirror = self.mirror(run_id);
		mirror.append_phase(&entry)?;
		record.phases.push(entry);

		if TERMINAL_PHASES.contains(&phase) {
			record.complete = true;
			record.overall_progress = 100.0;
			if record.success.is_none() {
				record.success = Some(phase == "COMPLETE");
			}
		} else {
			recompute_progress(record);
		}

		mirror.write_snapshot(record)?;
		tracing::debug!(run_id, phase, "logged progress phase");
		Ok(())
	}

	/// Canonical terminator for a run: logs a final `COMPLETE`/`FAILED`
	/// phase, derives `pdf_url` from `pdf_file` when present, appends a
	/// `TOTAL` phase recording elapsed wall-clock time, and clears any
	/// active-run-for-user mapping pointing at this run.
	pub async fn mark_complete(
		&self,
		run_id: &str,
		success: bool,
		pdf_file: Option<&str>,
		error: Option<&str>,
	) -> Result<()> {
		let phase = if success { "COMPLETE" } else { "FAILED" };
		self.log_phase(run_id, phase, error, None).await?;

		let mut records = self.records.lock().await;
		let record = records.get_mut(run_id).ok_or_else(|| ProgressError::NotFound(run_id.to_string()))?;
		record.success = Some(success);
		record.error = error.map(String::from);
		record.pdf_url = pdf_file.map(derive_pdf_url);

		let elapsed = (Utc::now() - record.start_time).num_milliseconds().max(0);
		let total_entry = PhaseEntry {
			phase: "TOTAL".to_string(),
			timestamp: Utc::now(),
			message: Some(format!("{elapsed}ms elapsed")),
			details: None,
		};
		let mirror = self.mirror(run_id);
		mirror.append_phase(&total_entry)?;
		record.phases.push(total_entry);
		mirror.write_snapshot(record)?;

		let username = record.username.clone();
		drop(records);

		let mut active = self.active_runs.lock().await;
		if active.get(&username).map(String::as_str) == Some(run_id) {
			active.remove(&username);
		}
		Ok(())
	}

	/// Returns a snapshot of the in-memory record, falling back to the
	/// on-disk `progress.json` mirror if this process has no live record
	/// for `run_id` (e.g. a restarted scheduler process, or a reader with
	/// no shared memory).
	pub async fn get_progress(&self, run_id: &str) -> Result<Option<ProgressRecord>> {
		if let Some(record) = self.records.lock().await.get(run_id) {
			return Ok(Some(record.clone()));
		}
		self.mirror(run_id).read_snapshot()
	}

	pub async fn set_active_run_for_user(&self, username: &str, run_id: &str) {
		self.active_runs.lock().await.insert(username.to_string(), run_id.to_string());
	}

	pub async fn get_active_run_for_user(&self, username: &str) -> Option<RunId> {
		self.active_runs.lock().await.get(username).cloned()
	}

	pub async fn clear_active_run_for_user(&self, username: &str) {
		self.active_runs.lock().await.remove(username);
	}

	/// Drops in-memory records whose `start_time` is older than `max_age`.
	/// The file mirrors are untouched; see `cleanup_disk` for those.
	pub async fn cleanup_memory(&self, max_age: Duration) -> usize {
		let cutoff = Utc::now() - chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::zero());
		let mut records = self.records.lock().await;
		let before = records.len();
		records.retain(|_, record| record.start_time > cutoff);
		before - records.len()
	}

	/// Removes per-run directories under `progress_dir` whose
	/// `progress.json` mtime is older than `max_age`. Returns the run ids
	/// reclaimed.
	pub async fn cleanup_disk(&self, max_age: Duration) -> Result<Vec<String>> {
		let progress_dir = self.progress_dir.clone();
		tokio::task::spawn_blocking(move || cleanup_disk_blocking(&progress_dir, max_age))
			.await
			.expect("cleanup_disk task panicked")
	}
}

fn recompute_progress(record: &mut ProgressRecord) {
	let completed = record.phases.len();
	let pct = 100.0 * completed as f64 / record.expected_steps as f64;
	// Non-decreasing until a terminal phase takes over (P8): never let a
	// growing `expected_steps` divisor pull the reported percentage back down.
	record.overall_progress = pct.min(99.0).max(record.overall_progress);
}

fn derive_pdf_url(pdf_file: &str) -> String {
	let name = std::path::Path::new(pdf_file)
		.file_name()
		.and_then(|n| n.to_str())
		.unwrap_or(pdf_file);
	format!("/reports/{name}")
}

fn cleanup_disk_blocking(progress_dir: &std::path::Path, max_age: Duration) -> Result<Vec<String>> {
	let mut reclaimed = Vec::new();
	let entries = match std::fs::read_dir(progress_dir) {
		Ok(entries) => entries,
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(reclaimed),
		Err(error) => {
			return Err(ProgressError::Io {
				path: progress_dir.to_path_buf(),
				error,
			})
		}
	};

	for entry in entries {
		let entry = entry.map_err(|error| ProgressError::Io {
			path: progress_dir.to_path_buf(),
			error,
		})?;
		let run_dir = entry.path();
		if !run_dir.is_dir() {
			continue;
		}
		let snapshot = run_dir.join("progress.json");
		let age = std::fs::metadata(&snapshot)
			.ok()
			.and_then(|m| m.modified().ok())
			.and_then(|m| m.elapsed().ok());
		let Some(age) = age else { continue };
		if age < max_age {
			continue;
		}
		if std::fs::remove_dir_all(&run_dir).is_ok()
			&& let Some(name) = run_dir.file_name().and_then(|n| n.to_str())
		{
			reclaimed.push(name.to_string());
		}
	}
	Ok(reclaimed)
}
