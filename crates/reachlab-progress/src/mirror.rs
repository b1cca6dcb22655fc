use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use reachlab_core::{PhaseEntry, ProgressRecord};

use crate::error::{ProgressError, Result};

/// File projection of a single run's progress, written alongside the
/// in-memory record for cross-process / streaming consumers.
///
/// `timing.log` and `audit.log` are append-only: the tracker must never
/// rewrite them, only add a line per phase, so a `tail -f` reader never
/// sees a line disappear. `progress.json` is the only file replaced
/// atomically (temp + rename) since streaming endpoints re-read it whole.
pub struct RunMirror {
	dir: PathBuf,
}

impl RunMirror {
	pub fn new(progress_dir: &Path, run_id: &str) -> Self {
		Self {
			dir: progress_dir.join(run_id),
		}
	}

	fn ensure_dir(&self) -> Result<()> {
		std::fs::create_dir_all(&self.dir).map_err(|error| ProgressError::Io {
			path: self.dir.clone(),
			error,
		})
	}

	pub fn append_phase(&self, entry: &PhaseEntry) -> Result<()> {
		self.ensure_dir()?;
		self.append_timing_line(entry)?;
		self.append_audit_line(entry)
	}

	fn append_timing_line(&self, entry: &PhaseEntry) -> Result<()> {
		let path = self.dir.join("timing.log");
		let line = match &entry.message {
			Some(message) => format!("{} {} {}\n", entry.timestamp.to_rfc3339(), entry.phase, message),
			None => format!("{} {}\n", entry.timestamp.to_rfc3339(), entry.phase),
		};
		append(&path, &line)
	}

	fn append_audit_line(&self, entry: &PhaseEntry) -> Result<()> {
		let path = self.dir.join("audit.log");
		let mut line = serde_json::to_string(entry).expect("phase entry is always serializable");
		line.push('\n');
		append(&path, &line)
	}

	/// Atomically replaces `progress.json` with a snapshot of `record`.
	pub fn write_snapshot(&self, record: &ProgressRecord) -> Result<()> {
		self.ensure_dir()?;
		let path = self.dir.join("progress.json");
		let tmp = path.with_extension("json.tmp");
		let text = serde_json::to_string_pretty(record).expect("progress record is always serializable");
		std::fs::write(&tmp, text).map_err(|error| ProgressError::Io {
			path: tmp.clone(),
			error,
		})?;
		std::fs::rename(&tmp, &path).map_err(|error| ProgressError::Io { path, error })
	}

	/// Reads back `progress.json`, used when a run's in-memory record is
	/// absent (process restarted since the run started, or a reader in a
	/// different process with no shared memory).
	pub fn read_snapshot(&self) -> Result<Option<ProgressRecord>> {
		let path = self.dir.join("progress.json");
		match std::fs::read_to_string(&path) {
			Ok(text) => serde_json::from_str(&text)
				.map(Some)
				.map_err(|_| ProgressError::NotFound(self.dir.display().to_string())),
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(error) => Err(ProgressError::Io { path, error }),
		}
	}
}

fn append(path: &Path, line: &str) -> Result<()> {
	let mut file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.map_err(|error| ProgressError::Io {
			path: path.to_path_buf(),
			error,
		})?;
	file.write_all(line.as_bytes()).map_err(|error| ProgressError::Io {
		path: path.to_path_buf(),
		error,
	})
}
