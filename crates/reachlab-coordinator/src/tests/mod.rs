mod fakes;

use std::sync::Arc;

use reachlab_core::Config;
use tempfile::TempDir;

use crate::Coordinator;
use fakes::{ImmediateTestRunner, NoopHostBackend};

pub(crate) struct Harness {
	pub coordinator: Coordinator,
	dir: TempDir,
}

impl Harness {
	pub(crate) fn dir(&self) -> &std::path::Path {
		self.dir.path()
	}
}

pub(crate) fn build_coordinator() -> Harness {
	let dir = TempDir::new().unwrap();
	let config = Arc::new(Config::rooted_at(dir.path()));
	let coordinator = Coordinator::new(config, Arc::new(ImmediateTestRunner), Arc::new(NoopHostBackend)).unwrap();
	Harness { coordinator, dir }
}

/// Builds a second, independent `Coordinator` rooted at an existing
/// workspace directory — its own fresh in-process state (progress tracker,
/// active-run map) but sharing the same `queue_dir`/`lock_dir` on disk.
/// Stands in for a second OS process (e.g. a short-lived `reachlab submit`
/// invocation next to the long-lived `run` daemon) talking to the same
/// workspace.
pub(crate) fn coordinator_at(dir: &std::path::Path) -> Coordinator {
	let config = Arc::new(Config::rooted_at(dir));
	Coordinator::new(config, Arc::new(ImmediateTestRunner), Arc::new(NoopHostBackend)).unwrap()
}

pub(crate) fn bare_params() -> serde_json::Value {
	serde_json::json!({ "routers": [] })
}
