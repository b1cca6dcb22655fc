mod active_run;

use reachlab_core::Config;
use tempfile::TempDir;

use crate::ProgressTracker;

pub(crate) fn test_tracker(dir: &std::path::Path) -> ProgressTracker {
	let config = Config::rooted_at(dir);
	ProgressTracker::new(&config)
}

pub(crate) fn temp_dir() -> TempDir {
	TempDir::new().unwrap()
}
