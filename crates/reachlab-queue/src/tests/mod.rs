mod cancellation;
mod fifo_ordering;

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use reachlab_core::Config;
use reachlab_lockd::LockManager;

use crate::queue::QueueService;

pub(crate) fn test_service(dir: &std::path::Path) -> QueueService {
	let config = Config::rooted_at(dir);
	let lockd = Arc::new(LockManager::new(config.lock_dir.clone(), Duration::from_millis(5)));
	QueueService::new(&config, lockd)
}

pub(crate) fn temp_dir() -> TempDir {
	TempDir::new().unwrap()
}
