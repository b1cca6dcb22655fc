use reachlab_core::JobType;
use serde_json::json;

use super::{temp_dir, test_service};

#[tokio::test]
async fn request_cancel_removes_queued_job_and_writes_marker() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	queue.enqueue("run-1", "alice", JobType::Quick, json!({})).await.unwrap();
	queue.enqueue("run-2", "bob", JobType::Quick, json!({})).await.unwrap();

	let cancelled = queue.request_cancel("run-2", Some("admin")).await.unwrap();
	assert!(cancelled);

	let jobs = queue.list_jobs().await.unwrap();
	assert_eq!(jobs.len(), 1);
	assert_eq!(jobs[0].job.run_id, "run-1");

	let marker_path = dir.path().join("runs").join("run-2").join("cancel.json");
	assert!(marker_path.exists());
	let meta_path = dir.path().join("runs").join("run-2").join("run.json");
	assert!(meta_path.exists());
}

#[tokio::test]
async fn request_cancel_sets_flag_on_current_job() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	let job = reachlab_core::Job::new("run-1".to_string(), "alice", JobType::Quick, json!({}));
	queue.set_current(&job).await.unwrap();

	let cancelled = queue.request_cancel("run-1", Some("alice")).await.unwrap();
	assert!(cancelled);

	let current = queue.get_current().await.unwrap().unwrap();
	assert!(current.cancel_requested);
	assert_eq!(current.cancel_requested_by.as_deref(), Some("alice"));

	let marker_path = dir.path().join("runs").join("run-1").join("cancel.json");
	assert!(marker_path.exists());
}

#[tokio::test]
async fn request_cancel_returns_false_for_unknown_run() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	assert!(!queue.request_cancel("ghost", None).await.unwrap());
}
