use reachlab_core::JobType;
use serde_json::json;

use super::{temp_dir, test_service};

#[tokio::test]
async fn enqueue_returns_one_based_position() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	let pos1 = queue.enqueue("run-1", "alice", JobType::Quick, json!({})).await.unwrap();
	let pos2 = queue.enqueue("run-2", "bob", JobType::Quick, json!({})).await.unwrap();

	assert_eq!(pos1, 1);
	assert_eq!(pos2, 2);
}

#[tokio::test]
async fn enqueue_is_idempotent_for_the_same_run_id() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	queue.enqueue("run-1", "alice", JobType::Quick, json!({})).await.unwrap();
	let pos = queue.enqueue("run-1", "alice", JobType::Quick, json!({})).await.unwrap();
	assert_eq!(pos, 1);

	let jobs = queue.list_jobs().await.unwrap();
	assert_eq!(jobs.len(), 1);
}

#[tokio::test]
async fn pop_next_is_fifo() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	queue.enqueue("run-1", "alice", JobType::Quick, json!({})).await.unwrap();
	queue.enqueue("run-2", "bob", JobType::Quick, json!({})).await.unwrap();

	let first = queue.pop_next().await.unwrap().unwrap();
	assert_eq!(first.run_id, "run-1");

	let second = queue.pop_next().await.unwrap().unwrap();
	assert_eq!(second.run_id, "run-2");

	assert!(queue.pop_next().await.unwrap().is_none());
}

#[tokio::test]
async fn has_user_job_reflects_active_statuses_only() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	queue.enqueue("run-1", "alice", JobType::Quick, json!({})).await.unwrap();
	assert!(queue.has_user_job("alice").await.unwrap());
	assert!(!queue.has_user_job("bob").await.unwrap());

	queue.update_status("run-1", reachlab_core::JobStatus::Complete).await.unwrap();
	assert!(!queue.has_user_job("alice").await.unwrap());
}

#[tokio::test]
async fn current_marker_round_trips() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	assert!(queue.get_current().await.unwrap().is_none());

	let job = reachlab_core::Job::new("run-1".to_string(), "alice", JobType::Quick, json!({}));
	queue.set_current(&job).await.unwrap();

	let current = queue.get_current().await.unwrap().unwrap();
	assert_eq!(current.run_id, "run-1");

	queue.clear_current("run-1").await.unwrap();
	assert!(queue.get_current().await.unwrap().is_none());
}

#[tokio::test]
async fn running_state_tracks_several_concurrent_jobs_independently() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	let q1 = reachlab_core::Job::new("run-q1".to_string(), "alice", JobType::Quick, json!({}));
	let q2 = reachlab_core::Job::new("run-q2".to_string(), "bob", JobType::Quick, json!({}));
	queue.set_current(&q1).await.unwrap();
	queue.set_current(&q2).await.unwrap();

	let running = queue.list_running().await.unwrap();
	assert_eq!(running.len(), 2);

	assert_eq!(queue.get_running("run-q1").await.unwrap().unwrap().run_id, "run-q1");
	assert_eq!(queue.get_running("run-q2").await.unwrap().unwrap().run_id, "run-q2");

	// The singular admin view surfaces the most recently dispatched job.
	assert_eq!(queue.get_current().await.unwrap().unwrap().run_id, "run-q2");

	queue.clear_current("run-q1").await.unwrap();
	let running = queue.list_running().await.unwrap();
	assert_eq!(running.len(), 1);
	assert_eq!(running[0].run_id, "run-q2");
}

#[tokio::test]
async fn pop_next_if_refuses_when_head_no_longer_matches() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	queue.enqueue("run-1", "alice", JobType::Quick, json!({})).await.unwrap();
	queue.enqueue("run-2", "bob", JobType::Quick, json!({})).await.unwrap();

	// A scheduler peeked "run-1" as the head, but it was cancelled out from
	// under it (e.g. by a concurrent `request_cancel`) before the pop.
	queue.remove("run-1").await.unwrap();

	let popped = queue.pop_next_if("run-1").await.unwrap();
	assert!(popped.is_none(), "must not silently pop a different job than expected");

	// "run-2" is still there, untouched, for the next peek-then-pop cycle.
	let jobs = queue.list_jobs().await.unwrap();
	assert_eq!(jobs.len(), 1);
	assert_eq!(jobs[0].job.run_id, "run-2");
}

#[tokio::test]
async fn pop_next_if_pops_when_head_matches() {
	let dir = temp_dir();
	let queue = test_service(dir.path());

	queue.enqueue("run-1", "alice", JobType::Quick, json!({})).await.unwrap();
	let popped = queue.pop_next_if("run-1").await.unwrap();
	assert_eq!(popped.unwrap().run_id, "run-1");
	assert!(queue.list_jobs().await.unwrap().is_empty());
}
