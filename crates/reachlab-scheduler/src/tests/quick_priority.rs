use std::time::Duration;

use reachlab_core::JobType;

use super::{build_harness, enqueue};

#[tokio::test]
async fn detailed_job_waits_for_running_quicks_to_drain() {
	let harness = build_harness(4);
	enqueue(&harness, "q1", "alice", JobType::Quick).await;

	let first = harness.scheduler.tick().await.unwrap();
	assert_eq!(first.dispatched.as_deref(), Some("q1"));

	enqueue(&harness, "d1", "bob", JobType::Detailed).await;

	// q1 is still running: the queued detailed job must not jump ahead of
	// it, since it would immediately contend for q1's routers.
	let second = harness.scheduler.tick().await.unwrap();
	assert_eq!(second.dispatched, None);

	harness.test_runner.release();
	tokio::time::sleep(Duration::from_millis(50)).await;

	// Once q1 drains, d1 is free to dispatch in the very same tick that
	// reaps it.
	let third = harness.scheduler.tick().await.unwrap();
	assert!(third.reaped.contains(&"q1".to_string()));
	assert_eq!(third.dispatched.as_deref(), Some("d1"));
}
