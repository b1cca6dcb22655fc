use std::time::Duration;

use reachlab_core::JobType;

use super::{build_harness, enqueue};

#[tokio::test]
async fn second_detailed_job_waits_for_the_first_to_finish() {
	let harness = build_harness(4);
	enqueue(&harness, "d1", "alice", JobType::Detailed).await;
	enqueue(&harness, "d2", "bob", JobType::Detailed).await;

	let first = harness.scheduler.tick().await.unwrap();
	assert_eq!(first.dispatched.as_deref(), Some("d1"));

	// Detailed jobs are mutually exclusive with each other regardless of
	// the quick-concurrency cap.
	let second = harness.scheduler.tick().await.unwrap();
	assert_eq!(second.dispatched, None);

	harness.test_runner.release();
	tokio::time::sleep(Duration::from_millis(50)).await;

	let third = harness.scheduler.tick().await.unwrap();
	assert!(third.reaped.contains(&"d1".to_string()));
	assert_eq!(third.dispatched.as_deref(), Some("d2"));
}
