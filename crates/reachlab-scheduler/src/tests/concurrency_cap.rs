use std::time::Duration;

use reachlab_core::JobType;

use super::{build_harness, enqueue};

#[tokio::test]
async fn quick_concurrency_cap_gates_the_second_job() {
	let harness = build_harness(1);
	enqueue(&harness, "q1", "alice", JobType::Quick).await;
	enqueue(&harness, "q2", "bob", JobType::Quick).await;

	let first = harness.scheduler.tick().await.unwrap();
	assert_eq!(first.dispatched.as_deref(), Some("q1"));

	// Cap is 1 and q1 is still in flight: q2 must stay queued.
	let second = harness.scheduler.tick().await.unwrap();
	assert_eq!(second.dispatched, None);

	harness.test_runner.release();
	tokio::time::sleep(Duration::from_millis(50)).await;

	let third = harness.scheduler.tick().await.unwrap();
	assert!(third.reaped.contains(&"q1".to_string()));
	assert_eq!(third.dispatched.as_deref(), Some("q2"));
}
