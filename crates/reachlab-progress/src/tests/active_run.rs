use super::{temp_dir, test_tracker};

#[tokio::test]
async fn active_run_round_trips() {
	let dir = temp_dir();
	let tracker = test_tracker(dir.path());

	assert!(tracker.get_active_run_for_user("alice").await.is_none());

	tracker.set_active_run_for_user("alice", "run-1").await;
	assert_eq!(tracker.get_active_run_for_user("alice").await.as_deref(), Some("run-1"));

	tracker.clear_active_run_for_user("alice").await;
	assert!(tracker.get_active_run_for_user("alice").await.is_none());
}

#[tokio::test]
async fn mark_complete_clears_active_run_mapping() {
	let dir = temp_dir();
	let tracker = test_tracker(dir.path());

	tracker.start_run("run-1", "alice", Some(2)).await.unwrap();
	tracker.set_active_run_for_user("alice", "run-1").await;

	tracker.mark_complete("run-1", true, None, None).await.unwrap();

	assert!(tracker.get_active_run_for_user("alice").await.is_none());
}

#[tokio::test]
async fn mark_complete_does_not_clear_a_different_users_active_run() {
	let dir = temp_dir();
	let tracker = test_tracker(dir.path());

	tracker.start_run("run-1", "alice", Some(2)).await.unwrap();
	tracker.set_active_run_for_user("bob", "run-2").await;

	tracker.mark_complete("run-1", true, None, None).await.unwrap();

	assert_eq!(tracker.get_active_run_for_user("bob").await.as_deref(), Some("run-2"));
}
