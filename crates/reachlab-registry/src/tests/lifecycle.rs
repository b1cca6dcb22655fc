use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use reachlab_core::Config;

use crate::RegistryManager;

#[tokio::test]
async fn unregister_host_fails_while_leases_outstanding() {
	let dir = TempDir::new().unwrap();
	let config = Config::rooted_at(dir.path());
	let lockd = Arc::new(reachlab_lockd::LockManager::new(
		config.lock_dir.clone(),
		Duration::from_millis(5),
	));
	let registry = RegistryManager::new(&config, lockd).unwrap();

	registry
		.hosts
		.check_and_register_host("qtest-1-0", "10.100.0.1/24", "router1", "aa:bb:cc:dd:ee:00")
		.await
		.unwrap();
	registry
		.host_leases
		.acquire("run-1", "qtest-1-0", "quick", "router1", Some(5))
		.await
		.unwrap();

	assert!(registry.unregister_host("qtest-1-0").await.is_err());

	registry.host_leases.release("run-1", "qtest-1-0").await.unwrap();
	assert!(registry.unregister_host("qtest-1-0").await.is_ok());
	assert!(registry.hosts.get_host_info("qtest-1-0").await.is_none());
}

#[tokio::test]
async fn acquire_host_lease_fails_on_an_unregistered_host() {
	let dir = TempDir::new().unwrap();
	let config = Config::rooted_at(dir.path());
	let lockd = Arc::new(reachlab_lockd::LockManager::new(
		config.lock_dir.clone(),
		Duration::from_millis(5),
	));
	let registry = RegistryManager::new(&config, lockd).unwrap();

	let err = registry
		.acquire_host_lease("run-1", "ghost-host", "quick", "router1", Some(5))
		.await
		.unwrap_err();
	assert!(matches!(err, crate::RegistryError::NotFound(host) if host == "ghost-host"));

	// The bypassed call site this wraps would have happily inserted the
	// lease anyway; confirm no entry was created.
	assert_eq!(registry.host_leases.lease_count("ghost-host").await, 0);
}

#[tokio::test]
async fn acquire_neighbor_lease_fails_on_an_unregistered_host() {
	let dir = TempDir::new().unwrap();
	let config = Config::rooted_at(dir.path());
	let lockd = Arc::new(reachlab_lockd::LockManager::new(
		config.lock_dir.clone(),
		Duration::from_millis(5),
	));
	let registry = RegistryManager::new(&config, lockd).unwrap();

	let err = registry
		.acquire_neighbor_lease("run-1", "ghost-host", "10.0.0.5")
		.await
		.unwrap_err();
	assert!(matches!(err, crate::RegistryError::NotFound(host) if host == "ghost-host"));
}

#[tokio::test]
async fn acquire_host_lease_succeeds_once_the_host_is_registered() {
	let dir = TempDir::new().unwrap();
	let config = Config::rooted_at(dir.path());
	let lockd = Arc::new(reachlab_lockd::LockManager::new(
		config.lock_dir.clone(),
		Duration::from_millis(5),
	));
	let registry = RegistryManager::new(&config, lockd).unwrap();

	registry
		.hosts
		.check_and_register_host("qtest-2-0", "10.100.0.2/24", "router1", "aa:bb:cc:dd:ee:01")
		.await
		.unwrap();

	let count = registry
		.acquire_host_lease("run-1", "qtest-2-0", "quick", "router1", Some(5))
		.await
		.unwrap();
	assert_eq!(count, 1);
}
