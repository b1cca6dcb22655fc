use std::collections::HashMap;
use std::time::Duration;

use reachlab_core::{Counters, Job};

use crate::error::{ExecutorError, Result};
use crate::executor::JobExecutor;
use crate::plan::JobPlan;

#[derive(Default)]
struct Acquired {
	leases: Vec<String>,
	registered_hosts: Vec<String>,
	created_hosts: Vec<String>,
	destinations_up: Vec<String>,
}

/// Runs a detailed job: exclusive access to every router in its set for the
/// duration of the measurement, acquired atomically so two detailed jobs
/// (or a detailed and a quick job waiting on the same router) never
/// deadlock each other.
pub(crate) async fn run(ctx: &JobExecutor, job: &Job) -> Result<()> {
	let plan = JobPlan::parse(job)?;
	let atomic_timeout = Duration::from_secs(ctx.config.lock_timeouts.router_lock_atomic);

	ctx.progress.log_phase(&job.run_id, "INIT", None, None).await?;
	ctx.progress
		.log_phase(&job.run_id, "ROUTER_LOCK", Some("acquiring all router locks atomically"), None)
		.await?;

	let lock_set = match ctx.registry.router_locks.all_router_locks(&plan.routers).await {
		Ok(set) => set,
		Err(error) => {
			tracing::warn!(run_id = %job.run_id, %error, "failed to acquire all router locks");
			return Err(ExecutorError::LockTimeout);
		}
	};

	let mut acquired = Acquired::default();
	let result = run_inner(ctx, job, &plan, &mut acquired).await;

	// Releasing source leases happens regardless of outcome: a failed run
	// still held leases that must not outlive it.
	if let Err(error) = &result {
		tracing::warn!(run_id = %job.run_id, %error, "detailed job failed, unwinding acquired resources");
		unwind(ctx, job, &acquired).await;
	}

	// Dropping `lock_set` here releases every router lock atomically,
	// waking any quick job blocked in `wait_for_router` on one of them.
	drop(lock_set);

	result
}

async fn run_inner(ctx: &JobExecutor, job: &Job, plan: &JobPlan, acquired: &mut Acquired) -> Result<()> {
	ctx.check_cancelled(&job.run_id).await?;
	ctx.progress.log_phase(&job.run_id, "HOST_REGISTRATION", None, None).await?;
	for router in &plan.routers {
		for host in plan.hosts_for_router(router) {
			let created = ctx
				.registry
				.hosts
				.check_and_register_host(&host.host_name, &host.primary_ip, router, &host.mac_address)
				.await?;
			if created {
				acquired.registered_hosts.push(host.host_name.clone());
				ctx.host_backend
					.create_host(&host.host_name, &host.primary_ip, router, &host.mac_address)
					.await
					.map_err(ExecutorError::HostBackend)?;
				acquired.created_hosts.push(host.host_name.clone());
			}
			ctx.registry
				.acquire_host_lease(&job.run_id, &host.host_name, "detailed", router, None)
				.await?;
			acquired.leases.push(host.host_name.clone());
		}
	}

	ctx.check_cancelled(&job.run_id).await?;
	for router in &plan.routers {
		for dest in plan.destinations_for_router(router) {
			ctx.host_backend
				.create_host(&dest.host_name, &dest.primary_ip, router, &dest.mac_address)
				.await
				.map_err(ExecutorError::HostBackend)?;
			acquired.destinations_up.push(dest.host_name.clone());
		}
	}

	ctx.check_cancelled(&job.run_id).await?;
	let mut baseline = HashMap::new();
	for router in &plan.routers {
		let counters = ctx.host_backend.read_counters(router).await.map_err(ExecutorError::HostBackend)?;
		baseline.insert(router.clone(), counters);
	}

	ctx.progress.log_phase(&job.run_id, "TEST_EXECUTION", None, None).await?;
	let outcome = ctx.run_test_watched(&job.run_id, &job.params, None).await?;
	if !outcome.success {
		return Err(ExecutorError::TestRunner("test runner reported failure".to_string()));
	}

	ctx.progress.log_phase(&job.run_id, "ANALYSIS", None, None).await?;
	let mut deltas = serde_json::Map::new();
	for router in &plan.routers {
		let final_counters = ctx.host_backend.read_counters(router).await.map_err(ExecutorError::HostBackend)?;
		let base = baseline.get(router).copied().unwrap_or_default();
		deltas.insert(router.clone(), serde_json::json!(delta(base, final_counters)));
	}
	ctx.progress
		.log_phase(&job.run_id, "ANALYSIS", Some("computed counter deltas"), Some(serde_json::Value::Object(deltas)))
		.await?;

	ctx.progress.log_phase(&job.run_id, "RULE_CLEANUP", Some("tearing down destination hosts"), None).await?;
	for host_name in acquired.destinations_up.drain(..) {
		ctx.host_backend.delete_host(&host_name).await.map_err(ExecutorError::HostBackend)?;
	}

	for host_name in acquired.leases.drain(..) {
		let (_, should_delete) = ctx.registry.host_leases.release(&job.run_id, &host_name).await?;
		if should_delete {
			ctx.host_backend.delete_host(&host_name).await.map_err(ExecutorError::HostBackend)?;
			ctx.registry.unregister_host(&host_name).await?;
		}
	}

	Ok(())
}

fn delta(base: Counters, last: Counters) -> Counters {
	Counters {
		packets: last.packets.saturating_sub(base.packets),
		bytes: last.bytes.saturating_sub(base.bytes),
	}
}

async fn unwind(ctx: &JobExecutor, job: &Job, acquired: &Acquired) {
	for host_name in &acquired.destinations_up {
		let _ = ctx.host_backend.delete_host(host_name).await;
	}

	for host_name in &acquired.leases {
		match ctx.registry.host_leases.release(&job.run_id, host_name).await {
			Ok((_, should_delete)) if should_delete => {
				let _ = ctx.host_backend.delete_host(host_name).await;
				let _ = ctx.registry.unregister_host(host_name).await;
			}
			Ok(_) => {}
			Err(error) => tracing::warn!(run_id = %job.run_id, host_name, %error, "failed to release lease during rollback"),
		}
	}

	for host_name in &acquired.registered_hosts {
		if acquired.leases.contains(host_name) {
			continue;
		}
		if acquired.created_hosts.contains(host_name) {
			let _ = ctx.host_backend.delete_host(host_name).await;
		}
		let _ = ctx.registry.unregister_host(host_name).await;
	}
}
