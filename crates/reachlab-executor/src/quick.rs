use std::time::Duration;

use reachlab_core::Job;

use crate::error::{ExecutorError, Result};
use crate::executor::JobExecutor;
use crate::plan::JobPlan;

/// Acquired resources tracked so a failure partway through can be unwound
/// in the executor, not the registry (the registry only provides the
/// primitives; rollback ordering and scope are the caller's job).
#[derive(Default)]
struct Acquired {
	leases: Vec<String>,
	/// Hosts this job's `check_and_register_host` call created a registry
	/// entry for, regardless of whether the physical backend call below it
	/// succeeded — an orphaned registry entry is still a leak to clean up.
	registered_hosts: Vec<String>,
	/// Subset of `registered_hosts` for which the physical backend call
	/// also succeeded, so rollback knows whether `delete_host` applies.
	created_hosts: Vec<String>,
	installed_rule_routers: Vec<String>,
}

/// Runs a quick job: parallel with other quick jobs on the same routers,
/// isolated from them by `dscp` rather than by an exclusive router lock.
pub(crate) async fn run(ctx: &JobExecutor, job: &Job, dscp: u8) -> Result<()> {
	let plan = JobPlan::parse(job)?;
	let router_timeout = Duration::from_secs(ctx.config.lock_timeouts.router_lock);

	ctx.progress.log_phase(&job.run_id, "INIT", None, None).await?;

	let mut acquired = Acquired::default();
	let result = run_inner(ctx, job, dscp, &plan, router_timeout, &mut acquired).await;

	if let Err(error) = &result {
		tracing::warn!(run_id = %job.run_id, %error, "quick job failed, unwinding acquired resources");
		unwind(ctx, job, dscp, &acquired).await;
	}

	result
}

async fn run_inner(
	ctx: &JobExecutor,
	job: &Job,
	dscp: u8,
	plan: &JobPlan,
	router_timeout: Duration,
	acquired: &mut Acquired,
) -> Result<()> {
	for router in &plan.routers {
		ctx.check_cancelled(&job.run_id).await?;

		ctx.progress
			.log_phase(&job.run_id, "ROUTER_LOCK", Some(&format!("waiting for {router}")), None)
			.await?;
		if !ctx.registry.router_locks.wait_for_router(router, router_timeout).await? {
			return Err(ExecutorError::LockTimeout);
		}

		ctx.progress.log_phase(&job.run_id, "HOST_REGISTRATION", None, None).await?;
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
				.acquire_host_lease(&job.run_id, &host.host_name, "quick", router, Some(dscp))
				.await?;
			acquired.leases.push(host.host_name.clone());
		}

		ctx.check_cancelled(&job.run_id).await?;
		ctx.progress.log_phase(&job.run_id, "RULE_INSTALL", None, None).await?;
		ctx.host_backend
			.install_rules(router, dscp)
			.await
			.map_err(ExecutorError::HostBackend)?;
		acquired.installed_rule_routers.push(router.clone());
	}

	ctx.check_cancelled(&job.run_id).await?;
	ctx.progress.log_phase(&job.run_id, "TEST_EXECUTION", None, None).await?;
	let outcome = ctx.run_test_watched(&job.run_id, &job.params, Some(dscp)).await?;
	if !outcome.success {
		return Err(ExecutorError::TestRunner("test runner reported failure".to_string()));
	}

	ctx.progress.log_phase(&job.run_id, "RULE_CLEANUP", None, None).await?;
	for router in acquired.installed_rule_routers.clone() {
		ctx.host_backend
			.remove_rules(&router, dscp)
			.await
			.map_err(ExecutorError::HostBackend)?;
	}
	acquired.installed_rule_routers.clear();

	ctx.progress.log_phase(&job.run_id, "ANALYSIS", None, Some(outcome.raw_facts.clone())).await?;

	release_leases(ctx, job, acquired).await?;
	Ok(())
}

async fn release_leases(ctx: &JobExecutor, job: &Job, acquired: &mut Acquired) -> Result<()> {
	for host_name in acquired.leases.drain(..) {
		let (_, should_delete) = ctx.registry.host_leases.release(&job.run_id, &host_name).await?;
		if should_delete {
			if let Err(error) = ctx.host_backend.delete_host(&host_name).await {
				tracing::warn!(run_id = %job.run_id, host_name, %error, "failed to tear down host after last lease released");
				continue;
			}
			ctx.registry.unregister_host(&host_name).await?;
		}
	}
	Ok(())
}

async fn unwind(ctx: &JobExecutor, job: &Job, dscp: u8, acquired: &Acquired) {
	for router in &acquired.installed_rule_routers {
		if let Err(error) = ctx.host_backend.remove_rules(router, dscp).await {
			tracing::warn!(run_id = %job.run_id, router, %error, "failed to remove rules during rollback");
		}
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

	// A host can be registered but never reach the lease-acquire call (the
	// physical create, or the acquire itself, failed partway through): it
	// has no lease to release, so clean it up directly rather than leaving
	// an orphaned registry entry or physical namespace.
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
