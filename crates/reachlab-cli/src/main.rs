mod backend;
mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use backend::{LoggingHostBackend, UnconfiguredTestRunner};
use clap::Parser;
use cli::{Cli, Command};
use reachlab_core::Config;
use reachlab_coordinator::{Coordinator, CoordinatorError};
use tokio_util::sync::CancellationToken;

/// `spec.md` §6 exit codes: 0 success, 1 generic failure, 2 invalid
/// arguments, 124 timeout, 130 interrupted. Invalid-argument exits (2) are
/// handled by `clap` itself inside `Cli::parse()`, before `main` runs.
const EXIT_FAILURE: u8 = 1;
const EXIT_TIMEOUT: u8 = 124;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			tracing_subscriber::EnvFilter::new(if cli.verbose { "debug" } else { "info" })
		}))
		.init();

	let config = match &cli.config {
		Some(path) => match Config::from_file(path) {
			Ok(config) => config,
			Err(error) => {
				tracing::error!(%error, path = %path.display(), "failed to load config");
				return ExitCode::from(EXIT_FAILURE);
			}
		},
		None => Config::rooted_at(std::env::current_dir().unwrap_or_default()),
	};

	let coordinator = match Coordinator::new(Arc::new(config), Arc::new(UnconfiguredTestRunner), Arc::new(LoggingHostBackend)) {
		Ok(coordinator) => coordinator,
		Err(error) => {
			tracing::error!(%error, "failed to initialize coordinator");
			return ExitCode::from(EXIT_FAILURE);
		}
	};

	match run(coordinator, cli.command).await {
		Ok(code) => ExitCode::from(code),
		Err(error) => {
			tracing::error!(%error, "command failed");
			ExitCode::from(EXIT_FAILURE)
		}
	}
}

async fn run(coordinator: Coordinator, command: Command) -> anyhow::Result<u8> {
	match command {
		Command::Run {
			stale_lock_age_secs,
			progress_age_secs,
			maintenance_interval_secs,
		} => run_daemon(coordinator, stale_lock_age_secs, progress_age_secs, maintenance_interval_secs).await,
		Command::Submit {
			username,
			job_type,
			params,
			wait,
			timeout_secs,
		} => submit(coordinator, username, job_type, params, wait, timeout_secs).await,
		Command::Cancel { run_id, by } => cancel(coordinator, run_id, by).await,
		Command::Status { run_id } => status(coordinator, run_id).await,
		Command::Queue => queue(coordinator).await,
	}
}

/// Runs the scheduler loop and a slow maintenance sweep side by side until
/// SIGINT, then lets both drain in-flight work before returning.
async fn run_daemon(coordinator: Coordinator, stale_lock_age_secs: u64, progress_age_secs: u64, maintenance_interval_secs: u64) -> anyhow::Result<u8> {
	let shutdown = CancellationToken::new();
	let coordinator = Arc::new(coordinator);

	let scheduler_shutdown = shutdown.clone();
	let scheduler_coordinator = coordinator.clone();
	let scheduler_task = tokio::spawn(async move { scheduler_coordinator.run_scheduler(scheduler_shutdown).await });

	let maintenance_shutdown = shutdown.clone();
	let maintenance_coordinator = coordinator.clone();
	let maintenance_task = tokio::spawn(async move {
		let interval = Duration::from_secs(maintenance_interval_secs);
		let stale_lock_age = Duration::from_secs(stale_lock_age_secs);
		let progress_age = Duration::from_secs(progress_age_secs);
		loop {
			tokio::select! {
				_ = tokio::time::sleep(interval) => {}
				_ = maintenance_shutdown.cancelled() => return,
			}
			match maintenance_coordinator.run_maintenance(stale_lock_age, progress_age).await {
				Ok(report) => tracing::info!(
					reclaimed_locks = report.stale_locks_reclaimed.len(),
					evicted_memory = report.progress_records_evicted_from_memory,
					reclaimed_runs = report.progress_runs_reclaimed_from_disk.len(),
					"maintenance sweep complete"
				),
				Err(error) => tracing::warn!(%error, "maintenance sweep failed"),
			}
		}
	});

	tracing::info!("reachlab daemon started, awaiting SIGINT");
	let interrupted = tokio::signal::ctrl_c().await.is_ok();
	shutdown.cancel();

	let _ = maintenance_task.await;
	match scheduler_task.await {
		Ok(Ok(())) => {}
		Ok(Err(error)) => tracing::error!(%error, "scheduler loop exited with an error"),
		Err(error) => tracing::error!(%error, "scheduler task panicked"),
	}

	Ok(if interrupted { EXIT_INTERRUPTED } else { 0 })
}

async fn submit(coordinator: Coordinator, username: String, job_type: cli::JobTypeArg, params: String, wait: bool, timeout_secs: u64) -> anyhow::Result<u8> {
	let params: serde_json::Value = serde_json::from_str(&params)?;
	let (run_id, position) = coordinator.submit(&username, job_type.into(), params).await?;
	println!("{run_id} queued at position {position}");

	if !wait {
		return Ok(0);
	}

	let deadline = tokio::time::sleep(Duration::from_secs(timeout_secs));
	tokio::pin!(deadline);
	loop {
		if let Some(record) = coordinator.progress(&run_id).await? {
			if record.complete {
				println!("{}", serde_json::to_string_pretty(&record)?);
				return Ok(if record.success.unwrap_or(false) { 0 } else { EXIT_FAILURE });
			}
		}

		tokio::select! {
			_ = tokio::time::sleep(Duration::from_millis(500)) => {}
			() = &mut deadline => return Ok(EXIT_TIMEOUT),
			interrupted = tokio::signal::ctrl_c() => {
				if interrupted.is_ok() {
					return Ok(EXIT_INTERRUPTED);
				}
			}
		}
	}
}

async fn cancel(coordinator: Coordinator, run_id: String, by: Option<String>) -> anyhow::Result<u8> {
	match coordinator.cancel(&run_id, by.as_deref()).await {
		Ok(()) => {
			println!("cancelled {run_id}");
			Ok(0)
		}
		Err(CoordinatorError::NotFound(_)) => {
			eprintln!("no such run: {run_id}");
			Ok(EXIT_FAILURE)
		}
		Err(error) => Err(error.into()),
	}
}

async fn status(coordinator: Coordinator, run_id: String) -> anyhow::Result<u8> {
	match coordinator.progress(&run_id).await? {
		Some(record) => {
			println!("{}", serde_json::to_string_pretty(&record)?);
			Ok(0)
		}
		None => match coordinator.position(&run_id).await? {
			Some(position) => {
				println!("{run_id} is queued at position {position}");
				Ok(0)
			}
			None => {
				eprintln!("no such run: {run_id}");
				Ok(EXIT_FAILURE)
			}
		},
	}
}

async fn queue(coordinator: Coordinator) -> anyhow::Result<u8> {
	let jobs = coordinator.list_queue().await?;
	for queued in &jobs {
		println!("{:>3}  {}  {}  {:?}", queued.position, queued.job.run_id, queued.job.username, queued.job.job_type);
	}
	Ok(0)
}
