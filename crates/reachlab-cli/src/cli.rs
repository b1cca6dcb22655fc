use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "reachlab")]
#[command(about = "Submit, track, and cancel network reachability test jobs")]
#[command(version)]
pub struct Cli {
	/// Path to a JSON config file. Falls back to `Config::rooted_at` under
	/// the current directory if omitted, which is only useful for local
	/// experimentation — production deployments should always pass this.
	#[arg(long, global = true, env = "REACHLAB_CONFIG")]
	pub config: Option<PathBuf>,

	/// Raise the default log level to `debug`.
	#[arg(long, short, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Start the leader-elected scheduler loop and run until interrupted.
	Run {
		/// Seconds a held advisory lock must sit idle before `cleanup_stale` reclaims it.
		#[arg(long, default_value_t = 3600)]
		stale_lock_age_secs: u64,
		/// Seconds of progress-record age before a maintenance sweep reclaims it.
		#[arg(long, default_value_t = 86_400)]
		progress_age_secs: u64,
		/// Seconds between maintenance sweeps.
		#[arg(long, default_value_t = 3600)]
		maintenance_interval_secs: u64,
	},
	/// Submit a new job and print its run id and queue position.
	Submit {
		#[arg(long)]
		username: String,
		#[arg(long, value_enum, default_value = "quick")]
		job_type: JobTypeArg,
		/// Test parameters as a JSON object (routers/hosts/destinations).
		#[arg(long, default_value = "{}")]
		params: String,
		/// Block until the run reaches a terminal state instead of returning immediately.
		#[arg(long)]
		wait: bool,
		/// Abort with exit code 124 if `--wait` hasn't finished within this many seconds.
		#[arg(long, default_value_t = 300)]
		timeout_secs: u64,
	},
	/// Request cancellation of a queued or running job.
	Cancel {
		run_id: String,
		#[arg(long)]
		by: Option<String>,
	},
	/// Print a run's current progress record.
	Status {
		run_id: String,
	},
	/// List every job currently waiting in the queue.
	Queue,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobTypeArg {
	Quick,
	Detailed,
}

impl From<JobTypeArg> for reachlab_core::JobType {
	fn from(value: JobTypeArg) -> Self {
		match value {
			JobTypeArg::Quick => reachlab_core::JobType::Quick,
			JobTypeArg::Detailed => reachlab_core::JobType::Detailed,
		}
	}
}
