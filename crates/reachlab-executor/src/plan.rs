use reachlab_core::Job;
use serde::Deserialize;

use crate::error::{ExecutorError, Result};

/// A source or destination host attached to a router, as described in a
/// job's `params` bag.
///
/// The executor is the only component that interprets `Job::params`: the
/// queue, registry, and progress tracker all treat it as opaque JSON, per
/// the "params never interpreted" rule carried over from the original
/// service's untyped `params: Dict[str, Any]`.
#[derive(Debug, Clone, Deserialize)]
pub struct HostSpec {
	pub host_name: String,
	pub primary_ip: String,
	pub router: String,
	pub mac_address: String,
}

/// The parsed orchestration plan for one job: which routers it touches,
/// which source hosts it needs leases on, and (detailed jobs only) which
/// ephemeral destination hosts it creates for the duration of the run.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPlan {
	pub routers: Vec<String>,
	#[serde(default)]
	pub hosts: Vec<HostSpec>,
	#[serde(default)]
	pub destinations: Vec<HostSpec>,
}

impl JobPlan {
	pub fn parse(job: &Job) -> Result<Self> {
		serde_json::from_value(job.params.clone()).map_err(|error| ExecutorError::InvalidParams(error.to_string()))
	}

	pub fn hosts_for_router<'a>(&'a self, router: &'a str) -> impl Iterator<Item = &'a HostSpec> {
		self.hosts.iter().filter(move |h| h.router == router)
	}

	pub fn destinations_for_router<'a>(&'a self, router: &'a str) -> impl Iterator<Item = &'a HostSpec> {
		self.destinations.iter().filter(move |h| h.router == router)
	}
}
