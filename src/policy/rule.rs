// self
use crate::{_prelude::*, error::UpstreamFailure};

/// How many times a rule may retry before it stops matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryLimit {
	/// Never gives up.
	Forever,
	/// Gives up after the provided number of retries.
	Times(u32),
}
impl RetryLimit {
	/// Returns `true` when another retry is allowed after `retries` retries.
	pub const fn allows(self, retries: u32) -> bool {
		match self {
			Self::Forever => true,
			Self::Times(limit) => retries < limit,
		}
	}
}

/// Named retry rule keyed by an upstream failure classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryRule {
	name: String,
	failure: UpstreamFailure,
	limit: RetryLimit,
	delay: StdDuration,
}
impl RetryRule {
	/// Creates a rule that retries `failure` up to `limit` times, waiting `delay` between tries.
	pub fn new(
		name: impl Into<String>,
		failure: UpstreamFailure,
		limit: RetryLimit,
		delay: StdDuration,
	) -> Self {
		Self { name: name.into(), failure, limit, delay }
	}

	/// Rule that retries `failure` forever.
	pub fn forever(name: impl Into<String>, failure: UpstreamFailure, delay: StdDuration) -> Self {
		Self::new(name, failure, RetryLimit::Forever, delay)
	}

	/// Rule that retries `failure` at most `times` times.
	pub fn times(
		name: impl Into<String>,
		failure: UpstreamFailure,
		times: u32,
		delay: StdDuration,
	) -> Self {
		Self::new(name, failure, RetryLimit::Times(times), delay)
	}

	/// Rule name used in logs and metrics.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Failure classification handled by the rule.
	pub fn failure(&self) -> UpstreamFailure {
		self.failure
	}

	/// Retry limit.
	pub fn limit(&self) -> RetryLimit {
		self.limit
	}

	/// Fixed delay between retries.
	pub fn delay(&self) -> StdDuration {
		self.delay
	}

	/// Returns `true` when `error` carries the classification this rule handles.
	pub fn matches(&self, error: &Error) -> bool {
		error.upstream_failure() == Some(self.failure)
	}
}
