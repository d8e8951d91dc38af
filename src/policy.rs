//! Status-keyed retry policy wrapped around calls to the token endpoint.
//!
//! An [`ExecutionPolicy`] is an ordered stack of [`RetryRule`]s, outermost first. Each rule owns
//! its own retry counter. When an operation fails, the innermost rule that matches the error's
//! [`UpstreamFailure`] and still has retries left schedules the next attempt; doing so resets
//! the counters of every rule nested inside it, so an interleaved failure of another class gives
//! the inner rules a fresh budget. Errors that no rule accepts reach the policy's
//! [`FailureHandler`], which either swallows them into an absent result or re-raises them.

mod failure;
mod rule;

pub use failure::*;
pub use rule::*;

// self
use crate::{_prelude::*, error::UpstreamFailure, obs};

/// Composed retry rules plus a terminal-failure hook.
#[derive(Clone)]
pub struct ExecutionPolicy {
	name: String,
	rules: Vec<RetryRule>,
	failure_handler: Arc<dyn FailureHandler>,
}
impl ExecutionPolicy {
	/// Name of the policy used for the token endpoint.
	pub const HMRC: &'static str = "hmrc";
	/// Retries granted to 503 and 500 responses before they become fatal.
	pub const BOUNDED_RETRIES: u32 = 5;

	/// Creates an empty policy that propagates every failure.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), rules: Vec::new(), failure_handler: Arc::new(PropagateFailures) }
	}

	/// Policy that runs the operation once and propagates failures unchanged.
	pub fn passthrough() -> Self {
		Self::new("passthrough")
	}

	/// Token endpoint policy: 429 and 408 retry forever, 503 and 500 retry five times, and 404
	/// resolves to an absent result. Every retry waits `retry_delay`.
	pub fn hmrc(retry_delay: StdDuration) -> Self {
		Self::new(Self::HMRC)
			.with_rule(RetryRule::forever(
				"rate_limited",
				UpstreamFailure::RateLimited,
				retry_delay,
			))
			.with_rule(RetryRule::times(
				"service_unavailable",
				UpstreamFailure::ServiceUnavailable,
				Self::BOUNDED_RETRIES,
				retry_delay,
			))
			.with_rule(RetryRule::times(
				"internal_server_error",
				UpstreamFailure::InternalServerError,
				Self::BOUNDED_RETRIES,
				retry_delay,
			))
			.with_rule(RetryRule::forever(
				"request_timeout",
				UpstreamFailure::RequestTimeout,
				retry_delay,
			))
			.with_failure_handler(HmrcFailureHandler)
	}

	/// Appends a rule nested inside every rule added before it.
	pub fn with_rule(mut self, rule: RetryRule) -> Self {
		self.rules.push(rule);

		self
	}

	/// Replaces the terminal-failure hook.
	pub fn with_failure_handler(mut self, handler: impl 'static + FailureHandler) -> Self {
		self.failure_handler = Arc::new(handler);

		self
	}

	/// Policy name used in logs and metrics.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Rules from outermost to innermost.
	pub fn rules(&self) -> &[RetryRule] {
		&self.rules
	}

	/// Runs `operation` under the policy.
	///
	/// Returns `Ok(Some(_))` on success and `Ok(None)` when the failure handler absorbed the
	/// final error.
	pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<Option<T>>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		self.execute_until(&CancellationToken::new(), operation).await
	}

	/// Same as [`execute`](Self::execute), but retry delays end early with
	/// [`Error::Cancelled`] once `cancel` fires.
	pub async fn execute_until<T, F, Fut>(
		&self,
		cancel: &CancellationToken,
		mut operation: F,
	) -> Result<Option<T>>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut retries = vec![0_u32; self.rules.len()];

		loop {
			let error = match operation().await {
				Ok(value) => return Ok(Some(value)),
				Err(e) => e,
			};
			let Some(index) = self.retrying_rule(&error, &retries) else {
				return self.failure_handler.on_failure(&self.name, error).map(|()| None);
			};
			let rule = &self.rules[index];

			retries[index] += 1;
			retries[index + 1..].fill(0);

			tracing::info!(
				policy = %self.name,
				rule = rule.name(),
				status = error.status(),
				retry = retries[index],
				delay_ms = rule.delay().as_millis() as u64,
				retry_after_s = retry_after_seconds(&error),
				"Retrying token endpoint call."
			);
			obs::record_policy_retry(&self.name, rule.name());

			if !sleep_or_cancelled(cancel, rule.delay()).await {
				return Err(Error::Cancelled);
			}
		}
	}

	fn retrying_rule(&self, error: &Error, retries: &[u32]) -> Option<usize> {
		self.rules
			.iter()
			.enumerate()
			.rev()
			.find(|(index, rule)| rule.matches(error) && rule.limit().allows(retries[*index]))
			.map(|(index, _)| index)
	}
}
impl Debug for ExecutionPolicy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExecutionPolicy")
			.field("name", &self.name)
			.field("rules", &self.rules)
			.finish_non_exhaustive()
	}
}

fn retry_after_seconds(error: &Error) -> Option<i64> {
	match error {
		Error::Upstream(upstream) => upstream.retry_after.map(|delay| delay.whole_seconds()),
		_ => None,
	}
}
