// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"hmrc_token_broker_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records one retry scheduled by an execution policy rule (when enabled).
pub fn record_policy_retry(policy: &str, rule: &str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"hmrc_token_broker_policy_retry_total",
			"policy" => policy.to_owned(),
			"rule" => rule.to_owned()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (policy, rule);
	}
}

/// Thread-safe counters for the broker's refresh callback.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	fallback: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of refresh callback invocations.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of invocations that produced a token.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of invocations that produced no token.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns how often the refresh-token exchange fell back to a full exchange.
	pub fn fallbacks(&self) -> u64 {
		self.fallback.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fallback(&self) {
		self.fallback.fetch_add(1, Ordering::Relaxed);
	}
}
