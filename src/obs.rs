//! Observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - Spans named `hmrc_token_broker.flow` carry the `flow` and `stage` (call site) fields and are
//!   always emitted through `tracing`.
//! - Enable `metrics` to increment `hmrc_token_broker_flow_total` for every
//!   attempt/success/failure (labeled by `flow` + `outcome`) and
//!   `hmrc_token_broker_policy_retry_total` for every policy retry (labeled by `policy` + `rule`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Token flows observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Secret, one-time password, and exchange loop that produces the first token.
	Initialize,
	/// Exchange that presents the current refresh token.
	RefreshTokenExchange,
	/// Scheduled refresh driven by the background refresher.
	BackgroundRefresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Initialize => "initialize",
			FlowKind::RefreshTokenExchange => "refresh_token_exchange",
			FlowKind::BackgroundRefresh => "background_refresh",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure observed by the flow.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
