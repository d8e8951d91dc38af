// self
use crate::{_prelude::*, error::UpstreamFailure};

/// Terminal-failure hook invoked once no retry rule applies to an error.
///
/// Returning `Ok(())` turns the failure into an absent result; returning `Err` propagates it.
pub trait FailureHandler
where
	Self: Send + Sync,
{
	/// Decides the fate of an error that exhausted or escaped every retry rule.
	fn on_failure(&self, policy: &str, error: Error) -> Result<()>;
}

/// Logs and re-raises every terminal failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropagateFailures;
impl FailureHandler for PropagateFailures {
	fn on_failure(&self, policy: &str, error: Error) -> Result<()> {
		tracing::error!(
			policy,
			status = error.status(),
			error = %error,
			"Execution policy gave up."
		);

		Err(error)
	}
}

/// Token endpoint failure handling: HTTP 404 means no token is applicable.
#[derive(Clone, Copy, Debug, Default)]
pub struct HmrcFailureHandler;
impl FailureHandler for HmrcFailureHandler {
	fn on_failure(&self, policy: &str, error: Error) -> Result<()> {
		if error.upstream_failure() == Some(UpstreamFailure::NotFound) {
			tracing::info!(policy, "Token endpoint reported no applicable token.");

			return Ok(());
		}

		PropagateFailures.on_failure(policy, error)
	}
}
