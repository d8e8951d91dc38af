//! Background refresher that keeps a token valid for as long as its scope lives.
//!
//! Each cycle waits until [`RefresherParameters::lead_time_percentage`] of the token's remaining
//! lifetime has elapsed, then calls the refresh callback until it yields a replacement, waiting
//! [`RefresherParameters::retry_interval`] between failures. Callback failures (panics
//! included) are logged and retried; they never end the loop. Only the cancellation token stops
//! it, and it is observed at every loop head and every sleep.

pub mod audit;

mod parameters;

pub use audit::{RefreshAuditEntry, RefreshAuditHandle, TokenRefreshAudit};
pub use parameters::*;

// std
use std::panic::AssertUnwindSafe;
// crates.io
use futures::FutureExt;
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Runs the wait-then-refresh loop on behalf of a token owner.
#[derive(Clone, Debug, Default)]
pub struct TokenRefresher {
	parameters: RefresherParameters,
	audit: Arc<TokenRefreshAudit>,
}
impl TokenRefresher {
	/// Creates a refresher with a discarding audit.
	pub fn new(parameters: RefresherParameters) -> Self {
		Self { parameters, audit: Arc::new(TokenRefreshAudit::new()) }
	}

	/// Replaces the audit sink, e.g. with [`TokenRefreshAudit::retaining`].
	pub fn with_audit(mut self, audit: Arc<TokenRefreshAudit>) -> Self {
		self.audit = audit;

		self
	}

	/// Scheduling parameters.
	pub fn parameters(&self) -> &RefresherParameters {
		&self.parameters
	}

	/// Audit receiving one entry per cycle.
	pub fn audit(&self) -> &Arc<TokenRefreshAudit> {
		&self.audit
	}

	/// Spawns [`run`](Self::run) on the current Tokio runtime.
	///
	/// The handle only completes once `cancel` fires (or when `token` is `None`); hold it to
	/// detect unexpected termination rather than awaiting it.
	pub fn start<F, Fut>(
		&self,
		token: Option<AccessToken>,
		refresh: F,
		cancel: CancellationToken,
	) -> JoinHandle<()>
	where
		F: 'static + Send + Sync + Fn(AccessToken) -> Fut,
		Fut: 'static + Send + Future<Output = Result<Option<AccessToken>>>,
	{
		let refresher = self.clone();

		tokio::spawn(async move { refresher.run(token, refresh, cancel).await })
	}

	/// Runs refresh cycles until `cancel` fires.
	///
	/// Each successful callback result becomes the reference token for the next cycle.
	pub async fn run<F, Fut>(
		&self,
		token: Option<AccessToken>,
		refresh: F,
		cancel: CancellationToken,
	) where
		F: Fn(AccessToken) -> Fut,
		Fut: Future<Output = Result<Option<AccessToken>>>,
	{
		let Some(mut current) = token else {
			tracing::warn!("Token refresher started without a token; nothing to refresh.");

			return;
		};
		let span = FlowSpan::new(FlowKind::BackgroundRefresh, "token_refresher");

		span.instrument(async move {
			while !cancel.is_cancelled() {
				let Some(next) = self.cycle(&current, &refresh, &cancel).await else {
					break;
				};

				current = next;
			}

			tracing::debug!("Token refresher stopped.");
		})
		.await
	}

	async fn cycle<F, Fut>(
		&self,
		current: &AccessToken,
		refresh: &F,
		cancel: &CancellationToken,
	) -> Option<AccessToken>
	where
		F: Fn(AccessToken) -> Fut,
		Fut: Future<Output = Result<Option<AccessToken>>>,
	{
		let entry = self.audit.create_entry(current);
		let now = OffsetDateTime::now_utc();
		let delay =
			percentage_towards(now, current.expires_at, self.parameters.lead_time_percentage());

		entry.plan(now, delay);

		tracing::info!(
			expires_at = %current.expires_at,
			delay_ms = delay.whole_milliseconds() as u64,
			lead_time_percentage = self.parameters.lead_time_percentage(),
			"Scheduled token refresh."
		);

		if !sleep_or_cancelled(cancel, delay.unsigned_abs()).await {
			return None;
		}

		self.audit.refresh_started(&entry);

		loop {
			if cancel.is_cancelled() {
				return None;
			}

			let attempt = entry.record_attempt();

			obs::record_flow_outcome(FlowKind::BackgroundRefresh, FlowOutcome::Attempt);

			let outcome =
				AssertUnwindSafe(async { refresh(current.clone()).await }).catch_unwind().await;

			match outcome {
				Ok(Ok(Some(token))) => {
					self.audit.refresh_ended(&entry);
					obs::record_flow_outcome(FlowKind::BackgroundRefresh, FlowOutcome::Success);
					tracing::info!(attempt, expires_at = %token.expires_at, "Token refreshed.");

					return Some(token);
				},
				Ok(Ok(None)) => {
					tracing::warn!(attempt, "Token refresh produced no token; retrying.");
				},
				Ok(Err(e)) => {
					tracing::warn!(attempt, error = %e, "Token refresh failed; retrying.");
				},
				Err(_) => {
					tracing::error!(attempt, "Token refresh panicked; retrying.");
				},
			}

			obs::record_flow_outcome(FlowKind::BackgroundRefresh, FlowOutcome::Failure);

			if !sleep_or_cancelled(cancel, self.parameters.retry_interval()).await {
				return None;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU32, Ordering};
	// self
	use super::*;

	fn token(expires_in: Duration) -> AccessToken {
		AccessToken::builder()
			.access_token("access")
			.expires_in(expires_in)
			.build()
			.expect("Token fixture should build.")
	}

	#[tokio::test]
	async fn missing_token_returns_immediately() {
		let refresher = TokenRefresher::default();
		let calls = AtomicU32::new(0);

		refresher
			.run(
				None,
				|_| {
					calls.fetch_add(1, Ordering::SeqCst);

					async { Ok(None) }
				},
				CancellationToken::new(),
			)
			.await;

		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn cancellation_during_wait_skips_refresh() {
		let audit = Arc::new(TokenRefreshAudit::retaining());
		let refresher = TokenRefresher::default().with_audit(audit.clone());
		let cancel = CancellationToken::new();
		let handle = refresher.start(
			Some(token(Duration::hours(1))),
			|_| async { Ok(Some(token(Duration::hours(1)))) },
			cancel.clone(),
		);

		tokio::time::sleep(StdDuration::from_millis(20)).await;
		cancel.cancel();
		handle.await.expect("Refresher task should exit cleanly.");

		let items = audit.audit_items();

		assert_eq!(items.len(), 1);
		assert_eq!(items[0].actual_refresh_start, None);
		assert_eq!(items[0].refresh_attempts, 0);
	}
}
