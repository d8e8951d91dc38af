//! Root orchestrator that owns the cached privileged access token.
//!
//! The first [`HmrcAuthTokenBroker::get_token`] call initializes the broker: it fetches the
//! shared secret, derives a one-time password, and runs the exchange through the
//! [`ExecutionPolicy`], repeating the whole sequence every
//! [`BrokerConfig::retry_delay`] until a token arrives. An async mutex makes that sequence
//! single-flight, so concurrent callers wait on the same initialization. Once a token is cached
//! the broker hands it to a [`TokenRefresher`] running in a cancellation scope owned by the
//! broker. Each background refresh first tries the refresh-token exchange and immediately falls
//! back to a full exchange when that fails or yields nothing.

// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	api::PrivilegedAccessToken,
	auth::AccessToken,
	config::BrokerConfig,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, RefreshMetrics},
	policy::ExecutionPolicy,
	refresh::TokenRefresher,
	service::{OAuthTokenService, SecretRepository, TotpService},
};

/// Caches one privileged access token and keeps it fresh in the background.
///
/// Dropping the broker disposes it.
pub struct HmrcAuthTokenBroker {
	inner: Arc<BrokerInner>,
}
impl HmrcAuthTokenBroker {
	/// Creates an uninitialized broker; nothing is fetched until [`get_token`](Self::get_token)
	/// or [`prime`](Self::prime) is called.
	pub fn new(
		config: BrokerConfig,
		policy: ExecutionPolicy,
		token_service: Arc<dyn OAuthTokenService>,
		secrets: Arc<dyn SecretRepository>,
		totp: Arc<dyn TotpService>,
		refresher: TokenRefresher,
	) -> Self {
		Self {
			inner: Arc::new(BrokerInner {
				config,
				policy,
				token_service,
				secrets,
				totp,
				refresher,
				current: RwLock::new(None),
				init_guard: AsyncMutex::new(()),
				shutdown: CancellationToken::new(),
				refresh_scope: Mutex::new(None),
				refresh_metrics: Default::default(),
			}),
		}
	}

	/// Returns the cached token, initializing the broker on first use.
	///
	/// Initialization failures are retried, never returned; the call stays pending until a token
	/// is obtained. It fails only with [`Error::Shutdown`] once the broker has been disposed.
	pub async fn get_token(&self) -> Result<AccessToken> {
		self.inner.ensure_running()?;

		if let Some(token) = self.current_token() {
			return Ok(token);
		}

		self.inner.initialize().await
	}

	/// Returns the `{accessCode, expiryTime}` view of [`get_token`](Self::get_token).
	pub async fn privileged_access_token(&self) -> Result<PrivilegedAccessToken> {
		let token = self.get_token().await?;

		Ok(PrivilegedAccessToken::from(&token))
	}

	/// Starts initialization in the background without waiting for it.
	///
	/// Must be called from within a Tokio runtime.
	pub fn prime(&self) -> JoinHandle<Result<AccessToken>> {
		let inner = self.inner.clone();

		tokio::spawn(async move { inner.initialize().await })
	}

	/// Cached token, if initialization has completed.
	pub fn current_token(&self) -> Option<AccessToken> {
		self.inner.current.read().clone()
	}

	/// Returns `true` while the background refresh task is alive.
	pub fn is_background_refresh_running(&self) -> bool {
		self.inner.refresh_scope.lock().as_ref().is_some_and(|scope| !scope.handle.is_finished())
	}

	/// Returns `true` once [`dispose`](Self::dispose) has been called.
	pub fn is_disposed(&self) -> bool {
		self.inner.shutdown.is_cancelled()
	}

	/// Cancels the background refresh scope and any pending initialization.
	///
	/// Safe to call repeatedly and before initialization.
	pub fn dispose(&self) {
		self.inner.dispose();
	}

	/// Counters for the background refresh callback.
	pub fn refresh_metrics(&self) -> Arc<RefreshMetrics> {
		self.inner.refresh_metrics.clone()
	}

	/// Broker configuration.
	pub fn config(&self) -> &BrokerConfig {
		&self.inner.config
	}

	/// Refresher used for the background scope (exposes its audit).
	pub fn refresher(&self) -> &TokenRefresher {
		&self.inner.refresher
	}
}
impl Drop for HmrcAuthTokenBroker {
	fn drop(&mut self) {
		self.inner.dispose();
	}
}
impl Debug for HmrcAuthTokenBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HmrcAuthTokenBroker")
			.field("config", &self.inner.config)
			.field("policy", &self.inner.policy)
			.field("initialized", &self.inner.current.read().is_some())
			.field("disposed", &self.inner.shutdown.is_cancelled())
			.finish()
	}
}

struct RefreshScope {
	cancel: CancellationToken,
	handle: JoinHandle<()>,
}

struct BrokerInner {
	config: BrokerConfig,
	policy: ExecutionPolicy,
	token_service: Arc<dyn OAuthTokenService>,
	secrets: Arc<dyn SecretRepository>,
	totp: Arc<dyn TotpService>,
	refresher: TokenRefresher,
	current: RwLock<Option<AccessToken>>,
	init_guard: AsyncMutex<()>,
	shutdown: CancellationToken,
	refresh_scope: Mutex<Option<RefreshScope>>,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl BrokerInner {
	fn ensure_running(&self) -> Result<()> {
		if self.shutdown.is_cancelled() { Err(Error::Shutdown) } else { Ok(()) }
	}

	async fn initialize(self: &Arc<Self>) -> Result<AccessToken> {
		self.ensure_running()?;

		let _singleflight = tokio::select! {
			guard = self.init_guard.lock() => guard,
			_ = self.shutdown.cancelled() => return Err(Error::Shutdown),
		};
		let cached = self.current.read().clone();

		if let Some(token) = cached {
			return Ok(token);
		}

		let token = self.retrieve_token(&self.shutdown).await.map_err(|e| match e {
			Error::Cancelled => Error::Shutdown,
			e => e,
		})?;

		*self.current.write() = Some(token.clone());

		self.start_refresh(token.clone());

		Ok(token)
	}

	/// Secret, one-time password, and exchange, repeated until a token arrives or `cancel` fires.
	async fn retrieve_token(&self, cancel: &CancellationToken) -> Result<AccessToken> {
		const KIND: FlowKind = FlowKind::Initialize;

		let span = FlowSpan::new(KIND, "retrieve_token");

		span.instrument(async move {
			let mut attempt = 0_u64;

			loop {
				attempt += 1;

				obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

				match until_cancelled(cancel, self.exchange(cancel)).await {
					Ok(Some(token)) => {
						obs::record_flow_outcome(KIND, FlowOutcome::Success);
						tracing::info!(attempt, expires_at = %token.expires_at, "Obtained token.");

						return Ok(token);
					},
					Ok(None) => {
						tracing::warn!(attempt, "Token endpoint returned no token.");
					},
					Err(Error::Cancelled) => return Err(Error::Cancelled),
					Err(e) => {
						tracing::warn!(
							attempt,
							secret_name = self.config.secret_name(),
							error = %e,
							"Token retrieval failed."
						);
					},
				}

				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				if !sleep_or_cancelled(cancel, self.config.retry_delay()).await {
					return Err(Error::Cancelled);
				}
			}
		})
		.await
	}

	async fn exchange(&self, cancel: &CancellationToken) -> Result<Option<AccessToken>> {
		let otp = self.one_time_password().await?;
		let token = self.policy.execute_until(cancel, || self.token_service.exchange(&otp)).await?;

		Ok(token.flatten())
	}

	async fn exchange_with_refresh_token(
		&self,
		refresh_token: &str,
		cancel: &CancellationToken,
	) -> Result<Option<AccessToken>> {
		const KIND: FlowKind = FlowKind::RefreshTokenExchange;

		let span = FlowSpan::new(KIND, "exchange_with_refresh_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(until_cancelled(
				cancel,
				self.exchange_with_refresh_token_once(refresh_token, cancel),
			))
			.await;

		match &result {
			Ok(Some(_)) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			_ => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn exchange_with_refresh_token_once(
		&self,
		refresh_token: &str,
		cancel: &CancellationToken,
	) -> Result<Option<AccessToken>> {
		let otp = self.one_time_password().await?;
		let token = self
			.policy
			.execute_until(cancel, || {
				self.token_service.exchange_with_refresh_token(&otp, refresh_token)
			})
			.await?;

		Ok(token.flatten())
	}

	async fn one_time_password(&self) -> Result<String> {
		let secret = self.secrets.secret(self.config.secret_name()).await?;

		self.totp.generate(&secret)
	}

	/// Refresh callback handed to the refresher.
	async fn refresh(
		&self,
		current: AccessToken,
		cancel: &CancellationToken,
	) -> Result<Option<AccessToken>> {
		self.refresh_metrics.record_attempt();

		let refreshed = match current.refresh_secret() {
			Some(refresh_token) =>
				match self.exchange_with_refresh_token(refresh_token, cancel).await {
					Ok(Some(token)) => Some(token),
					Ok(None) => {
						tracing::info!("Refresh-token exchange returned no token; falling back.");

						None
					},
					Err(e) => {
						tracing::warn!(error = %e, "Refresh-token exchange failed; falling back.");

						None
					},
				},
			None => None,
		};
		let token = match refreshed {
			Some(token) => token,
			None => {
				self.refresh_metrics.record_fallback();

				match self.retrieve_token(cancel).await {
					Ok(token) => token,
					Err(e) => {
						self.refresh_metrics.record_failure();

						return Err(e);
					},
				}
			},
		};

		*self.current.write() = Some(token.clone());

		self.refresh_metrics.record_success();

		Ok(Some(token))
	}

	fn start_refresh(self: &Arc<Self>, token: AccessToken) {
		let mut scope = self.refresh_scope.lock();

		if let Some(previous) = scope.take() {
			previous.cancel.cancel();
		}
		if self.shutdown.is_cancelled() {
			return;
		}

		let cancel = self.shutdown.child_token();
		let weak = Arc::downgrade(self);
		let callback_cancel = cancel.clone();
		let handle = self.refresher.start(
			Some(token),
			move |current| {
				let weak = weak.clone();
				let cancel = callback_cancel.clone();

				async move {
					let inner = weak.upgrade().ok_or(Error::Shutdown)?;

					inner.refresh(current, &cancel).await
				}
			},
			cancel.clone(),
		);

		*scope = Some(RefreshScope { cancel, handle });
	}

	fn dispose(&self) {
		if !self.shutdown.is_cancelled() {
			tracing::info!("Disposing token broker.");
		}

		self.shutdown.cancel();

		if let Some(scope) = self.refresh_scope.lock().take() {
			scope.cancel.cancel();
		}
	}
}

async fn until_cancelled<T, Fut>(cancel: &CancellationToken, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(Error::Cancelled),
		result = fut => result,
	}
}
