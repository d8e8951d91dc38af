//! Fakes shared by the broker and refresher integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::{HashMap, VecDeque},
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
// self
use hmrc_token_broker::{
	HmrcAuthTokenBroker,
	auth::AccessToken,
	config::{BrokerConfig, RefresherParameters},
	error::{Error, OtpError, Result, UpstreamError},
	policy::ExecutionPolicy,
	refresh::TokenRefresher,
	service::{MemorySecretRepository, OAuthTokenService, ServiceFuture, TotpService},
};

pub const SECRET_NAME: &str = "PrivilegedAccessSecret";
pub const SHARED_SECRET: &str = "OGD-SECRET";
pub const ONE_TIME_PASSWORD: &str = "TOTP-CODE";

/// Scripted answer to one exchange call.
#[derive(Clone, Debug)]
pub enum Reply {
	/// Issue a numbered token with the service's lifetime.
	Issue,
	/// Return exactly this token.
	Fixed(AccessToken),
	/// Fail with the provided HTTP status.
	Status(u16),
	/// Report that no token is applicable.
	NoToken,
}

/// Token service fake that answers from per-call scripts and counts calls.
#[derive(Debug)]
pub struct ScriptedTokenService {
	lifetime: Duration,
	latency: StdDuration,
	exchange_script: Mutex<VecDeque<Reply>>,
	refresh_script: Mutex<VecDeque<Reply>>,
	exchange_default: Reply,
	refresh_default: Reply,
	exchanges: AtomicUsize,
	refresh_exchanges: AtomicUsize,
	issued: AtomicUsize,
	one_time_passwords: Mutex<Vec<String>>,
	presented_refresh_tokens: Mutex<Vec<String>>,
}
impl ScriptedTokenService {
	pub fn new(lifetime: Duration) -> Self {
		Self {
			lifetime,
			latency: StdDuration::ZERO,
			exchange_script: Mutex::default(),
			refresh_script: Mutex::default(),
			exchange_default: Reply::Issue,
			refresh_default: Reply::Issue,
			exchanges: AtomicUsize::new(0),
			refresh_exchanges: AtomicUsize::new(0),
			issued: AtomicUsize::new(0),
			one_time_passwords: Mutex::default(),
			presented_refresh_tokens: Mutex::default(),
		}
	}

	pub fn with_latency(mut self, latency: StdDuration) -> Self {
		self.latency = latency;

		self
	}

	pub fn with_exchange_script(self, replies: impl IntoIterator<Item = Reply>) -> Self {
		self.exchange_script.lock().extend(replies);

		self
	}

	pub fn with_refresh_script(self, replies: impl IntoIterator<Item = Reply>) -> Self {
		self.refresh_script.lock().extend(replies);

		self
	}

	pub fn with_exchange_default(mut self, reply: Reply) -> Self {
		self.exchange_default = reply;

		self
	}

	pub fn with_refresh_default(mut self, reply: Reply) -> Self {
		self.refresh_default = reply;

		self
	}

	pub fn exchanges(&self) -> usize {
		self.exchanges.load(Ordering::SeqCst)
	}

	pub fn refresh_exchanges(&self) -> usize {
		self.refresh_exchanges.load(Ordering::SeqCst)
	}

	pub fn one_time_passwords(&self) -> Vec<String> {
		self.one_time_passwords.lock().clone()
	}

	pub fn presented_refresh_tokens(&self) -> Vec<String> {
		self.presented_refresh_tokens.lock().clone()
	}

	fn issue(&self) -> AccessToken {
		let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

		AccessToken::builder()
			.access_token(format!("ACCESS-TOKEN-{n}"))
			.refresh_token(format!("REFRESH-TOKEN-{n}"))
			.expires_in(self.lifetime)
			.build()
			.expect("Scripted token should build.")
	}

	fn answer(&self, reply: Reply) -> Result<Option<AccessToken>> {
		match reply {
			Reply::Issue => Ok(Some(self.issue())),
			Reply::Fixed(token) => Ok(Some(token)),
			Reply::Status(status) => Err(UpstreamError::new(status, "scripted failure").into()),
			Reply::NoToken => Ok(None),
		}
	}

	async fn respond(
		&self,
		script: &Mutex<VecDeque<Reply>>,
		default: &Reply,
	) -> Result<Option<AccessToken>> {
		if !self.latency.is_zero() {
			tokio::time::sleep(self.latency).await;
		}

		let reply = script.lock().pop_front().unwrap_or_else(|| default.clone());

		self.answer(reply)
	}
}
impl OAuthTokenService for ScriptedTokenService {
	fn exchange<'a>(&'a self, one_time_password: &'a str) -> ServiceFuture<'a, Option<AccessToken>> {
		self.exchanges.fetch_add(1, Ordering::SeqCst);
		self.one_time_passwords.lock().push(one_time_password.to_owned());

		Box::pin(self.respond(&self.exchange_script, &self.exchange_default))
	}

	fn exchange_with_refresh_token<'a>(
		&'a self,
		one_time_password: &'a str,
		refresh_token: &'a str,
	) -> ServiceFuture<'a, Option<AccessToken>> {
		self.refresh_exchanges.fetch_add(1, Ordering::SeqCst);
		self.one_time_passwords.lock().push(one_time_password.to_owned());
		self.presented_refresh_tokens.lock().push(refresh_token.to_owned());

		Box::pin(self.respond(&self.refresh_script, &self.refresh_default))
	}
}

/// TOTP fake that maps known shared secrets to fixed codes.
#[derive(Debug, Default)]
pub struct FixedTotpService(HashMap<String, String>);
impl FixedTotpService {
	pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
		Self(pairs.into_iter().map(|(secret, code)| (secret.to_owned(), code.to_owned())).collect())
	}
}
impl TotpService for FixedTotpService {
	fn generate(&self, shared_secret: &str) -> Result<String> {
		self.0
			.get(shared_secret)
			.cloned()
			.ok_or_else(|| Error::from(OtpError::malformed("unknown shared secret")))
	}
}

pub fn token_expiring_in(lifetime: Duration) -> AccessToken {
	AccessToken::builder()
		.access_token("seed-access")
		.refresh_token("seed-refresh")
		.expires_in(lifetime)
		.build()
		.expect("Token fixture should build.")
}

pub fn fast_refresher(retry_interval: StdDuration) -> TokenRefresher {
	TokenRefresher::new(RefresherParameters::default().with_retry_interval(retry_interval))
}

/// Broker wired to the scripted service with millisecond retry delays.
pub fn build_broker(
	service: Arc<ScriptedTokenService>,
	secrets: MemorySecretRepository,
	refresher: TokenRefresher,
) -> HmrcAuthTokenBroker {
	let config = BrokerConfig::builder()
		.retry_delay(StdDuration::from_millis(5))
		.build()
		.expect("Broker config should be valid.");

	HmrcAuthTokenBroker::new(
		config,
		ExecutionPolicy::hmrc(StdDuration::from_millis(1)),
		service,
		Arc::new(secrets),
		Arc::new(FixedTotpService::new([(SHARED_SECRET, ONE_TIME_PASSWORD)])),
		refresher,
	)
}

pub fn seeded_secrets() -> MemorySecretRepository {
	MemorySecretRepository::new().with_secret(SECRET_NAME, SHARED_SECRET)
}

/// Polls `condition` every few milliseconds until it holds or `timeout` elapses.
pub async fn eventually(timeout: StdDuration, mut condition: impl FnMut() -> bool) -> bool {
	let deadline = tokio::time::Instant::now() + timeout;

	while tokio::time::Instant::now() < deadline {
		if condition() {
			return true;
		}

		tokio::time::sleep(StdDuration::from_millis(5)).await;
	}

	condition()
}

pub fn now() -> OffsetDateTime {
	OffsetDateTime::now_utc()
}
