//! Collaborator contracts the broker consumes, plus built-in implementations.
//!
//! The broker depends only on these traits. [`MemorySecretRepository`] and
//! [`Base32TotpService`] are always available; the HTTP-backed [`HmrcTokenService`] requires
//! the `reqwest` feature.

#[cfg(feature = "reqwest")] pub mod hmrc;
pub mod memory;
pub mod totp;

#[cfg(feature = "reqwest")] pub use hmrc::HmrcTokenService;
pub use memory::MemorySecretRepository;
pub use totp::Base32TotpService;

// self
use crate::{_prelude::*, auth::AccessToken};

/// Boxed future returned by collaborator services.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Secret store holding the rotating shared secret.
pub trait SecretRepository
where
	Self: Send + Sync,
{
	/// Fetches the current value of `name`; fails with [`Error::Secret`] when it is absent or
	/// the store is unreachable.
	fn secret<'a>(&'a self, name: &'a str) -> ServiceFuture<'a, String>;
}

/// OAuth exchange against the token endpoint.
///
/// Non-success responses, including the 404 the endpoint uses for "no applicable token", come
/// back as [`Error::Upstream`]. The execution policy retries the transient statuses and turns
/// the 404 into an absent result; `Ok(None)` is reserved for implementations that can tell the
/// absence apart themselves.
pub trait OAuthTokenService
where
	Self: Send + Sync,
{
	/// Exchanges a one-time password for a new token.
	fn exchange<'a>(&'a self, one_time_password: &'a str) -> ServiceFuture<'a, Option<AccessToken>>;

	/// Exchanges a one-time password plus the current refresh token for a new token.
	fn exchange_with_refresh_token<'a>(
		&'a self,
		one_time_password: &'a str,
		refresh_token: &'a str,
	) -> ServiceFuture<'a, Option<AccessToken>>;
}

/// Derives the one-time password presented as the client credential.
pub trait TotpService
where
	Self: Send + Sync,
{
	/// Generates the code for the current instant from the stored shared secret.
	fn generate(&self, shared_secret: &str) -> Result<String>;
}
