//! Immutable access token issued by the token endpoint, plus its builder.

// crates.io
use time::UtcOffset;
// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced by [`AccessTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AccessTokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when the expiry instant falls outside the supported date range.
	#[error("Expiry exceeds the supported date range.")]
	ExpiryOutOfRange,
}

/// Credential issued by a successful exchange.
///
/// Tokens are never mutated; a refresh produces a new value that supersedes the previous one.
/// The expiry instant is always normalized to UTC.
#[derive(Clone)]
pub struct AccessToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the endpoint issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Absolute UTC instant after which the token is no longer valid.
	pub expires_at: OffsetDateTime,
	/// Scope string granted by the endpoint.
	pub scope: Option<String>,
	/// Token type reported by the endpoint (typically `bearer`).
	pub token_type: Option<String>,
}
impl AccessToken {
	/// Returns a builder for constructing tokens.
	pub fn builder() -> AccessTokenBuilder {
		AccessTokenBuilder::default()
	}

	/// Returns `true` if the expiry is strictly after `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at > instant
	}

	/// Returns `true` if the token has not yet expired according to the current UTC clock.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}

	/// Time left until expiry at `instant`; zero once the token has expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_positive() { remaining } else { Duration::ZERO }
	}

	/// Returns the refresh token value, if one was issued and it is not empty.
	pub fn refresh_secret(&self) -> Option<&str> {
		self.refresh_token.as_ref().filter(|secret| !secret.is_empty()).map(TokenSecret::expose)
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.field("scope", &self.scope)
			.field("token_type", &self.token_type)
			.finish()
	}
}

/// Builder for [`AccessToken`].
#[derive(Clone, Debug, Default)]
pub struct AccessTokenBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	scope: Option<String>,
	token_type: Option<String>,
}
impl AccessTokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the instant `expires_in` is measured from; defaults to the current UTC clock.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Sets the granted scope string.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the token type.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Consumes the builder and produces an [`AccessToken`].
	pub fn build(self) -> Result<AccessToken, AccessTokenBuilderError> {
		let access_token = self.access_token.ok_or(AccessTokenBuilderError::MissingAccessToken)?;
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) =>
				self.issued_at.unwrap_or_else(OffsetDateTime::now_utc).checked_add(delta),
			(None, None) => return Err(AccessTokenBuilderError::MissingExpiry),
		}
		.and_then(|instant| instant.checked_to_offset(UtcOffset::UTC))
		.ok_or(AccessTokenBuilderError::ExpiryOutOfRange)?;

		Ok(AccessToken {
			access_token,
			refresh_token: self.refresh_token,
			expires_at,
			scope: self.scope,
			token_type: self.token_type,
		})
	}
}
