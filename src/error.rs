//! Broker-level error types shared across the policy, refresher, and collaborators.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token endpoint answered with a non-success HTTP status.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Shared secret could not be retrieved.
	#[error(transparent)]
	Secret(#[from] SecretError),
	/// One-time password input was malformed.
	#[error(transparent)]
	Otp(#[from] OtpError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token response could not become an [`AccessToken`](crate::auth::AccessToken).
	#[error("Unable to build access token.")]
	TokenBuild(#[from] crate::auth::AccessTokenBuilderError),

	/// Token endpoint responded with JSON that does not match the expected shape.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: Option<u16>,
	},
	/// A cancellable wait was interrupted.
	#[error("Operation was cancelled.")]
	Cancelled,
	/// The broker was disposed before a token became available.
	#[error("Token broker has been shut down.")]
	Shutdown,
}
impl Error {
	/// Returns the upstream HTTP status code carried by this error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Upstream(err) => Some(err.status),
			Self::ResponseParse { status, .. } => *status,
			_ => None,
		}
	}

	/// Classifies the error by its upstream HTTP status, if it carries one.
	pub fn upstream_failure(&self) -> Option<UpstreamFailure> {
		self.status().map(UpstreamFailure::from_status)
	}
}

/// Classification of upstream HTTP failures used by execution policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpstreamFailure {
	/// HTTP 429.
	RateLimited,
	/// HTTP 408.
	RequestTimeout,
	/// HTTP 503.
	ServiceUnavailable,
	/// HTTP 500.
	InternalServerError,
	/// HTTP 404; the token endpoint uses it to signal that no token is applicable.
	NotFound,
	/// Any other status.
	Other(u16),
}
impl UpstreamFailure {
	/// Maps an HTTP status code onto its classification.
	pub const fn from_status(status: u16) -> Self {
		match status {
			429 => Self::RateLimited,
			408 => Self::RequestTimeout,
			503 => Self::ServiceUnavailable,
			500 => Self::InternalServerError,
			404 => Self::NotFound,
			other => Self::Other(other),
		}
	}

	/// Returns the HTTP status code for the classification.
	pub const fn status(self) -> u16 {
		match self {
			Self::RateLimited => 429,
			Self::RequestTimeout => 408,
			Self::ServiceUnavailable => 503,
			Self::InternalServerError => 500,
			Self::NotFound => 404,
			Self::Other(status) => status,
		}
	}
}

/// Non-success response returned by the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Token endpoint returned HTTP {status}: {message}.")]
pub struct UpstreamError {
	/// HTTP status code.
	pub status: u16,
	/// Provider- or broker-supplied message summarizing the failure.
	pub message: String,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}
impl UpstreamError {
	/// Creates an upstream error for the provided status.
	pub fn new(status: u16, message: impl Into<String>) -> Self {
		Self { status, message: message.into(), retry_after: None }
	}

	/// Attaches a Retry-After hint.
	pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
		self.retry_after = retry_after;

		self
	}

	/// Returns the classification of the status code.
	pub fn failure(&self) -> UpstreamFailure {
		UpstreamFailure::from_status(self.status)
	}
}

/// Failures raised by secret repositories.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SecretError {
	/// The secret does not exist in the store.
	#[error("Secret `{name}` was not found.")]
	Missing {
		/// Secret name that was requested.
		name: String,
	},
	/// The store could not be reached or refused the request.
	#[error("Secret `{name}` is unavailable: {message}.")]
	Unavailable {
		/// Secret name that was requested.
		name: String,
		/// Store-supplied failure description.
		message: String,
	},
}

/// Failures raised by one-time password generation.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum OtpError {
	/// Secret, settings, or intermediate encoding could not be used to derive a code.
	#[error("Malformed one-time password input: {reason}.")]
	MalformedInput {
		/// What was wrong with the input.
		reason: String,
	},
}
impl OtpError {
	/// Builds a [`OtpError::MalformedInput`] with the provided reason.
	pub fn malformed(reason: impl Into<String>) -> Self {
		Self::MalformedInput { reason: reason.into() }
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// The shared secret name is empty.
	#[error("Shared secret name must not be empty.")]
	EmptySecretName,
	/// The token service client identifier is empty.
	#[error("Token service client identifier must not be empty.")]
	EmptyClientId,
	/// The token endpoint does not use HTTP(S).
	#[error("Token endpoint must use http or https: {url}.")]
	UnsupportedEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
