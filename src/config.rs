//! Broker and token service configuration.

pub use crate::{otp::TotpSettings, refresh::RefresherParameters};

// self
use crate::{_prelude::*, error::ConfigError};

/// Validated broker configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerConfig {
	secret_name: String,
	retry_delay: StdDuration,
}
impl BrokerConfig {
	/// Name of the shared secret in the secret store.
	pub const DEFAULT_SECRET_NAME: &'static str = "PrivilegedAccessSecret";
	/// Default wait between failed initialization attempts, also used by the execution policy.
	pub const DEFAULT_RETRY_DELAY: StdDuration = StdDuration::from_secs(30);

	/// Returns a builder seeded with the defaults.
	pub fn builder() -> BrokerConfigBuilder {
		BrokerConfigBuilder::default()
	}

	/// Shared secret name.
	pub fn secret_name(&self) -> &str {
		&self.secret_name
	}

	/// Wait between failed initialization attempts.
	pub fn retry_delay(&self) -> StdDuration {
		self.retry_delay
	}
}
impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			secret_name: Self::DEFAULT_SECRET_NAME.to_owned(),
			retry_delay: Self::DEFAULT_RETRY_DELAY,
		}
	}
}

/// Builder for [`BrokerConfig`] values.
#[derive(Clone, Debug)]
pub struct BrokerConfigBuilder {
	/// Shared secret name.
	pub secret_name: String,
	/// Wait between failed initialization attempts.
	pub retry_delay: StdDuration,
}
impl BrokerConfigBuilder {
	/// Overrides the shared secret name.
	pub fn secret_name(mut self, name: impl Into<String>) -> Self {
		self.secret_name = name.into();

		self
	}

	/// Overrides the wait between failed initialization attempts.
	pub fn retry_delay(mut self, delay: StdDuration) -> Self {
		self.retry_delay = delay;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<BrokerConfig, ConfigError> {
		if self.secret_name.trim().is_empty() {
			return Err(ConfigError::EmptySecretName);
		}

		Ok(BrokerConfig { secret_name: self.secret_name, retry_delay: self.retry_delay })
	}
}
impl Default for BrokerConfigBuilder {
	fn default() -> Self {
		let BrokerConfig { secret_name, retry_delay } = BrokerConfig::default();

		Self { secret_name, retry_delay }
	}
}

/// Token endpoint settings used by the HTTP token service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenServiceConfig {
	/// Token endpoint URL.
	pub url: Url,
	/// OAuth client identifier.
	pub client_id: String,
	/// Static suffix appended to the one-time password; `"."` means none.
	#[serde(default)]
	pub client_secret: Option<String>,
}
impl TokenServiceConfig {
	/// Placeholder that configuration sources use for "no client secret".
	pub const NO_CLIENT_SECRET: &'static str = ".";

	/// Creates a configuration without a static client secret.
	pub fn new(url: Url, client_id: impl Into<String>) -> Self {
		Self { url, client_id: client_id.into(), client_secret: None }
	}

	/// Sets the static client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Client secret with the `"."` placeholder resolved to an empty string.
	pub fn effective_client_secret(&self) -> &str {
		match self.client_secret.as_deref() {
			None | Some(Self::NO_CLIENT_SECRET) => "",
			Some(secret) => secret,
		}
	}

	/// Checks the client identifier and endpoint scheme.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::EmptyClientId);
		}
		if !matches!(self.url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedEndpoint { url: self.url.to_string() });
		}

		Ok(())
	}
}
