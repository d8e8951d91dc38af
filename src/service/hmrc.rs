//! [`OAuthTokenService`] for the HMRC OAuth token endpoint.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AccessTokenBuilderError},
	config::TokenServiceConfig,
	error::ConfigError,
	http::ReqwestHttpClient,
	service::{OAuthTokenService, ServiceFuture},
};

const GRANT_TYPE: &str = "client_credentials";
const SCOPES: &str = "read:apprenticeship-levy";

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
	grant_type: &'static str,
	scopes: &'static str,
	client_secret: String,
	client_id: &'a str,
	refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	expires_in: i64,
	#[serde(default)]
	scope: Option<String>,
	#[serde(default)]
	token_type: Option<String>,
}
impl TokenResponse {
	fn into_token(
		self,
		issued_at: OffsetDateTime,
	) -> Result<AccessToken, AccessTokenBuilderError> {
		let mut builder = AccessToken::builder()
			.access_token(self.access_token)
			.issued_at(issued_at)
			.expires_in(Duration::seconds(self.expires_in));

		if let Some(refresh_token) = self.refresh_token {
			builder = builder.refresh_token(refresh_token);
		}
		if let Some(scope) = self.scope {
			builder = builder.scope(scope);
		}
		if let Some(token_type) = self.token_type {
			builder = builder.token_type(token_type);
		}

		builder.build()
	}
}

/// Client-credentials exchange whose client secret is `<one-time password><client secret>`.
#[derive(Clone, Debug)]
pub struct HmrcTokenService {
	config: TokenServiceConfig,
	http: ReqwestHttpClient,
}
impl HmrcTokenService {
	/// Default per-request timeout of the built-in HTTP client.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Validates `config` and builds a client with [`DEFAULT_TIMEOUT`](Self::DEFAULT_TIMEOUT).
	pub fn new(config: TokenServiceConfig) -> Result<Self, ConfigError> {
		Self::with_http_client(config, ReqwestHttpClient::with_timeout(Self::DEFAULT_TIMEOUT)?)
	}

	/// Validates `config` and reuses an existing HTTP client.
	pub fn with_http_client(
		config: TokenServiceConfig,
		http: ReqwestHttpClient,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self { config, http })
	}

	/// Endpoint configuration.
	pub fn config(&self) -> &TokenServiceConfig {
		&self.config
	}

	async fn request(
		&self,
		one_time_password: &str,
		refresh_token: &str,
	) -> Result<Option<AccessToken>> {
		let body = TokenRequest {
			grant_type: GRANT_TYPE,
			scopes: SCOPES,
			client_secret: format!("{one_time_password}{}", self.config.effective_client_secret()),
			client_id: &self.config.client_id,
			refresh_token,
		};
		let issued_at = OffsetDateTime::now_utc();
		let response: TokenResponse = self.http.post_json(&self.config.url, &body).await?;

		Ok(Some(response.into_token(issued_at)?))
	}
}
impl OAuthTokenService for HmrcTokenService {
	fn exchange<'a>(
		&'a self,
		one_time_password: &'a str,
	) -> ServiceFuture<'a, Option<AccessToken>> {
		Box::pin(self.request(one_time_password, ""))
	}

	fn exchange_with_refresh_token<'a>(
		&'a self,
		one_time_password: &'a str,
		refresh_token: &'a str,
	) -> ServiceFuture<'a, Option<AccessToken>> {
		Box::pin(self.request(one_time_password, refresh_token))
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn request_body_uses_the_endpoint_field_names() {
		let body = TokenRequest {
			grant_type: GRANT_TYPE,
			scopes: SCOPES,
			client_secret: "12345678".into(),
			client_id: "levy",
			refresh_token: "",
		};
		let json = serde_json::to_value(&body).expect("Request body should serialize.");

		assert_eq!(
			json,
			serde_json::json!({
				"grant_type": "client_credentials",
				"scopes": "read:apprenticeship-levy",
				"client_secret": "12345678",
				"client_id": "levy",
				"refresh_token": ""
			})
		);
	}

	#[test]
	fn response_expiry_is_relative_to_issue_time() {
		let response: TokenResponse = serde_json::from_str(
			r#"{"access_token":"a","refresh_token":"r","expires_in":14400,"scope":"read:apprenticeship-levy","token_type":"bearer"}"#,
		)
		.expect("Response JSON should deserialize.");
		let token = response
			.into_token(macros::datetime!(2025-01-01 00:00 UTC))
			.expect("Response should convert into a token.");

		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 04:00 UTC));
		assert_eq!(token.refresh_secret(), Some("r"));
		assert_eq!(token.token_type.as_deref(), Some("bearer"));
	}

	#[test]
	fn overflowing_expiry_is_an_error() {
		let response: TokenResponse =
			serde_json::from_str(&format!(r#"{{"access_token":"a","expires_in":{}}}"#, i64::MAX))
				.expect("Response JSON should deserialize.");

		assert!(matches!(
			response.into_token(macros::datetime!(2025-01-01 00:00 UTC)),
			Err(AccessTokenBuilderError::ExpiryOutOfRange)
		));
	}

	#[test]
	fn invalid_configuration_is_rejected() {
		let config = TokenServiceConfig::new(
			Url::parse("https://example.com/oauth/token").expect("URL fixture should parse."),
			"",
		);

		assert!(matches!(HmrcTokenService::new(config), Err(ConfigError::EmptyClientId)));
	}
}
