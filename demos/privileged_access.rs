//! Runs the broker against a mocked HMRC token endpoint: a Base32 shared secret in an in-memory
//! secret store, the HMRC execution policy, and a background refresher auditing its schedule.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use tracing_subscriber::EnvFilter;
use url::Url;
// self
use hmrc_token_broker::{
	HmrcAuthTokenBroker,
	config::{BrokerConfig, RefresherParameters, TokenServiceConfig, TotpSettings},
	policy::ExecutionPolicy,
	refresh::{TokenRefreshAudit, TokenRefresher},
	service::{Base32TotpService, HmrcTokenService, MemorySecretRepository},
};

const SHARED_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"expires_in\":14400,\"scope\":\"read:apprenticeship-levy\",\"token_type\":\"bearer\"}",
			);
		})
		.await;
	let config = BrokerConfig::builder().retry_delay(Duration::from_secs(1)).build()?;
	let token_service = HmrcTokenService::new(
		TokenServiceConfig::new(Url::parse(&server.url("/oauth/token"))?, "demo-client")
			.with_client_secret("."),
	)?;
	let secrets =
		MemorySecretRepository::new().with_secret(BrokerConfig::DEFAULT_SECRET_NAME, SHARED_SECRET);
	let audit = Arc::new(TokenRefreshAudit::retaining());
	let refresher =
		TokenRefresher::new(RefresherParameters::default().with_lead_time_percentage(90))
			.with_audit(audit.clone());
	let broker = HmrcAuthTokenBroker::new(
		config,
		ExecutionPolicy::hmrc(Duration::from_secs(1)),
		Arc::new(token_service),
		Arc::new(secrets),
		Arc::new(Base32TotpService::new(TotpSettings::default())?),
		refresher,
	);
	let view = broker.privileged_access_token().await?;

	println!("{}", serde_json::to_string_pretty(&view)?);

	// Give the refresher a moment to open its first audit entry.
	tokio::time::sleep(Duration::from_millis(50)).await;

	for entry in audit.audit_items() {
		println!(
			"refresh planned at {} (in {}s) for a token expiring at {}",
			entry.planned_refresh_time,
			entry.planned_refresh_delay.whole_seconds(),
			entry.expiration_time
		);
	}

	token_mock.assert_calls_async(1).await;
	broker.dispose();

	Ok(())
}
