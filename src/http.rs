//! Reqwest transport for the token endpoint.
//!
//! [`ReqwestHttpClient::post_json`] owns the status handling shared by every exchange: 2xx bodies
//! are parsed with `serde_path_to_error`, non-2xx responses become [`UpstreamError`]s carrying
//! the status and any `Retry-After` hint, and client-side timeouts are reported as HTTP 408 so
//! the execution policy's request-timeout rule applies.

// crates.io
use reqwest::{
	header::{ACCEPT, HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError, UpstreamError},
};

/// Media type the token endpoint requires in the `Accept` header.
pub const HMRC_ACCEPT: &str = "application/vnd.hmrc.1.0+json";

const BODY_PREVIEW_LIMIT: usize = 256;

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests should not follow redirects. Clients built by
/// [`with_timeout`](Self::with_timeout) disable them, and custom clients passed to
/// [`with_client`](Self::with_client) should too.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with redirects disabled and a per-request timeout.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).timeout(timeout).build()?;

		Ok(Self(client))
	}

	/// Posts `body` as JSON and deserializes a successful JSON response.
	pub async fn post_json<B, T>(&self, url: &Url, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let response = self
			.0
			.post(url.clone())
			.header(ACCEPT, HMRC_ACCEPT)
			.json(body)
			.send()
			.await
			.map_err(map_send_error)?;
		let status = response.status();
		let retry_after = parse_retry_after(response.headers());
		let bytes = response.bytes().await.map_err(map_send_error)?;

		if !status.is_success() {
			let preview = String::from_utf8_lossy(&bytes);
			let message = match preview.trim() {
				"" => status.canonical_reason().unwrap_or("no response body").to_owned(),
				text => text.chars().take(BODY_PREVIEW_LIMIT).collect(),
			};

			return Err(UpstreamError::new(status.as_u16(), message)
				.with_retry_after(retry_after)
				.into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::ResponseParse { source, status: Some(status.as_u16()) })
	}
}

fn map_send_error(e: ReqwestError) -> Error {
	if e.is_timeout() {
		return UpstreamError::new(408, "request to the token endpoint timed out").into();
	}

	TransportError::from(e).into()
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return (secs >= 0).then(|| Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn headers(retry_after: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(
			RETRY_AFTER,
			HeaderValue::from_str(retry_after).expect("Header fixture should be valid."),
		);

		headers
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		assert_eq!(parse_retry_after(&headers("120")), Some(Duration::seconds(120)));
		assert_eq!(parse_retry_after(&headers("-1")), None);
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[test]
	fn retry_after_accepts_future_http_dates_only() {
		assert_eq!(parse_retry_after(&headers("Wed, 21 Oct 2015 07:28:00 GMT")), None);

		let future = (OffsetDateTime::now_utc() + Duration::hours(1))
			.format(&Rfc2822)
			.expect("RFC 2822 formatting should succeed.");
		let delta = parse_retry_after(&headers(&future)).expect("Future dates should parse.");

		assert!(delta > Duration::minutes(59));
	}
}
