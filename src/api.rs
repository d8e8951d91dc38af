//! Wire view handed to the HTTP API layer.

// self
use crate::{_prelude::*, auth::AccessToken};

/// `{accessCode, expiryTime}` body returned for a privileged access token request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegedAccessToken {
	/// Bearer token value.
	pub access_code: String,
	/// Expiry instant, serialized as RFC 3339.
	#[serde(with = "time::serde::rfc3339")]
	pub expiry_time: OffsetDateTime,
}
impl From<&AccessToken> for PrivilegedAccessToken {
	fn from(token: &AccessToken) -> Self {
		Self { access_code: token.access_token.expose().to_owned(), expiry_time: token.expires_at }
	}
}
