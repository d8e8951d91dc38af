// crates.io
use data_encoding::BASE32_NOPAD;
// self
use crate::{_prelude::*, error::OtpError};

/// Shared secret bytes that key the one-time password HMAC.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(Vec<u8>);
impl SharedSecret {
	/// Wraps raw secret bytes; empty secrets are rejected.
	pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, OtpError> {
		let bytes = bytes.into();

		if bytes.is_empty() {
			return Err(OtpError::malformed("shared secret is empty"));
		}

		Ok(Self(bytes))
	}

	/// Decodes an RFC 4648 Base32 secret. Padding, whitespace, and lowercase input are accepted.
	pub fn from_base32(encoded: &str) -> Result<Self, OtpError> {
		let normalized = encoded
			.chars()
			.filter(|c| !c.is_whitespace() && *c != '=')
			.map(|c| c.to_ascii_uppercase())
			.collect::<String>();
		let bytes = BASE32_NOPAD
			.decode(normalized.as_bytes())
			.map_err(|e| OtpError::malformed(format!("shared secret is not valid Base32 ({e})")))?;

		Self::new(bytes)
	}

	/// Returns the raw secret bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Returns the secret repeated until it fills `required_length` bytes.
	///
	/// Secrets at least `required_length` long are returned unchanged (never truncated).
	pub fn key_of_length(&self, required_length: usize) -> Vec<u8> {
		if self.0.len() >= required_length {
			return self.0.clone();
		}

		self.0.iter().copied().cycle().take(required_length).collect()
	}
}
impl Debug for SharedSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SharedSecret").field(&format_args!("<{} bytes>", self.0.len())).finish()
	}
}
