//! Redacted wrapper for token and credential material.

// self
use crate::_prelude::*;

/// Secret string (access token, refresh token, one-time password) that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_never_print_the_value() {
		let secret = TokenSecret::from("ACCESS-TOKEN");

		assert_eq!(format!("{secret:?}"), "TokenSecret(<redacted>)");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "ACCESS-TOKEN");
		assert!(!secret.is_empty());
	}
}
