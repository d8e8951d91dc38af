//! [`TotpService`] backed by [`TotpGenerator`] and Base32 shared secrets.

// self
use crate::{
	_prelude::*,
	error::OtpError,
	otp::{SharedSecret, TotpGenerator, TotpSettings, UnpaddedHmacSha512Hasher},
	service::TotpService,
};

/// Decodes the stored Base32 secret and derives a code for the current UTC instant.
#[derive(Clone, Debug)]
pub struct Base32TotpService {
	generator: TotpGenerator<UnpaddedHmacSha512Hasher>,
}
impl Base32TotpService {
	/// Creates the service from validated settings.
	pub fn new(settings: TotpSettings) -> Result<Self, OtpError> {
		Ok(Self { generator: TotpGenerator::new(UnpaddedHmacSha512Hasher, settings)? })
	}

	/// Generates the code for an explicit instant.
	pub fn generate_at(&self, shared_secret: &str, instant: OffsetDateTime) -> Result<String> {
		let secret = SharedSecret::from_base32(shared_secret)?;

		Ok(self.generator.generate(&secret, instant)?)
	}
}
impl TotpService for Base32TotpService {
	fn generate(&self, shared_secret: &str) -> Result<String> {
		self.generate_at(shared_secret, OffsetDateTime::now_utc())
	}
}
