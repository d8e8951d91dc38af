// self
use crate::{
	_prelude::*,
	error::OtpError,
	otp::{HmacSha512Hasher, OtpHasher, SharedSecret, TotpSettings},
};

/// Counter-based one-time password core: keyed hash plus dynamic truncation.
#[derive(Clone, Debug)]
pub struct OtpGenerator<H = HmacSha512Hasher> {
	hasher: H,
	code_length: u32,
}
impl<H> OtpGenerator<H>
where
	H: OtpHasher,
{
	/// Creates a generator producing codes of `code_length` digits.
	pub fn new(hasher: H, code_length: u32) -> Result<Self, OtpError> {
		TotpSettings::default().with_code_length(code_length).validate()?;

		Ok(Self { hasher, code_length })
	}

	/// Number of digits in each generated code.
	pub fn code_length(&self) -> u32 {
		self.code_length
	}

	/// Computes the zero-padded code for `message` under `secret`.
	pub fn generate(&self, secret: &SharedSecret, message: &[u8]) -> Result<String, OtpError> {
		let key = self.hasher.hash_key(secret);
		let hash = self.hasher.compute_hash(&key, message)?;
		let last = *hash.last().ok_or_else(|| OtpError::malformed("hash output is empty"))?;
		let offset = usize::from(last & 0x0f);
		let window = hash.get(offset..offset + 4).ok_or_else(|| {
			OtpError::malformed(format!(
				"hash output of {} bytes is too short for truncation at offset {offset}",
				hash.len()
			))
		})?;
		let binary = (u32::from(window[0] & 0x7f) << 24)
			| (u32::from(window[1]) << 16)
			| (u32::from(window[2]) << 8)
			| u32::from(window[3]);
		let otp = u64::from(binary) % 10_u64.pow(self.code_length);

		Ok(format!("{otp:0width$}", width = self.code_length as usize))
	}
}

/// Time-based one-time password generator.
///
/// The time step is `floor(unix_seconds / time_step_interval)`, rendered as a 16-digit
/// big-endian hex counter and decoded back into the 8-byte HMAC message.
#[derive(Clone, Debug)]
pub struct TotpGenerator<H = HmacSha512Hasher> {
	otp: OtpGenerator<H>,
	time_step_interval: i64,
}
impl<H> TotpGenerator<H>
where
	H: OtpHasher,
{
	/// Creates a generator from validated settings.
	pub fn new(hasher: H, settings: TotpSettings) -> Result<Self, OtpError> {
		settings.validate()?;

		let time_step_interval = i64::try_from(settings.time_step_interval)
			.map_err(|_| OtpError::malformed("time step interval is out of range"))?;

		Ok(Self { otp: OtpGenerator::new(hasher, settings.code_length)?, time_step_interval })
	}

	/// Returns the time step containing `instant`.
	pub fn time_step(&self, instant: OffsetDateTime) -> i64 {
		instant.unix_timestamp().div_euclid(self.time_step_interval)
	}

	/// Generates the code for the time step containing `instant`.
	pub fn generate(
		&self,
		secret: &SharedSecret,
		instant: OffsetDateTime,
	) -> Result<String, OtpError> {
		let counter = format!("{:016X}", self.time_step(instant));
		let message = hex_to_bytes(&counter)?;

		self.otp.generate(secret, &message)
	}

	/// Generates the code for the current UTC instant.
	pub fn generate_now(&self, secret: &SharedSecret) -> Result<String, OtpError> {
		self.generate(secret, OffsetDateTime::now_utc())
	}
}
impl TotpGenerator<HmacSha512Hasher> {
	/// HMAC-SHA-512 generator with 64-byte key stretching and the provided settings.
	pub fn hmac_sha512(settings: TotpSettings) -> Result<Self, OtpError> {
		Self::new(HmacSha512Hasher, settings)
	}
}

fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, OtpError> {
	if hex.len() % 2 == 1 {
		return Err(OtpError::malformed(format!(
			"the binary key cannot have an odd number of digits: {hex}"
		)));
	}

	(0..hex.len())
		.step_by(2)
		.map(|index| {
			hex.get(index..index + 2)
				.and_then(|pair| u8::from_str_radix(pair, 16).ok())
				.ok_or_else(|| OtpError::malformed(format!("invalid hex digits in {hex}")))
		})
		.collect()
}
