// self
use crate::{_prelude::*, error::OtpError};

/// Code length and time-step configuration for [`TotpGenerator`](crate::otp::TotpGenerator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotpSettings {
	/// Number of decimal digits in each code.
	pub code_length: u32,
	/// Width of one time step in seconds.
	pub time_step_interval: u64,
}
impl TotpSettings {
	/// Default number of digits.
	pub const DEFAULT_CODE_LENGTH: u32 = 8;
	/// Default time-step width in seconds.
	pub const DEFAULT_TIME_STEP_INTERVAL: u64 = 30;
	/// Largest supported code length; the truncated HMAC value has ten decimal digits at most.
	pub const MAX_CODE_LENGTH: u32 = 10;

	/// Overrides the code length.
	pub fn with_code_length(mut self, code_length: u32) -> Self {
		self.code_length = code_length;

		self
	}

	/// Overrides the time-step width.
	pub fn with_time_step_interval(mut self, seconds: u64) -> Self {
		self.time_step_interval = seconds;

		self
	}

	/// Checks that the settings can produce codes.
	pub fn validate(&self) -> Result<(), OtpError> {
		if self.code_length == 0 || self.code_length > Self::MAX_CODE_LENGTH {
			return Err(OtpError::malformed(format!(
				"code length must be between 1 and {}, got {}",
				Self::MAX_CODE_LENGTH,
				self.code_length
			)));
		}
		if self.time_step_interval == 0 || i64::try_from(self.time_step_interval).is_err() {
			return Err(OtpError::malformed(format!(
				"time step interval must be a positive number of seconds, got {}",
				self.time_step_interval
			)));
		}

		Ok(())
	}
}
impl Default for TotpSettings {
	fn default() -> Self {
		Self {
			code_length: Self::DEFAULT_CODE_LENGTH,
			time_step_interval: Self::DEFAULT_TIME_STEP_INTERVAL,
		}
	}
}
