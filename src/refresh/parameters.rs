// self
use crate::_prelude::*;

/// Scheduling knobs for [`TokenRefresher`](crate::refresh::TokenRefresher).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefresherParameters {
	lead_time_percentage: u32,
	retry_interval: StdDuration,
}
impl RefresherParameters {
	/// Earliest point of a token's lifetime, in percent, at which a refresh may fire.
	pub const MIN_LEAD_TIME_PERCENTAGE: u32 = 80;
	/// Latest point of a token's lifetime, in percent; 100 means the expiry instant itself.
	pub const MAX_LEAD_TIME_PERCENTAGE: u32 = 100;
	/// Default wait between failed refresh attempts within one cycle.
	pub const DEFAULT_RETRY_INTERVAL: StdDuration = StdDuration::from_secs(10);

	/// Sets the lead-time percentage, clamped into
	/// [`MIN_LEAD_TIME_PERCENTAGE`](Self::MIN_LEAD_TIME_PERCENTAGE)..=
	/// [`MAX_LEAD_TIME_PERCENTAGE`](Self::MAX_LEAD_TIME_PERCENTAGE).
	pub fn with_lead_time_percentage(mut self, percentage: u32) -> Self {
		self.lead_time_percentage =
			percentage.clamp(Self::MIN_LEAD_TIME_PERCENTAGE, Self::MAX_LEAD_TIME_PERCENTAGE);

		self
	}

	/// Sets the wait between failed refresh attempts.
	pub fn with_retry_interval(mut self, interval: StdDuration) -> Self {
		self.retry_interval = interval;

		self
	}

	/// Stored (clamped) lead-time percentage.
	pub fn lead_time_percentage(&self) -> u32 {
		self.lead_time_percentage
	}

	/// Wait between failed refresh attempts.
	pub fn retry_interval(&self) -> StdDuration {
		self.retry_interval
	}
}
impl Default for RefresherParameters {
	fn default() -> Self {
		Self {
			lead_time_percentage: Self::MIN_LEAD_TIME_PERCENTAGE,
			retry_interval: Self::DEFAULT_RETRY_INTERVAL,
		}
	}
}

/// Delay from `now` until `percentage` percent of the remaining time to `expiry` has elapsed.
///
/// Returns zero once `now` has reached `expiry`.
pub fn percentage_towards(
	now: OffsetDateTime,
	expiry: OffsetDateTime,
	percentage: u32,
) -> Duration {
	if now >= expiry {
		return Duration::ZERO;
	}

	let micros = (expiry - now).whole_microseconds() * i128::from(percentage) / 100;

	Duration::microseconds(i64::try_from(micros).unwrap_or(i64::MAX))
}
