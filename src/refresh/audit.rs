//! Planned versus actual timing of background refresh cycles.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Timing record of one wait-then-refresh cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshAuditEntry {
	/// Expiry of the token being refreshed.
	pub expiration_time: OffsetDateTime,
	/// Delay the refresher planned to wait before refreshing.
	pub planned_refresh_delay: Duration,
	/// Instant the refresher planned to start refreshing.
	pub planned_refresh_time: OffsetDateTime,
	/// Instant the refresh actually started.
	pub actual_refresh_start: Option<OffsetDateTime>,
	/// Instant the refresh produced a replacement token.
	pub actual_refresh_end: Option<OffsetDateTime>,
	/// Number of refresh callback invocations in this cycle.
	pub refresh_attempts: u32,
}
impl RefreshAuditEntry {
	fn new(expiration_time: OffsetDateTime, created_at: OffsetDateTime) -> Self {
		Self {
			expiration_time,
			planned_refresh_delay: Duration::ZERO,
			planned_refresh_time: created_at,
			actual_refresh_start: None,
			actual_refresh_end: None,
			refresh_attempts: 0,
		}
	}

	/// Returns `true` when the refresh started after the token had already expired.
	pub fn is_overdue(&self) -> bool {
		self.actual_refresh_start.is_some_and(|start| start > self.expiration_time)
	}

	/// Returns `true` once the cycle has both started and ended.
	pub fn is_complete(&self) -> bool {
		self.actual_refresh_start.is_some() && self.actual_refresh_end.is_some()
	}
}

/// Shared handle to an entry that is still being filled in by the refresher.
#[derive(Clone, Debug)]
pub struct RefreshAuditHandle(Arc<Mutex<RefreshAuditEntry>>);
impl RefreshAuditHandle {
	/// Copies the entry's current state.
	pub fn snapshot(&self) -> RefreshAuditEntry {
		self.0.lock().clone()
	}

	pub(crate) fn plan(&self, now: OffsetDateTime, delay: Duration) {
		let mut entry = self.0.lock();

		entry.planned_refresh_delay = delay;
		entry.planned_refresh_time = now + delay;
	}

	pub(crate) fn record_attempt(&self) -> u32 {
		let mut entry = self.0.lock();

		entry.refresh_attempts += 1;

		entry.refresh_attempts
	}
}

/// Creates audit entries and, in retaining mode, keeps them in creation order.
#[derive(Debug, Default)]
pub struct TokenRefreshAudit {
	retain: bool,
	entries: Mutex<Vec<RefreshAuditHandle>>,
}
impl TokenRefreshAudit {
	/// Audit that hands out entries without keeping them.
	pub fn new() -> Self {
		Self::default()
	}

	/// Audit that keeps every entry for later inspection.
	pub fn retaining() -> Self {
		Self { retain: true, entries: Mutex::default() }
	}

	/// Returns `true` when entries are retained.
	pub fn is_retaining(&self) -> bool {
		self.retain
	}

	/// Opens an entry for the cycle that will replace `token`.
	pub fn create_entry(&self, token: &AccessToken) -> RefreshAuditHandle {
		let handle = RefreshAuditHandle(Arc::new(Mutex::new(RefreshAuditEntry::new(
			token.expires_at,
			OffsetDateTime::now_utc(),
		))));

		if self.retain {
			self.entries.lock().push(handle.clone());
		}

		handle
	}

	/// Stamps the current UTC instant as the entry's refresh start.
	pub fn refresh_started(&self, entry: &RefreshAuditHandle) {
		entry.0.lock().actual_refresh_start = Some(OffsetDateTime::now_utc());
	}

	/// Stamps the current UTC instant as the entry's refresh end.
	pub fn refresh_ended(&self, entry: &RefreshAuditHandle) {
		entry.0.lock().actual_refresh_end = Some(OffsetDateTime::now_utc());
	}

	/// Snapshots of retained entries in creation order; empty when not retaining.
	pub fn audit_items(&self) -> Vec<RefreshAuditEntry> {
		self.entries.lock().iter().map(RefreshAuditHandle::snapshot).collect()
	}
}
