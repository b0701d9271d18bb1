// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh calls.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	refreshed: AtomicU64,
	skipped: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of refresh calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that renewed a record through the broker.
	pub fn refreshed(&self) -> u64 {
		self.refreshed.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that found the record still fresh.
	pub fn skipped(&self) -> u64 {
		self.skipped.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refresh calls.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refreshed(&self) {
		self.refreshed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_skipped(&self) {
		self.skipped.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_start_at_zero_and_accumulate() {
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();
		metrics.record_attempt();
		metrics.record_skipped();
		metrics.record_failure();

		assert_eq!(metrics.attempts(), 2);
		assert_eq!(metrics.skipped(), 1);
		assert_eq!(metrics.failures(), 1);
		assert_eq!(metrics.refreshed(), 0);
	}
}
