//! Wait-time policy for the ingestion worker.

use std::time::Duration;

/// Default wait between successful ingestions.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default wait after a failed fetch.
pub const DEFAULT_FETCH_RETRY_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default short wait after a duplicate, before escalation.
pub const DEFAULT_DUPLICATE_RETRY_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default number of consecutive duplicates tolerated before escalating.
pub const DEFAULT_DUPLICATE_THRESHOLD: u32 = 2;

/// Decides how long the worker sleeps after each cycle outcome.
///
/// After a duplicate the source has most likely not published the next
/// record yet, so the worker retries on the short `duplicate_retry_interval`
/// until `duplicate_threshold` consecutive duplicates have been seen, then
/// falls back to the full `poll_interval`.
///
/// ```
/// use journal::PollPolicy;
/// use std::time::Duration;
///
/// let policy = PollPolicy::default();
/// assert_eq!(policy.wait_after_duplicate(0), Duration::from_secs(3600));
/// assert_eq!(policy.wait_after_duplicate(2), Duration::from_secs(86400));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait after a successful insert or a non-duplicate store error.
    pub poll_interval: Duration,
    /// Wait after a failed fetch.
    pub fetch_retry_interval: Duration,
    /// Wait after a duplicate while below the threshold.
    pub duplicate_retry_interval: Duration,
    /// Consecutive duplicates seen before the wait escalates to `poll_interval`.
    pub duplicate_threshold: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_retry_interval: DEFAULT_FETCH_RETRY_INTERVAL,
            duplicate_retry_interval: DEFAULT_DUPLICATE_RETRY_INTERVAL,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }
}

impl PollPolicy {
    /// Wait after a record was inserted.
    #[must_use]
    pub const fn wait_after_insert(&self) -> Duration {
        self.poll_interval
    }

    /// Wait after the source failed to deliver a record.
    #[must_use]
    pub const fn wait_after_fetch_error(&self) -> Duration {
        self.fetch_retry_interval
    }

    /// Wait after the store failed for a reason other than a duplicate.
    #[must_use]
    pub const fn wait_after_store_error(&self) -> Duration {
        self.poll_interval
    }

    /// Wait after a duplicate, given the number of consecutive duplicates
    /// observed before this one.
    #[must_use]
    pub const fn wait_after_duplicate(&self, prior_duplicates: u32) -> Duration {
        if prior_duplicates < self.duplicate_threshold {
            self.duplicate_retry_interval
        } else {
            self.poll_interval
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_escalates_at_threshold() {
        let policy = PollPolicy::default();
        let short = policy.duplicate_retry_interval;
        let long = policy.poll_interval;

        let waits: Vec<_> = (0..5).map(|n| policy.wait_after_duplicate(n)).collect();
        assert_eq!(waits, vec![short, short, long, long, long]);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = PollPolicy {
            poll_interval: Duration::from_secs(100),
            fetch_retry_interval: Duration::from_secs(5),
            duplicate_retry_interval: Duration::from_secs(10),
            duplicate_threshold: 1,
        };

        assert_eq!(policy.wait_after_duplicate(0), Duration::from_secs(10));
        assert_eq!(policy.wait_after_duplicate(1), Duration::from_secs(100));
        assert_eq!(policy.wait_after_fetch_error(), Duration::from_secs(5));
        assert_eq!(policy.wait_after_insert(), Duration::from_secs(100));
        assert_eq!(policy.wait_after_store_error(), Duration::from_secs(100));
    }
}
