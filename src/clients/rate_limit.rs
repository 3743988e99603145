//! Rate-limit tracking for a sub-client.
//!
//! Twitch reports its token-bucket state on every response through the
//! `Ratelimit-Limit`, `Ratelimit-Remaining` and `Ratelimit-Reset` headers.
//! [`RateLimitTracker`] keeps the most recent values and turns them into an
//! advisory pacing interval. It never blocks a request.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default bucket size assumed before the first response.
pub const DEFAULT_LIMIT: i64 = 120;

/// Interval returned when no reset time in the future is known.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// A snapshot of the server's rate-limit state.
///
/// Values are stored as the server sent them, negative ones included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Bucket size.
    pub limit: i64,
    /// Points left in the current window.
    pub remaining: i64,
    /// When the bucket refills, if known.
    pub reset_at: Option<DateTime<Utc>>,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            remaining: DEFAULT_LIMIT,
            reset_at: None,
        }
    }
}

impl RateLimit {
    /// Computes the pacing interval at `now`, floored at `minimum`.
    ///
    /// With a reset time in the future the remaining window is spread evenly
    /// over the remaining points; an exhausted (or overdrawn) bucket waits
    /// for the whole window. Otherwise [`DEFAULT_INTERVAL`] applies.
    #[must_use]
    pub fn interval_at(&self, now: DateTime<Utc>, minimum: Duration) -> Duration {
        let computed = match self.reset_at {
            Some(reset_at) if reset_at > now => {
                let window = (reset_at - now).to_std().unwrap_or_default();
                if self.remaining <= 0 {
                    window
                } else {
                    window / u32::try_from(self.remaining).unwrap_or(u32::MAX)
                }
            }
            _ => DEFAULT_INTERVAL,
        };

        computed.max(minimum)
    }
}

/// Last-write-wins store of the latest [`RateLimit`] observed by a sub-client.
///
/// Safe to share across tasks; each update holds the lock only for the copy.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use twitch_api::clients::RateLimitTracker;
///
/// let tracker = RateLimitTracker::new();
/// assert_eq!(tracker.snapshot().remaining, 120);
///
/// // No reset time known yet: the default interval applies.
/// assert_eq!(tracker.interval_until_safe(Duration::ZERO), Duration::from_millis(500));
/// assert_eq!(tracker.interval_until_safe(Duration::from_secs(1)), Duration::from_secs(1));
/// ```
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    state: Mutex<RateLimit>,
}

impl RateLimitTracker {
    /// Creates a tracker holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the stored state.
    pub fn record(&self, rate_limit: RateLimit) {
        tracing::trace!(
            limit = rate_limit.limit,
            remaining = rate_limit.remaining,
            reset_at = ?rate_limit.reset_at,
            "Rate limit updated"
        );
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = rate_limit;
    }

    /// Returns a copy of the stored state.
    #[must_use]
    pub fn snapshot(&self) -> RateLimit {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns how long to wait before the next call to stay within the limit.
    #[must_use]
    pub fn interval_until_safe(&self, minimum: Duration) -> Duration {
        self.snapshot().interval_at(Utc::now(), minimum)
    }
}

// Verify RateLimitTracker is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RateLimitTracker>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let snapshot = RateLimitTracker::new().snapshot();
        assert_eq!(snapshot.limit, 120);
        assert_eq!(snapshot.remaining, 120);
        assert!(snapshot.reset_at.is_none());
    }

    #[test]
    fn test_interval_spreads_window_over_remaining() {
        let rate_limit = RateLimit {
            limit: 800,
            remaining: 10,
            reset_at: Some(now() + chrono::Duration::seconds(10)),
        };
        assert_eq!(rate_limit.interval_at(now(), Duration::ZERO), Duration::from_secs(1));
    }

    #[test]
    fn test_interval_respects_minimum() {
        let rate_limit = RateLimit {
            limit: 800,
            remaining: 100,
            reset_at: Some(now() + chrono::Duration::seconds(10)),
        };
        assert_eq!(
            rate_limit.interval_at(now(), Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_interval_waits_full_window_when_exhausted() {
        let rate_limit = RateLimit {
            limit: 800,
            remaining: 0,
            reset_at: Some(now() + chrono::Duration::seconds(30)),
        };
        assert_eq!(rate_limit.interval_at(now(), Duration::ZERO), Duration::from_secs(30));
    }

    #[test]
    fn test_interval_waits_full_window_when_overdrawn() {
        let rate_limit = RateLimit {
            limit: 800,
            remaining: -3,
            reset_at: Some(now() + chrono::Duration::seconds(30)),
        };
        assert_eq!(rate_limit.interval_at(now(), Duration::ZERO), Duration::from_secs(30));
    }

    #[test]
    fn test_interval_defaults_when_reset_passed() {
        let rate_limit = RateLimit {
            limit: 800,
            remaining: 0,
            reset_at: Some(now() - chrono::Duration::seconds(1)),
        };
        assert_eq!(rate_limit.interval_at(now(), Duration::ZERO), DEFAULT_INTERVAL);
    }

    #[test]
    fn test_record_is_last_write_wins() {
        let tracker = RateLimitTracker::new();
        tracker.record(RateLimit {
            limit: 800,
            remaining: 799,
            reset_at: None,
        });
        tracker.record(RateLimit {
            limit: 800,
            remaining: 5,
            reset_at: None,
        });
        assert_eq!(tracker.snapshot().remaining, 5);
    }
}
