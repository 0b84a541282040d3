//! Per-user rate gates. Throttle
//! counters are read-through queries over `outbox`/`bookmarks`; no cache
//! sits in front of them, since caching would race the atomic accept test.

use std::time::Duration;

/// The outcome of a throttle check: either the write may proceed, or the
/// caller must wait until `retry_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allow,
    Wait { wait: Duration },
    QuotaReached,
}

/// Computes the throttle decision for a write family given the count of
/// prior writes in the trailing window and the most recent one's
/// timestamp:
/// `next_allowed = last + max(1, count/factor) * unit`.
#[must_use]
pub fn decide(
    now_unix: i64,
    count_in_window: i64,
    last_unix: Option<i64>,
    factor: i64,
    unit: Duration,
    daily_quota: i64,
) -> ThrottleDecision {
    if count_in_window >= daily_quota {
        return ThrottleDecision::QuotaReached;
    }

    let Some(last_unix) = last_unix else {
        return ThrottleDecision::Allow;
    };

    let multiplier = (count_in_window / factor.max(1)).max(1);
    let interval = unit.as_secs() as i64 * multiplier;
    let next_allowed = last_unix + interval;

    if now_unix >= next_allowed {
        ThrottleDecision::Allow
    } else {
        ThrottleDecision::Wait {
            wait: Duration::from_secs((next_allowed - now_unix) as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_first_write_with_no_prior_history() {
        let d = decide(1000, 0, None, 2, Duration::from_secs(60), 500);
        assert_eq!(d, ThrottleDecision::Allow);
    }

    #[test]
    fn twelve_creates_in_a_day_requires_a_minute_wait() {
        // 12 creates in 24h, factor=2, unit=1m, last create at t; a 13th at
        // t+5m should report `wait for 1m` since 12/2*1m = 6m.
        let t = 1_000_000i64;
        let d = decide(t + 300, 12, Some(t), 2, Duration::from_secs(60), 500);
        assert_eq!(
            d,
            ThrottleDecision::Wait {
                wait: Duration::from_secs(60)
            }
        );
    }

    #[test]
    fn allows_once_interval_elapses() {
        let t = 1_000_000i64;
        let d = decide(t + 360, 12, Some(t), 2, Duration::from_secs(60), 500);
        assert_eq!(d, ThrottleDecision::Allow);
    }

    #[test]
    fn quota_reached_blocks_regardless_of_timing() {
        let d = decide(1_000_000, 500, Some(1), 2, Duration::from_secs(60), 500);
        assert_eq!(d, ThrottleDecision::QuotaReached);
    }
}
