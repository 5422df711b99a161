//! Exponential backoff with multiplicative jitter.

use rand::Rng;
use std::time::Duration;

use super::policy::RetryPolicy;

/// Delay to wait before retry number `attempt` (1-based: 1 = before the first retry).
///
/// `initial_delay * 2^(attempt-1)` plus a jitter drawn uniformly from
/// `[0, jitter_ratio]` of that value, clamped to `max_delay`. The jitter comes
/// from the calling thread's generator, so concurrent callers never share
/// mutable RNG state.
pub fn backoff_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    let ratio = jitter_ratio(policy);
    let fraction = if ratio > 0.0 {
        rand::thread_rng().gen_range(0.0..=ratio)
    } else {
        0.0
    };
    backoff_delay_with_jitter(attempt, policy, fraction)
}

/// Same as [`backoff_delay`] with a caller-supplied jitter fraction.
pub fn backoff_delay_with_jitter(attempt: u32, policy: &RetryPolicy, fraction: f64) -> Duration {
    let exp = exponential_delay(attempt, policy.initial_delay);
    if exp >= policy.max_delay {
        return policy.max_delay;
    }
    let fraction = if fraction.is_finite() { fraction.max(0.0) } else { 0.0 };
    let jitter = Duration::try_from_secs_f64(exp.as_secs_f64() * fraction).unwrap_or(Duration::MAX);
    exp.saturating_add(jitter).min(policy.max_delay)
}

/// `initial * 2^(attempt-1)`, saturating instead of overflowing.
pub fn exponential_delay(attempt: u32, initial: Duration) -> Duration {
    let shift = attempt.saturating_sub(1);
    if shift >= 32 {
        return if initial.is_zero() { Duration::ZERO } else { Duration::MAX };
    }
    initial.saturating_mul(1u32 << shift)
}

fn jitter_ratio(policy: &RetryPolicy) -> f64 {
    if policy.jitter_ratio.is_finite() {
        policy.jitter_ratio.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(initial_ms: u64, max_ms: u64) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_millis(max_ms),
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let p = policy(1_000, 30_000);
        assert_eq!(backoff_delay_with_jitter(1, &p, 0.0), Duration::from_secs(1));
        assert_eq!(backoff_delay_with_jitter(2, &p, 0.0), Duration::from_secs(2));
        assert_eq!(backoff_delay_with_jitter(3, &p, 0.0), Duration::from_secs(4));
        assert_eq!(backoff_delay_with_jitter(6, &p, 0.0), Duration::from_secs(30));
    }

    #[test]
    fn full_jitter_adds_twenty_percent() {
        let p = policy(1_000, 30_000);
        assert_eq!(backoff_delay_with_jitter(1, &p, 0.2), Duration::from_millis(1_200));
        assert_eq!(backoff_delay_with_jitter(2, &p, 0.2), Duration::from_millis(2_400));
    }

    #[test]
    fn random_delay_stays_within_bounds() {
        let p = policy(250, 30_000);
        for attempt in 1..=10u32 {
            let base = p.initial_delay * 2u32.pow(attempt - 1);
            let upper = (base + base / 5 + Duration::from_micros(1)).min(p.max_delay);
            for _ in 0..50 {
                let d = backoff_delay(attempt, &p);
                assert!(d >= base.min(p.max_delay), "attempt {attempt}: {d:?} < {base:?}");
                assert!(d <= upper, "attempt {attempt}: {d:?} > {upper:?}");
            }
        }
    }

    #[test]
    fn very_large_attempts_never_exceed_cap() {
        let p = policy(500, 10_000);
        for attempt in [33, 64, 1_000, u32::MAX] {
            assert_eq!(backoff_delay(attempt, &p), p.max_delay);
        }
    }

    #[test]
    fn initial_above_cap_is_clamped_immediately() {
        let p = policy(5_000, 1_000);
        assert_eq!(backoff_delay(1, &p), Duration::from_secs(1));
    }

    #[test]
    fn sub_second_delays_keep_precision() {
        let p = policy(3, 1_000);
        assert_eq!(backoff_delay_with_jitter(1, &p, 0.5), Duration::from_micros(4_500));
    }

    #[test]
    fn zero_or_bogus_jitter_ratio_is_deterministic() {
        let mut p = policy(100, 1_000);
        p.jitter_ratio = 0.0;
        assert_eq!(backoff_delay(2, &p), Duration::from_millis(200));
        p.jitter_ratio = f64::NAN;
        assert_eq!(backoff_delay(2, &p), Duration::from_millis(200));
    }
}
