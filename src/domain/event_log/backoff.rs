//! Retry backoff policy keyed by attempt count.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How long a FAILED entry waits before it may be claimed again.
///
/// `attempt` is the number of failed attempts recorded so far, starting at 1
/// after the first failure.
#[derive(Clone)]
pub enum BackoffPolicy {
    /// Same delay after every failure.
    Fixed(Duration),
    /// `initial * 2^(attempt - 1)`, capped at `max`.
    Exponential { initial: Duration, max: Duration },
    /// Caller-supplied function.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl BackoffPolicy {
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        BackoffPolicy::Exponential { initial, max }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        BackoffPolicy::Custom(Arc::new(f))
    }

    /// Delay before the next attempt after `attempt` failures.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffPolicy::Fixed(delay) => *delay,
            BackoffPolicy::Exponential { initial, max } => {
                let exponent = attempt.saturating_sub(1);
                let factor = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
                initial.checked_mul(factor).unwrap_or(*max).min(*max)
            }
            BackoffPolicy::Custom(f) => f(attempt),
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Exponential {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(300),
        }
    }
}

impl fmt::Debug for BackoffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackoffPolicy::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            BackoffPolicy::Exponential { initial, max } => f
                .debug_struct("Exponential")
                .field("initial", initial)
                .field("max", max)
                .finish(),
            BackoffPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exponential_doubles_per_attempt() {
        let policy = BackoffPolicy::exponential(Duration::from_millis(100), Duration::from_secs(60));
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
    }

    #[test]
    fn exponential_is_capped() {
        let policy = BackoffPolicy::exponential(Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(policy.delay(5), Duration::from_secs(10));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn zeroth_attempt_uses_initial_delay() {
        let policy = BackoffPolicy::exponential(Duration::from_secs(2), Duration::from_secs(10));
        assert_eq!(policy.delay(0), Duration::from_secs(2));
    }

    #[test]
    fn fixed_ignores_attempt() {
        let policy = BackoffPolicy::Fixed(Duration::from_secs(5));
        assert_eq!(policy.delay(1), policy.delay(9));
    }

    #[test]
    fn custom_policy_is_called() {
        let policy = BackoffPolicy::custom(|attempt| Duration::from_secs(u64::from(attempt) * 3));
        assert_eq!(policy.delay(2), Duration::from_secs(6));
        assert_eq!(format!("{:?}", policy), "Custom(..)");
    }

    proptest! {
        #[test]
        fn exponential_is_monotone_and_bounded(
            initial_ms in 1u64..10_000,
            max_ms in 10_000u64..1_000_000,
            attempt in 0u32..64,
        ) {
            let max = Duration::from_millis(max_ms);
            let policy = BackoffPolicy::exponential(Duration::from_millis(initial_ms), max);
            let current = policy.delay(attempt);
            let next = policy.delay(attempt + 1);
            prop_assert!(current <= next);
            prop_assert!(next <= max);
        }
    }
}
