//! Wait policy between failed pipeline cycles.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::ValidationError;

/// Delay schedule applied after consecutive failed cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay after every failure.
    Fixed { delay: Duration },
    /// `base * factor^attempt`, capped at `max`.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        /// Spread each delay uniformly over +/- 50%.
        jitter: bool,
    },
}

impl Backoff {
    /// Delay before the retry following failure number `attempt + 1`.
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = (base.as_secs_f64() * factor.powi(exponent)).min(max.as_secs_f64());
                let seconds = if seconds.is_finite() && seconds > 0.0 {
                    seconds
                } else {
                    max.as_secs_f64()
                };

                if jitter {
                    // Uniform in [0.5, 1.5) of the capped delay.
                    Duration::from_secs_f64(seconds * (0.5 + fastrand::f64()))
                } else {
                    Duration::from_secs_f64(seconds)
                }
            }
        }
    }
}

/// Named backoff choice used by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackoffKind {
    /// Retry after the regular refresh interval.
    #[default]
    Fixed,
    /// Start short and grow up to the refresh interval.
    Exponential,
}

impl BackoffKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Exponential => "exponential",
        }
    }

    /// Concrete schedule for a loop that normally waits `interval`.
    pub fn backoff_for(self, interval: Duration) -> Backoff {
        match self {
            Self::Fixed => Backoff::Fixed { delay: interval },
            Self::Exponential => Backoff::Exponential {
                base: Duration::from_secs(30).min(interval),
                factor: 2.0,
                max: interval,
                jitter: true,
            },
        }
    }
}

impl Display for BackoffKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackoffKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "exponential" => Ok(Self::Exponential),
            other => Err(ValidationError::InvalidBackoff {
                value: other.to_owned(),
            }),
        }
    }
}

/// How the supervising loop reacts to failed cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub backoff: Backoff,
    /// Give up after this many failures in a row; `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            backoff: Backoff::Fixed { delay },
            max_consecutive_failures: None,
        }
    }

    pub fn with_max_consecutive_failures(mut self, limit: u32) -> Self {
        self.max_consecutive_failures = Some(limit);
        self
    }

    /// Wait after `consecutive_failures` failures in a row (1-based).
    pub fn delay_after(&self, consecutive_failures: u32) -> Duration {
        self.backoff.delay(consecutive_failures.saturating_sub(1))
    }

    pub fn is_exhausted(&self, consecutive_failures: u32) -> bool {
        self.max_consecutive_failures
            .is_some_and(|limit| consecutive_failures >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_backoff_ignores_attempt() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_secs(60),
        };

        assert_eq!(backoff.delay(0), Duration::from_secs(60));
        assert_eq!(backoff.delay(7), Duration::from_secs(60));
    }

    #[test]
    fn exponential_backoff_grows_until_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_half_either_side() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(400),
            factor: 1.0,
            max: Duration::from_secs(10),
            jitter: true,
        };

        for _ in 0..50 {
            let delay = backoff.delay(3);
            assert!(delay >= Duration::from_millis(200), "{delay:?}");
            assert!(delay < Duration::from_millis(600), "{delay:?}");
        }
    }

    #[test]
    fn fixed_kind_retries_after_the_refresh_interval() {
        let interval = Duration::from_secs(86_400);
        assert_eq!(
            BackoffKind::Fixed.backoff_for(interval),
            Backoff::Fixed { delay: interval }
        );
        assert!(matches!(
            BackoffKind::Exponential.backoff_for(interval),
            Backoff::Exponential { max, .. } if max == interval
        ));
    }

    #[test]
    fn backoff_kind_parses() {
        assert_eq!("Exponential".parse::<BackoffKind>(), Ok(BackoffKind::Exponential));
        assert_eq!(
            "linear".parse::<BackoffKind>(),
            Err(ValidationError::InvalidBackoff {
                value: "linear".into()
            })
        );
    }

    #[test]
    fn policy_counts_failures_from_one() {
        let policy = RetryPolicy {
            backoff: Backoff::Exponential {
                base: Duration::from_millis(10),
                factor: 2.0,
                max: Duration::from_secs(1),
                jitter: false,
            },
            max_consecutive_failures: Some(3),
        };

        assert_eq!(policy.delay_after(1), Duration::from_millis(10));
        assert_eq!(policy.delay_after(2), Duration::from_millis(20));
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
        assert!(!RetryPolicy::fixed(Duration::ZERO).is_exhausted(u32::MAX));
    }
}
