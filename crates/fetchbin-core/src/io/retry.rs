//! Bounded retry with exponential backoff for artifact downloads.

use std::time::Duration;

use reqwest::StatusCode;

/// High-level classification of a failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or read timed out.
    Timeout,
    /// Server asked us to slow down (429).
    Throttled,
    /// Network-level failure (connection refused/reset, DNS, truncated body).
    Connection,
    /// Server-side HTTP failure.
    Http5xx(u16),
    /// Anything else; never retried.
    Other,
}

impl ErrorKind {
    /// Whether this kind is worth another attempt.
    pub fn is_transient(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop and surface the error.
    NoRetry,
    /// Try again after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with a cap and proportional jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Spread applied to each delay, as a fraction of it (0.0 disables jitter).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Decide what to do after `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts || !kind.is_transient() {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.jitter(self.backoff(attempt)))
    }

    /// Un-jittered delay after `attempt`: `base * 2^(attempt-1)`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }

    fn jitter(&self, delay: Duration) -> Duration {
        if self.jitter_factor <= 0.0 || delay.is_zero() {
            return delay;
        }
        let spread = self.jitter_factor * (rand::random::<f64>() - 0.5);
        delay.mul_f64((1.0 + spread).max(0.0)).min(self.max_delay)
    }
}

/// Classify an HTTP status code for retry decisions.
pub fn classify_status(status: StatusCode) -> ErrorKind {
    match status.as_u16() {
        429 => ErrorKind::Throttled,
        code @ 500..=599 => ErrorKind::Http5xx(code),
        _ => ErrorKind::Other,
    }
}

/// Classify a transport error for retry decisions.
pub fn classify_reqwest(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() || err.is_body() || err.is_request() {
        ErrorKind::Connection
    } else if let Some(status) = err.status() {
        classify_status(status)
    } else {
        ErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady() -> RetryPolicy {
        RetryPolicy {
            jitter_factor: 0.0,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn no_retry_for_other() {
        let p = steady();
        assert_eq!(p.decide(1, ErrorKind::Other), RetryDecision::NoRetry);
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let p = RetryPolicy {
            max_attempts: 20,
            ..steady()
        };
        assert_eq!(
            p.decide(1, ErrorKind::Timeout),
            RetryDecision::RetryAfter(Duration::from_millis(500))
        );
        assert_eq!(
            p.decide(2, ErrorKind::Http5xx(503)),
            RetryDecision::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(
            p.decide(3, ErrorKind::Connection),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(p.backoff(19), p.max_delay);
    }

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy {
            max_attempts: 3,
            ..steady()
        };
        assert!(matches!(
            p.decide(1, ErrorKind::Throttled),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(2, ErrorKind::Throttled),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, ErrorKind::Throttled), RetryDecision::NoRetry);
        assert_eq!(
            RetryPolicy::none().decide(1, ErrorKind::Timeout),
            RetryDecision::NoRetry
        );
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let p = RetryPolicy {
            max_attempts: 10,
            jitter_factor: 0.5,
            ..RetryPolicy::default()
        };
        for _ in 0..100 {
            let RetryDecision::RetryAfter(d) = p.decide(2, ErrorKind::Timeout) else {
                panic!("expected retry");
            };
            assert!(d >= Duration::from_millis(750), "{d:?}");
            assert!(d <= Duration::from_millis(1250), "{d:?}");
        }
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            ErrorKind::Throttled
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            ErrorKind::Http5xx(502)
        );
        assert_eq!(classify_status(StatusCode::NOT_FOUND), ErrorKind::Other);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), ErrorKind::Other);
    }
}
