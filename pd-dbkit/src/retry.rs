//! Fixed-delay retries.

use std::fmt::Display;
use std::time::Duration;

use tracing::{error, warn};

use pd_core::config::DemoConfig;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts. Zero is treated as one.
    pub retries: u32,
    /// Pause between attempts. There is no backoff.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn from_config(config: &DemoConfig) -> Self {
        Self::new(config.retries, Duration::from_millis(config.retry_delay_ms))
    }

    /// Number of attempts actually made.
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

/// Call `f` until it succeeds or the policy's attempts run out.
///
/// Every failure is logged together with the retries left. The error of the
/// final attempt is returned.
pub fn retry_on_failure<T, E, F>(policy: &RetryPolicy, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    let mut attempts_left = policy.attempts();
    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempts_left -= 1;
                if attempts_left == 0 {
                    error!("giving up after {} attempts: {e}", policy.attempts());
                    return Err(e);
                }
                warn!(
                    "attempt failed: {e}. Retrying in {:?} ({attempts_left} retries left)",
                    policy.delay
                );
                std::thread::sleep(policy.delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(retries: u32) -> RetryPolicy {
        RetryPolicy::new(retries, Duration::ZERO)
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let mut calls = 0;
        let result: Result<&str, String> = retry_on_failure(&quick(3), || {
            calls += 1;
            if calls < 3 {
                Err(format!("fail {calls}"))
            } else {
                Ok("ok")
            }
        });
        assert_eq!(result, Ok("ok"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_returns_last_error_when_exhausted() {
        let mut calls = 0;
        let result: Result<(), String> = retry_on_failure(&quick(3), || {
            calls += 1;
            Err(format!("fail {calls}"))
        });
        assert_eq!(result, Err("fail 3".to_string()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let mut calls = 0;
        let result: Result<(), &str> = retry_on_failure(&quick(0), || {
            calls += 1;
            Err("boom")
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert_eq!(RetryPolicy::from_config(&DemoConfig::default()), policy);
    }
}
