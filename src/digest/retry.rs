use crate::digest::client::{Completion, CompletionRequest, CompletionResult};
use crate::error::SummarizationError;
use std::thread;
use std::time::Duration;

/// Every wait in the pipeline goes through this so tests can record instead of sleep.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// `2^attempt * base`, attempts counted from 1: 10s, 20s, 40s with the default base.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

/// Retries rate-limited calls with exponential backoff; every other outcome
/// is returned on the first attempt.
pub struct RetryingClient<'a> {
    inner: &'a dyn Completion,
    sleeper: &'a dyn Sleeper,
    policy: RetryPolicy,
}

impl<'a> RetryingClient<'a> {
    pub fn new(inner: &'a dyn Completion, sleeper: &'a dyn Sleeper, policy: RetryPolicy) -> Self {
        Self {
            inner,
            sleeper,
            policy,
        }
    }
}

impl Completion for RetryingClient<'_> {
    fn complete(&self, request: &CompletionRequest) -> CompletionResult {
        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.inner.complete(request) {
                Err(err) if err.is_rate_limited() => {
                    if attempt == max_attempts {
                        break;
                    }
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_secs = delay.as_secs_f64(),
                        "rate limited by completion endpoint; backing off"
                    );
                    self.sleeper.sleep(delay);
                }
                other => return other,
            }
        }
        Err(SummarizationError::RateLimitExceeded {
            attempts: max_attempts,
        })
    }
}
