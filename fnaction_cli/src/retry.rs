// SPDX-License-Identifier: MIT

use std::time::Duration;

/// Bounded-attempt policy with capped exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Must be >= 1.
    pub tries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(tries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            tries,
            base_delay,
            max_delay,
        }
    }

    /// Delay to sleep after the given failed attempt (1-based).
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay * 2_u32.saturating_pow(attempt.saturating_sub(1));
        std::cmp::min(exponential, self.max_delay)
    }
}

/// Runs `operation` up to `policy.tries` times, sleeping between attempts,
/// retrying only errors accepted by `should_retry`. After the attempts are
/// spent the last error is returned unwrapped, so callers always see the
/// original failure rather than a retry wrapper.
pub async fn retry<T, E, P, F, Fut>(policy: RetryPolicy, should_retry: P, mut operation: F) -> Result<T, E>
where
    P: Fn(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0_u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.tries && should_retry(&err) => {
                let delay = policy.delay_after_attempt(attempt);
                log::warn!("Attempt {}/{} failed ({}), retrying in {:.1} s", attempt, policy.tries, err, delay.as_secs_f64());
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
