//! Bounded retry with exponential backoff and full jitter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use rand::Rng;

use super::ModelError;
use crate::config::RetryConfig;

/// Longest uninterrupted stretch of an interruptible backoff wait.
const SLEEP_SLICE: Duration = Duration::from_millis(250);

/// How often and how long to wait between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` of zero is treated as one.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Single attempt, never retry.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Build from the `[retry]` settings section.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound of the wait before retry number `retry` (1-based).
    pub fn backoff_cap(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Wait before retry number `retry`, uniform in `[0, backoff_cap]`.
    pub fn jittered_delay<R: Rng>(&self, retry: u32, rng: &mut R) -> Duration {
        let cap = self.backoff_cap(retry).as_millis() as u64;
        Duration::from_millis(rng.gen_range(0..=cap))
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T, F>(&self, op: F) -> Result<T, ModelError>
    where
        F: FnMut(u32) -> Result<T, ModelError>,
    {
        self.run_with_sleep(op, thread::sleep)
    }

    /// Like [`run`](Self::run), but gives up once `interrupted` is set.
    ///
    /// Backoff waits are sliced so an interrupt is noticed within a fraction
    /// of a second; the last error is returned as-is.
    pub fn run_interruptible<T, F>(&self, op: F, interrupted: &AtomicBool) -> Result<T, ModelError>
    where
        F: FnMut(u32) -> Result<T, ModelError>,
    {
        self.retry_loop(
            op,
            |delay| sleep_sliced(delay, interrupted),
            || interrupted.load(Ordering::SeqCst),
        )
    }

    /// Same as [`run`](Self::run) with an injectable sleep.
    pub fn run_with_sleep<T, F, S>(&self, op: F, sleep: S) -> Result<T, ModelError>
    where
        F: FnMut(u32) -> Result<T, ModelError>,
        S: FnMut(Duration),
    {
        self.retry_loop(op, sleep, || false)
    }

    fn retry_loop<T, F, S, C>(&self, mut op: F, mut sleep: S, stopped: C) -> Result<T, ModelError>
    where
        F: FnMut(u32) -> Result<T, ModelError>,
        S: FnMut(Duration),
        C: Fn() -> bool,
    {
        let mut rng = rand::thread_rng();
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts && !stopped() => {
                    let delay = self.jittered_delay(attempt, &mut rng);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "model request failed, retrying"
                    );
                    sleep(delay);
                    if stopped() {
                        tracing::debug!(attempt, "retry abandoned after interrupt");
                        return Err(e);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Sleep for `total`, returning early once `interrupted` is set.
fn sleep_sliced(total: Duration, interrupted: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() && !interrupted.load(Ordering::SeqCst) {
        let slice = remaining.min(SLEEP_SLICE);
        thread::sleep(slice);
        remaining -= slice;
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
