//! Explicit bounded retry for fallible operations.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 200;

// max_retries counts total attempts: a budget of 3 runs the operation at most
// three times and returns the third failure unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }

    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    // A zero budget still attempts once.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    pub fn run<T, E: Display>(
        &self,
        operation: &'static str,
        mut f: impl FnMut() -> Result<T, E>,
    ) -> Result<T, E> {
        let max_attempts = self.max_attempts();
        let mut attempt: u32 = 1;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(
                        component = "retry",
                        event = "retry.attempt_failed",
                        operation,
                        attempt,
                        max_attempts,
                        error = %err
                    );
                    if attempt >= max_attempts {
                        return Err(err);
                    }
                    attempt += 1;
                    thread::sleep(Duration::from_millis(self.backoff_ms));
                }
            }
        }
    }
}
