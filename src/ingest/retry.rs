// src/ingest/retry.rs
use std::time::Duration;

use super::types::SourceError;

/// Retry HTTP 429 and any 5xx.
pub fn default_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Exponential backoff shared by every outbound provider call.
/// Delay before attempt `n + 1` is `base_delay * 2^(n - 1)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub is_retryable: fn(u16) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            is_retryable: default_retryable_status,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            is_retryable: default_retryable_status,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn should_retry(&self, err: &SourceError) -> bool {
        match err {
            SourceError::Status(code) => (self.is_retryable)(*code),
            SourceError::Transport(_) | SourceError::Timeout => true,
            SourceError::Payload(_) => false,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << shift)
    }

    /// `attempt` is the 1-based number of the attempt that just failed.
    pub fn next_delay(&self, attempt: u32, err: &SourceError) -> Option<Duration> {
        if attempt < self.max_attempts && self.should_retry(err) {
            Some(self.delay_for(attempt))
        } else {
            None
        }
    }
}
