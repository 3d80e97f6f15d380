use std::time::Duration;

use tokio::time::sleep;

/// Exponential backoff: the delay before attempt `n` (zero-indexed) is
/// `base * 2^n`. Shared by HTTP retries and realtime reconnection.
pub struct Backoff {
    base_ms: u64,
    attempts: u32,
}

impl Backoff {
    pub fn new(base_ms: u64) -> Self {
        Self {
            base_ms,
            attempts: 0,
        }
    }

    /// Delay for a given attempt number, without tracking state.
    pub fn delay_for(base_ms: u64, attempt: u32) -> Duration {
        Duration::from_millis(base_ms.saturating_mul(2u64.saturating_pow(attempt)))
    }

    /// Returns the next delay and advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = Self::delay_for(self.base_ms, self.attempts);
        self.attempts += 1;
        delay
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Sleeps for the next delay.
    pub async fn schedule_timeout(&mut self) {
        sleep(self.next_delay()).await;
    }
}
