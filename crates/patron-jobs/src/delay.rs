//! Delay primitives shared by every retrying job.

use std::sync::Arc;
use std::time::Duration;

use crate::random::Randomizer;

/// Schedules wake-ups on the task runner.
#[derive(Clone)]
pub struct DelayGenerator {
    randomizer: Arc<dyn Randomizer>,
}

impl DelayGenerator {
    pub fn new(randomizer: Arc<dyn Randomizer>) -> Self {
        Self { randomizer }
    }

    /// Wake up after exactly `delay`.
    pub async fn delay(&self, delay: Duration) {
        tracing::debug!(secs = delay.as_secs_f64(), "delay set");
        tokio::time::sleep(delay).await;
    }

    /// Wake up after a jittered delay with mean `delay`.
    pub async fn random_delay(&self, delay: Duration) {
        let secs = self.randomizer.geometric(delay.as_secs_f64());
        self.delay(Duration::from_secs(secs)).await;
    }
}

/// Exponential backoff between retries of one external call.
///
/// Each retryable call site owns its own instance and resets it on success.
#[derive(Clone, Debug)]
pub struct BackoffDelay {
    min: Duration,
    max: Duration,
    backoff_count: u32,
}

impl BackoffDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            backoff_count: 0,
        }
    }

    /// The next delay: `min * 2^n`, capped at `max`.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 1u32 << self.backoff_count.min(24);
        self.backoff_count += 1;
        std::cmp::min(self.min * factor, self.max)
    }

    pub fn reset(&mut self) {
        self.backoff_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandomizer;

    #[test]
    fn test_backoff_sequence_doubles_to_cap() {
        let mut backoff =
            BackoffDelay::new(Duration::from_secs(15), Duration::from_secs(30 * 60));

        assert_eq!(backoff.next_delay(), Duration::from_secs(15));
        assert_eq!(backoff.next_delay(), Duration::from_secs(30));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));
        assert_eq!(backoff.next_delay(), Duration::from_secs(120));

        let mut last = Duration::ZERO;
        for _ in 0..40 {
            let next = backoff.next_delay();
            assert!(next >= last, "backoff must be non-decreasing");
            assert!(next <= Duration::from_secs(30 * 60));
            last = next;
        }
        assert_eq!(last, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_backoff_reset_restarts_sequence() {
        let mut backoff =
            BackoffDelay::new(Duration::from_secs(15), Duration::from_secs(30 * 60));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(15));
    }

    #[test]
    fn test_backoff_shift_does_not_overflow() {
        let mut backoff = BackoffDelay::new(Duration::from_secs(1), Duration::from_secs(5));
        for _ in 0..100 {
            backoff.next_delay();
        }
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_elapses() {
        let delays = DelayGenerator::new(Arc::new(SeededRandomizer::new(1)));
        let start = tokio::time::Instant::now();
        delays.delay(Duration::from_secs(45)).await;
        assert_eq!(start.elapsed(), Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_delay_uses_whole_seconds() {
        let delays = DelayGenerator::new(Arc::new(SeededRandomizer::new(1)));
        let start = tokio::time::Instant::now();
        delays.random_delay(Duration::from_secs(10)).await;
        let elapsed = start.elapsed();
        assert_eq!(elapsed.subsec_nanos(), 0);
    }
}
