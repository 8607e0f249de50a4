// Request pacing for hosted model calls.
//
// Azure OpenAI deployments enforce requests-per-minute quotas. Every client
// reserves the next free slot before sending; slots are spaced one interval
// apart, so concurrent labelling or QA calls are spread out instead of
// hitting 429s. The lock is only held while reserving, not while waiting.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Default request quota for Azure OpenAI clients.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 300;

/// Hands out request slots at a fixed spacing. Clones share one schedule.
#[derive(Clone)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn per_minute(requests: u32) -> Self {
        Self {
            interval: Duration::from_secs(60) / requests.max(1),
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reserve the next slot and wait for it.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.interval);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_minute(DEFAULT_REQUESTS_PER_MINUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_quota() {
        assert_eq!(RateLimiter::per_minute(120).interval(), Duration::from_millis(500));
        assert_eq!(RateLimiter::per_minute(0).interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_first_slot_is_immediate() {
        let limiter = RateLimiter::per_minute(60);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_slots_are_spaced_across_clones() {
        let limiter = RateLimiter::per_minute(240);
        let other = limiter.clone();
        let start = Instant::now();

        limiter.acquire().await;
        other.acquire().await;
        limiter.acquire().await;

        // Third slot is two 250ms intervals after the first
        assert!(start.elapsed() >= Duration::from_millis(450));
    }
}
