use std::collections::VecDeque;

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Snapshot of the limiter window, for status/UI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RateLimitStatus {
    pub max_requests: usize,
    pub window_seconds: u64,
    /// Admissions currently inside the trailing window.
    pub used: usize,
    pub remaining: usize,
    /// Seconds until the next slot frees; 0 when a slot is already free.
    pub reset_after_seconds: u64,
}

/// Sliding-window admission control for outbound Genie queries.
///
/// The remote API allows 5 queries per minute; `acquire` suspends callers
/// until a slot is available inside the trailing window and never denies
/// permanently. Construct one per service and share it via `Arc`; there is
/// no global instance.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    /// Timestamps of granted admissions inside the trailing window.
    admissions: Mutex<VecDeque<Instant>>,
    /// Serializes waiters so wakeups are granted first-come-first-served
    /// instead of racing for a freed slot. Tokio mutexes queue fairly.
    gate: Mutex<()>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            admissions: Mutex::new(VecDeque::new()),
            gate: Mutex::new(()),
        }
    }

    /// Wait until an admission is possible, then record it.
    ///
    /// A caller cancelled while waiting has not recorded an admission: the
    /// append happens only after the final capacity check, under the lock.
    pub async fn acquire(&self) {
        let _turn = self.gate.lock().await;
        loop {
            let wait = {
                let mut admissions = self.admissions.lock().await;
                let now = Instant::now();
                Self::prune(&mut admissions, now, self.window);
                if admissions.len() < self.max_requests {
                    admissions.push_back(now);
                    return;
                }
                match admissions.front() {
                    Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };
            debug!(
                target: "rate_limiter",
                wait_ms = wait.as_millis() as u64,
                "window full, waiting for a slot"
            );
            sleep(wait).await;
        }
    }

    /// Current window occupancy without acquiring.
    pub async fn status(&self) -> RateLimitStatus {
        let mut admissions = self.admissions.lock().await;
        let now = Instant::now();
        Self::prune(&mut admissions, now, self.window);
        let used = admissions.len();
        let reset_after = if used < self.max_requests {
            Duration::ZERO
        } else {
            admissions
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(Duration::ZERO)
        };
        RateLimitStatus {
            max_requests: self.max_requests,
            window_seconds: self.window.as_secs(),
            used,
            remaining: self.max_requests - used,
            reset_after_seconds: reset_after.as_secs_f64().ceil() as u64,
        }
    }

    /// Forget all recorded admissions.
    pub async fn reset(&self) {
        self.admissions.lock().await.clear();
    }

    fn prune(admissions: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = admissions.front() {
            if now.duration_since(*oldest) >= window {
                admissions.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn grants_up_to_capacity_immediately() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        let status = limiter.status().await;
        assert_eq!(status.used, 5);
        assert_eq!(status.remaining, 0);
        assert_eq!(status.reset_after_seconds, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn sixth_admission_waits_for_the_full_window() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        for _ in 0..5 {
            limiter.acquire().await;
        }
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_with_the_oldest_admission() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        // Admissions at t=0,1,2,3,4.
        for _ in 0..5 {
            limiter.acquire().await;
            advance(Duration::from_secs(1)).await;
        }
        // The sixth becomes admissible when the t=0 entry ages out at t=60,
        // not at t=64.
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_served_in_arrival_order() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(10)));
        limiter.acquire().await;

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for label in ["first", "second", "third"] {
            let limiter = Arc::clone(&limiter);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                order.lock().await.push(label);
            }));
            // Let the task reach the gate before spawning the next one.
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().await, vec!["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_waiter_records_no_admission() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(60)));
        limiter.acquire().await;

        let waiter = tokio::spawn({
            let limiter = Arc::clone(&limiter);
            async move { limiter.acquire().await }
        });
        tokio::task::yield_now().await;
        waiter.abort();
        assert!(waiter.await.is_err());

        // Only the original admission is recorded; once it ages out the
        // window is empty again.
        assert_eq!(limiter.status().await.used, 1);
        advance(Duration::from_secs(60)).await;
        assert_eq!(limiter.status().await.used, 0);

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_the_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.reset().await;
        let status = limiter.status().await;
        assert_eq!(status.used, 0);
        assert_eq!(status.remaining, 2);
        assert_eq!(status.reset_after_seconds, 0);
    }
}
