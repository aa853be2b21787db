//! Polling loop for long-running Genie messages, plus the shared retry
//! helper used around individual API calls.
//!
//! The loop sleeps before each status check, so a status is never fetched
//! twice without at least one interval between fetches, and the deadline is
//! enforced before the next fetch rather than after it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{GenieError, Result};

/// Base backoff for transient failures, doubled per attempt.
const TRANSIENT_RETRY_BASE: Duration = Duration::from_millis(500);
/// Base backoff when the remote API itself reports rate limiting. Matches
/// the per-slot pace of a 5-per-60s window.
const RATE_LIMITED_RETRY_BASE: Duration = Duration::from_secs(12);

/// Validated timing parameters for one polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollSettings {
    pub fn new(timeout_seconds: u64, interval_seconds: u64) -> Result<Self> {
        if timeout_seconds == 0 {
            return Err(GenieError::Validation(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }
        if interval_seconds == 0 {
            return Err(GenieError::Validation(
                "poll_interval_seconds must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            timeout: Duration::from_secs(timeout_seconds),
            interval: Duration::from_secs(interval_seconds),
        })
    }
}

/// What one status check observed.
#[derive(Debug)]
pub enum PollOutcome<T> {
    /// The message reached a terminal state.
    Complete(T),
    /// Still in flight; keep waiting.
    Pending,
}

/// Repeatedly invoke `poll` until it reports completion or the deadline
/// passes. Each iteration sleeps first, then gives up if the deadline has
/// passed, then checks. Errors from `poll` abort the loop unchanged.
pub async fn poll_until<T, F, Fut>(settings: &PollSettings, mut poll: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollOutcome<T>>>,
{
    let started = Instant::now();
    let mut checks: u32 = 0;
    loop {
        tokio::time::sleep(settings.interval).await;
        if started.elapsed() >= settings.timeout {
            debug!(
                target: "poller",
                checks,
                timeout_seconds = settings.timeout.as_secs(),
                "gave up waiting for a terminal status"
            );
            return Err(GenieError::Timeout {
                seconds: settings.timeout.as_secs(),
            });
        }
        checks += 1;
        match poll().await? {
            PollOutcome::Complete(value) => {
                debug!(target: "poller", checks, "reached a terminal status");
                return Ok(value);
            }
            PollOutcome::Pending => {}
        }
    }
}

/// Run `op`, retrying transient and rate-limited failures with exponential
/// backoff. Non-transient errors pass through on the first occurrence.
pub async fn with_retries<T, F, Fut>(max_retries: u32, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_retries => {
                let base = match err {
                    GenieError::RateLimited(_) => RATE_LIMITED_RETRY_BASE,
                    _ => TRANSIENT_RETRY_BASE,
                };
                let backoff = base.saturating_mul(2u32.saturating_pow(attempt));
                attempt += 1;
                warn!(
                    target: "poller",
                    what,
                    attempt,
                    max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "retrying after transient failure"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(err) => return Err(err),
        }
    }
}
