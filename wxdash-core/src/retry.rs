//! Bounded retry with exponential backoff for the archive path.
//!
//! Retries transient failures only: connect errors, timeouts, 5xx, 408 and
//! 429. Client errors (4xx) fail immediately. The geocoding and
//! current-conditions clients do not retry at all.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};

/// Attempts and backoff used by the historical pipeline.
pub const DEFAULT_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_FACTOR_MS: u64 = 200;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Base delay; doubles between consecutive retries.
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff_factor: Duration::from_millis(DEFAULT_BACKOFF_FACTOR_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff_factor: Duration) -> Self {
        Self { attempts, backoff_factor }
    }

    /// Delay before attempt `attempt` (1-based). The first attempt has no
    /// delay; retry n waits factor * 2^(n-1).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 2);
        self.backoff_factor.saturating_mul(factor)
    }
}

/// Whether a failed send is worth another attempt.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Whether a status code signals a transient server-side problem.
pub fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

/// Run `operation` until it yields a non-transient outcome or the policy is
/// exhausted. The final transient response or error is returned as-is so
/// the caller can surface the status.
pub async fn with_retry<F, Fut>(policy: RetryPolicy, operation: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut last_error = None;

    // At least one attempt always runs, whatever the policy says.
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            tracing::debug!(attempt, ?delay, "backing off before retry");
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(response) => {
                let status = response.status();
                if is_transient_status(status) && attempt < attempts {
                    tracing::warn!(%status, attempt, "transient status, retrying");
                    continue;
                }
                return Ok(response);
            }
            Err(e) => {
                if !is_transient_error(&e) {
                    return Err(e);
                }
                tracing::warn!(attempt, error = %e, "transient send failure");
                last_error = Some(e);
            }
        }
    }

    // Only reachable when every attempt errored at the transport level.
    Err(last_error.unwrap_or_else(|| unreachable!("retry loop ran at least once")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_archive_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.backoff_factor, Duration::from_millis(200));
    }

    #[test]
    fn backoff_schedule_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_millis(200));
        assert_eq!(policy.delay_before(3), Duration::from_millis(400));
        assert_eq!(policy.delay_before(4), Duration::from_millis(800));
        assert_eq!(policy.delay_before(5), Duration::from_millis(1600));
    }

    #[test]
    fn transient_status_classification() {
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::REQUEST_TIMEOUT));

        assert!(!is_transient_status(StatusCode::OK));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
        assert!(!is_transient_status(StatusCode::UNAUTHORIZED));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
    }
}
