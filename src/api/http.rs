use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Default retry schedule: 3 retries with exponential backoff from 1s, plus jitter.
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_RETRIES: usize = 3;
const RETRY_JITTER_DIVISOR: u128 = 4; // + up to 25% jitter

/// How often and how patiently transient failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    fn base_delay_for(&self, attempt: usize) -> Duration {
        let multiplier = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier)
    }
}

/// Statuses worth sending again. A Retro object server answers 500 when an
/// object cannot be retrieved, unknown hashes included, so 500 is final.
pub(super) fn is_retriable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 502 | 503 | 504)
}

pub(super) fn is_retriable_send_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body()
}

fn add_jitter(delay: Duration) -> Duration {
    let max_jitter_ms = delay.as_millis() / RETRY_JITTER_DIVISOR;
    if max_jitter_ms == 0 {
        return delay;
    }

    let max_jitter_ms = std::cmp::min(max_jitter_ms, u128::from(u64::MAX)) as u64;
    let jitter_ms = rand::thread_rng().gen_range(0..=max_jitter_ms);
    delay + Duration::from_millis(jitter_ms)
}

/// Send a request, retrying transient failures according to `policy`.
///
/// A non-success response that is not worth retrying (or that exhausted the
/// retries) is returned as `Ok` so the caller can report its status and body.
pub(super) async fn send_with_retry(
    policy: RetryPolicy,
    mut make_request: impl FnMut() -> reqwest::RequestBuilder,
) -> Result<reqwest::Response, reqwest::Error> {
    let max_attempts = policy.max_retries + 1;
    let mut attempt = 0;

    loop {
        let can_retry = attempt < policy.max_retries;

        match make_request().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || !(is_retriable_status(status.as_u16()) && can_retry) {
                    return Ok(response);
                }

                let base_delay = policy.base_delay_for(attempt);
                let delay = add_jitter(base_delay);
                debug!(
                    "HTTP request failed with status {}; retrying in {:?} (base {:?}, attempt {}/{})",
                    status,
                    delay,
                    base_delay,
                    attempt + 1,
                    max_attempts
                );
                let _ = response.bytes().await;
                sleep(delay).await;
            }
            Err(err) => {
                if !(is_retriable_send_error(&err) && can_retry) {
                    debug!("HTTP request failed after {} attempt(s)", attempt + 1);
                    return Err(err);
                }

                let base_delay = policy.base_delay_for(attempt);
                let delay = add_jitter(base_delay);
                debug!(
                    "HTTP request error: {}; retrying in {:?} (base {:?}, attempt {}/{})",
                    err,
                    delay,
                    base_delay,
                    attempt + 1,
                    max_attempts
                );
                sleep(delay).await;
            }
        }

        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.base_delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.base_delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_jitter_bounds() {
        let base = Duration::from_secs(4);
        for _ in 0..32 {
            let delay = add_jitter(base);
            assert!(delay >= base);
            assert!(delay <= base + Duration::from_secs(1));
        }
        assert_eq!(add_jitter(Duration::ZERO), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retries_transient_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ref/"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ref/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        };
        let client = reqwest::Client::new();
        let url = format!("{}/ref/", server.uri());
        let response = send_with_retry(policy, || client.get(&url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gives_up_after_policy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ref/"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/ref/", server.uri());
        let response = send_with_retry(RetryPolicy::none(), || client.get(&url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_internal_server_error_is_final() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/obj/sha256:gone"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/obj/sha256:gone", server.uri());
        let started = std::time::Instant::now();
        let response = send_with_retry(RetryPolicy::default(), || client.get(&url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_retriable_statuses() {
        for status in [408, 429, 502, 503, 504] {
            assert!(is_retriable_status(status), "{} should be retried", status);
        }
        for status in [400, 404, 500, 501] {
            assert!(!is_retriable_status(status), "{} should not be retried", status);
        }
    }
}
