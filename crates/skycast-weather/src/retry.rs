//! Capped exponential backoff around provider requests.
//!
//! Transient outcomes are retried: timeouts, refused connections, 5xx, 408
//! and 429. A `Retry-After` header on the response replaces the computed
//! backoff, still capped at `max_delay`.

use std::future::Future;
use std::time::Duration;

use reqwest::{header::RETRY_AFTER, Response, StatusCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Extra attempts after the first request
    pub retries: u32,
    /// Wait before the first retry; doubled for each further retry
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3, 100, 5_000)
    }
}

impl RetryConfig {
    pub fn new(retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            retries,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// One request, no retries.
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Wait before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry))
            .min(self.max_delay)
    }
}

fn transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn transient_transport(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.status().is_some_and(transient_status)
}

/// Delay asked for by a `Retry-After: <seconds>` header.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Send with `send` until the outcome is final or retries run out.
///
/// A transient status on the last attempt is handed back as a response so
/// the caller can map it onto a typed error.
pub async fn with_retry<F, Fut>(config: &RetryConfig, send: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut retry = 0;

    loop {
        let outcome = send().await;
        let last = retry >= config.retries;

        let wait = match &outcome {
            Ok(response) if !last && transient_status(response.status()) => {
                let wait = retry_after(response)
                    .map(|d| d.min(config.max_delay))
                    .unwrap_or_else(|| config.backoff(retry));
                tracing::warn!(
                    "Provider answered {}, retrying in {:?} ({}/{})",
                    response.status(),
                    wait,
                    retry + 1,
                    config.retries
                );
                Some(wait)
            }
            Err(e) if !last && transient_transport(e) => {
                let wait = config.backoff(retry);
                tracing::warn!("Request failed: {}, retrying in {:?} ({}/{})", e, wait, retry + 1, config.retries);
                Some(wait)
            }
            _ => None,
        };

        let Some(wait) = wait else {
            if retry > 0 {
                tracing::debug!("Request settled after {} retries", retry);
            }
            return outcome;
        };

        tokio::time::sleep(wait).await;
        retry += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_backoff_doubles_then_caps() {
        let config = RetryConfig::new(5, 250, 1_500);
        let waits: Vec<u128> = (0..5).map(|r| config.backoff(r).as_millis()).collect();
        assert_eq!(waits, [250, 500, 1_000, 1_500, 1_500]);
        assert_eq!(config.backoff(u32::MAX), Duration::from_millis(1_500));
    }

    #[test]
    fn test_none_never_waits() {
        let config = RetryConfig::none();
        assert_eq!(config.retries, 0);
        assert_eq!(config.backoff(3), Duration::ZERO);
    }

    #[test]
    fn test_transient_statuses() {
        for status in [502, 503, 429, 408] {
            assert!(transient_status(StatusCode::from_u16(status).unwrap()), "{}", status);
        }
        for status in [200, 400, 401, 404] {
            assert!(!transient_status(StatusCode::from_u16(status).unwrap()), "{}", status);
        }
    }

    async fn get(server: &MockServer, config: &RetryConfig) -> Response {
        let client = reqwest::Client::new();
        let url = server.uri();
        with_retry(config, || client.get(&url).send()).await.unwrap()
    }

    #[tokio::test]
    async fn test_honors_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        // A 10 s backoff would stall the test; Retry-After: 0 wins.
        let config = RetryConfig::new(1, 10_000, 10_000);
        assert_eq!(get(&server, &config).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gives_up_with_last_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let response = get(&server, &RetryConfig::new(2, 1, 2)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_final_status_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let response = get(&server, &RetryConfig::new(3, 1, 2)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
