//! Retry with exponential backoff for embedding requests
//!
//! Each attempt runs under its own deadline. Failures are classified as
//! transient (retried) or fatal (returned at once). When every attempt fails
//! transiently the call ends in [`Error::RetriesExhausted`].

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Deadline or transport failure, 5xx, 429, or a model still warming up
    Transient(String),
    /// Anything retrying cannot fix: other 4xx, malformed bodies
    Fatal(String),
}

impl AttemptError {
    /// Classify a non-success HTTP response
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = format!("status {}: {}", status.as_u16(), snippet(body));
        if status == StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
            || mentions_warmup(body)
        {
            AttemptError::Transient(message)
        } else {
            AttemptError::Fatal(message)
        }
    }

    /// Classify a transport-level failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            AttemptError::Fatal(err.to_string())
        } else {
            AttemptError::Transient(err.to_string())
        }
    }
}

/// Provider messages that mean the model is still loading.
/// Timeouts are not matched here; they come from the transport or the attempt deadline.
fn mentions_warmup(body: &str) -> bool {
    let body = body.to_lowercase();
    ["currently loading", "is loading", "warming up"]
        .iter()
        .any(|phrase| body.contains(phrase))
}

fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let body = body.trim();
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, first one included
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            attempt_timeout: config.attempt_timeout(),
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2x base, 4x base...
    pub fn delay_for(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(16) as u32;
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Run `attempt` until it succeeds, fails fatally, or attempts run out
    pub async fn run<T, F, Fut>(&self, what: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = String::new();

        for n in 1..=attempts {
            if n > 1 {
                let delay = self.delay_for(n - 1);
                warn!(
                    "{} failed ({}); retrying in {:?} (attempt {}/{})",
                    what, last_error, delay, n, attempts
                );
                tokio::time::sleep(delay).await;
            }

            let outcome = match tokio::time::timeout(self.attempt_timeout, attempt()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AttemptError::Transient(format!(
                    "attempt timed out after {:?}",
                    self.attempt_timeout
                ))),
            };

            match outcome {
                Ok(value) => {
                    if n > 1 {
                        debug!("{} succeeded on attempt {}", what, n);
                    }
                    return Ok(value);
                }
                Err(AttemptError::Fatal(message)) => {
                    return Err(Error::Embedding(format!("{}: {}", what, message)));
                }
                Err(AttemptError::Transient(message)) => last_error = message,
            }
        }

        Err(Error::RetriesExhausted {
            attempts,
            last_error,
        })
    }

    /// Send a JSON request under this policy and decode the response body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        what: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        self.run(what, || {
            let request = request.try_clone();
            async move {
                let request = request.ok_or_else(|| {
                    AttemptError::Fatal("request body cannot be cloned".to_string())
                })?;
                let response = request
                    .send()
                    .await
                    .map_err(|e| AttemptError::from_transport(&e))?;
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .map_err(|e| AttemptError::from_transport(&e))?;

                if !status.is_success() {
                    return Err(AttemptError::from_status(status, &body));
                }

                serde_json::from_str::<T>(&body).map_err(|e| {
                    if mentions_warmup(&body) {
                        AttemptError::Transient(snippet(&body))
                    } else {
                        AttemptError::Fatal(format!("malformed response: {}", e))
                    }
                })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_millis(500),
        }
    }

    #[derive(Debug, Deserialize)]
    struct Echo {
        ok: bool,
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_status_classification() {
        let transient = [
            (StatusCode::TOO_MANY_REQUESTS, ""),
            (StatusCode::INTERNAL_SERVER_ERROR, ""),
            (StatusCode::SERVICE_UNAVAILABLE, ""),
            (
                StatusCode::BAD_REQUEST,
                r#"{"error":"Model x is currently loading"}"#,
            ),
        ];
        for (status, body) in transient {
            assert!(
                matches!(AttemptError::from_status(status, body), AttemptError::Transient(_)),
                "{status}"
            );
        }

        for status in [StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED, StatusCode::NOT_FOUND] {
            assert!(matches!(
                AttemptError::from_status(status, "nope"),
                AttemptError::Fatal(_)
            ));
        }
    }

    #[test]
    fn test_timeout_wording_on_4xx_is_fatal() {
        let err = AttemptError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid timeout parameter"}"#,
        );
        assert!(matches!(err, AttemptError::Fatal(_)));
        assert!(matches!(
            AttemptError::from_status(StatusCode::BAD_REQUEST, "model is warming up"),
            AttemptError::Transient(_)
        ));
    }

    #[tokio::test]
    async fn test_send_json_400_timeout_message_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid timeout parameter"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let request = client.post(server.uri()).body("{}");
        let err = fast_policy()
            .send_json::<Echo>("embed", request)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_fatal_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = fast_policy()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AttemptError::Fatal("bad request".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(Error::Embedding(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_exhausts_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = fast_policy()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AttemptError::Transient("busy".to_string())) }
            })
            .await;

        match result {
            Err(Error::RetriesExhausted {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "busy");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_hanging_attempt_hits_deadline() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_millis(20),
        };
        let result: Result<()> = policy
            .run("test", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(Error::RetriesExhausted { attempts: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_send_json_recovers_after_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok": true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let request = client.post(format!("{}/embed", server.uri())).body("{}");
        let echo: Echo = fast_policy().send_json("embed", request).await.unwrap();
        assert!(echo.ok);
    }

    #[tokio::test]
    async fn test_send_json_malformed_body_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let request = client.post(server.uri()).body("{}");
        let err = fast_policy()
            .send_json::<Echo>("embed", request)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_send_json_429_until_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let request = client.post(server.uri()).body("{}");
        let err = fast_policy()
            .send_json::<Echo>("embed", request)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_send_json_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"ok": true}"#)
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_millis(50),
        };
        let client = reqwest::Client::new();
        let request = client.post(server.uri()).body("{}");
        let err = policy.send_json::<Echo>("embed", request).await.unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 2, .. }));
    }
}
