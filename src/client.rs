//! Resilient HTTP session
//!
//! The transport seam plus the retry loop wrapped around it. A transport
//! performs exactly one HTTP attempt; the session decides whether that
//! attempt is terminal or transient and schedules the backoff. Terminal
//! responses pass through untouched, so classifying a 4xx/5xx into an
//! error stays the submitter's job.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TransferConfig;
use crate::error::TransferError;

/// Response statuses that mark an attempt as transient.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// One HTTP request as the transport layer sees it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// One HTTP response as the transport layer sees it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP layer: the attempt produced no response at all.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{kind}: {message}")]
    Other { kind: String, message: String },
}

impl TransportError {
    /// Timeouts and connection failures are worth another attempt; anything
    /// else (bad URL, body read failure) will not improve by retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Timeout | TransportError::Connect(_))
    }
}

/// Retry behavior derived from [`TransferConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed on top of the initial attempt.
    pub max_retries: u32,
    /// Multiplier for the binary exponential delay schedule.
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &TransferConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor,
        }
    }

    /// Whether a response status marks the attempt as transient.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }

    /// Retries are restricted to POST. The transfer API tolerates duplicate
    /// submissions, which is what makes resending a POST safe here.
    pub fn applies_to(&self, method: &str) -> bool {
        method.eq_ignore_ascii_case("POST")
    }

    /// Delay before retry `n` (1-based): `backoff_factor * 2^(n-1)`.
    ///
    /// With a factor of 1.0 the schedule is 1s, 2s, 4s, 8s.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(63) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        // A non-finite or overflowing product would panic in from_secs_f64
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::from_secs(u64::MAX))
    }
}

/// Transport seam: executes a single HTTP attempt.
///
/// Implementations must not retry internally; the session owns the budget.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Short transport name for logs.
    fn name(&self) -> &'static str;

    /// Perform one attempt of `request`.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by a pooled reqwest client.
///
/// The per-attempt timeout is baked into the client, so every attempt the
/// session makes gets the full window.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransferError::Unexpected {
                kind: "client_build".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    fn name(&self) -> &'static str {
        "reqwest"
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let method: reqwest::Method =
            request
                .method
                .parse()
                .map_err(|_| TransportError::Other {
                    kind: "invalid_method".to_string(),
                    message: request.method.clone(),
                })?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(HttpResponse { status, body })
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        let kind = if e.is_builder() {
            "builder"
        } else if e.is_decode() {
            "decode"
        } else if e.is_request() {
            "request"
        } else {
            "transport"
        };
        TransportError::Other {
            kind: kind.to_string(),
            message: e.to_string(),
        }
    }
}

/// Scripted transport for tests.
///
/// Outcomes queued with [`enqueue`](MockTransport::enqueue) are served FIFO;
/// once the queue is empty the fallback set by
/// [`set_fallback`](MockTransport::set_fallback) is served indefinitely.
/// Every attempt is recorded, so tests can assert on call counts and on the
/// exact requests that went out.
pub struct MockTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    fallback: Mutex<Option<Result<HttpResponse, TransportError>>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue one outcome, served in FIFO order.
    pub fn enqueue(&self, outcome: Result<HttpResponse, TransportError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// Outcome served for every attempt once the queue is empty.
    pub fn set_fallback(&self, outcome: Result<HttpResponse, TransportError>) {
        *self.fallback.lock().unwrap() = Some(outcome);
    }

    /// Number of attempts performed so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Snapshot of every request attempted, in order.
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(outcome) = self.script.lock().unwrap().pop_front() {
            return outcome;
        }
        if let Some(outcome) = self.fallback.lock().unwrap().clone() {
            return outcome;
        }
        Err(TransportError::Other {
            kind: "mock".to_string(),
            message: format!("no scripted outcome for {} {}", request.method, request.url),
        })
    }
}

/// One transport bound to one retry policy.
///
/// Sessions are cheap to clone and share the underlying transport. Dropping
/// the last clone releases the transport and its pooled connections, on
/// success and failure paths alike.
#[derive(Clone)]
pub struct TransferSession {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl TransferSession {
    /// Production session: reqwest transport plus the policy derived from
    /// `config`.
    pub fn new(config: &TransferConfig) -> Result<Self, TransferError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(
            Arc::new(transport),
            RetryPolicy::from_config(config),
        ))
    }

    /// Session over a caller-supplied transport. This is the entry point
    /// tests use to script outcomes.
    pub fn with_transport(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `request`, retrying transient outcomes until the budget is spent.
    ///
    /// Returns the terminal response whatever its status. An `Err` means the
    /// transport itself failed on the final attempt; the failure is returned
    /// unclassified so the caller can render it with its own context.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let retry_allowed = self.policy.applies_to(&request.method);
        let mut retries_done: u32 = 0;

        loop {
            let attempt = retries_done + 1;
            debug!(
                transport = self.transport.name(),
                method = %request.method,
                url = %request.url,
                attempt,
                "Sending request"
            );

            match self.transport.send(&request).await {
                Ok(response) => {
                    if !(retry_allowed && self.policy.is_retryable_status(response.status)) {
                        return Ok(response);
                    }
                    if retries_done >= self.policy.max_retries {
                        debug!(
                            status = response.status,
                            attempts = attempt,
                            "Retry budget spent, returning last response"
                        );
                        return Ok(response);
                    }
                    warn!(
                        status = response.status,
                        attempt,
                        max_retries = self.policy.max_retries,
                        "Transient status, will retry"
                    );
                }
                Err(failure) => {
                    if !(retry_allowed && failure.is_transient())
                        || retries_done >= self.policy.max_retries
                    {
                        return Err(failure);
                    }
                    warn!(
                        error = %failure,
                        attempt,
                        max_retries = self.policy.max_retries,
                        "Transport failure, will retry"
                    );
                }
            }

            retries_done += 1;
            let delay = self.policy.delay_before_retry(retries_done);
            if !delay.is_zero() {
                debug!(delay_ms = delay.as_millis() as u64, "Backing off");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Map a transport failure that survived the retry budget onto the public
/// error taxonomy. `url` and `timeout_secs` supply the context the rendered
/// messages need.
pub(crate) fn classify_transport_failure(
    failure: TransportError,
    url: &str,
    timeout_secs: u64,
) -> TransferError {
    match failure {
        TransportError::Timeout => TransferError::Timeout(timeout_secs),
        TransportError::Connect(detail) => {
            TransferError::ConnectionFailed(format!("{url}: {detail}"))
        }
        TransportError::Other { kind, message } => TransferError::Unexpected { kind, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(url: &str) -> HttpRequest {
        HttpRequest {
            method: "POST".to_string(),
            url: url.to_string(),
            headers: vec![],
            body: String::new(),
        }
    }

    fn ok(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    fn policy(max_retries: u32, backoff_factor: f64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_factor,
        }
    }

    #[test]
    fn test_delay_schedule_is_binary_exponential() {
        let policy = policy(4, 1.0);
        let delays: Vec<Duration> = (1..=4).map(|n| policy.delay_before_retry(n)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
    }

    #[test]
    fn test_delay_scales_with_factor() {
        let policy = policy(3, 0.3);
        assert_eq!(policy.delay_before_retry(1), Duration::from_secs_f64(0.3));
        assert_eq!(policy.delay_before_retry(2), Duration::from_secs_f64(0.6));
        assert_eq!(policy.delay_before_retry(3), Duration::from_secs_f64(1.2));
    }

    #[test]
    fn test_retryable_statuses() {
        let policy = policy(3, 1.0);
        for status in [429, 500, 502, 503, 504] {
            assert!(policy.is_retryable_status(status), "{status} must retry");
        }
        for status in [200, 201, 400, 401, 403, 404, 501] {
            assert!(!policy.is_retryable_status(status), "{status} is terminal");
        }
    }

    #[test]
    fn test_retries_restricted_to_post() {
        let policy = policy(3, 1.0);
        assert!(policy.applies_to("POST"));
        assert!(policy.applies_to("post"));
        assert!(!policy.applies_to("GET"));
        assert!(!policy.applies_to("PUT"));
    }

    #[test]
    fn test_session_exposes_policy_from_config() {
        let config = TransferConfig {
            api_base_url: "http://t".to_string(),
            timeout_secs: 10,
            max_retries: 7,
            backoff_factor: 0.5,
        };
        let session = TransferSession::with_transport(
            Arc::new(MockTransport::new()),
            RetryPolicy::from_config(&config),
        );
        assert_eq!(session.policy().max_retries, 7);
        assert_eq!(session.policy().backoff_factor, 0.5);
    }

    #[test]
    fn test_transport_failure_transience() {
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::Connect("refused".into()).is_transient());
        assert!(
            !TransportError::Other {
                kind: "builder".into(),
                message: "bad url".into()
            }
            .is_transient()
        );
    }

    #[tokio::test]
    async fn test_mock_serves_script_then_fallback() {
        let mock = MockTransport::new();
        mock.enqueue(ok(503, "busy"));
        mock.set_fallback(ok(200, "{}"));

        let first = mock.send(&post("http://t/x")).await.unwrap();
        assert_eq!(first.status, 503);
        let second = mock.send(&post("http://t/x")).await.unwrap();
        assert_eq!(second.status, 200);
        let third = mock.send(&post("http://t/x")).await.unwrap();
        assert_eq!(third.status, 200);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_without_script_errors() {
        let mock = MockTransport::new();
        let err = mock.send(&post("http://t/x")).await.unwrap_err();
        assert!(matches!(err, TransportError::Other { .. }));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_terminal_response_passes_through_untouched() {
        let mock = Arc::new(MockTransport::new());
        mock.enqueue(ok(404, "account not found"));
        let session = TransferSession::with_transport(mock.clone(), policy(3, 0.0));

        let response = session.send(post("http://t/transfer")).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, "account not found");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_status_retried_until_budget_spent() {
        let mock = Arc::new(MockTransport::new());
        mock.set_fallback(ok(503, "busy"));
        let session = TransferSession::with_transport(mock.clone(), policy(3, 0.0));

        let response = session.send(post("http://t/transfer")).await.unwrap();
        // Last response comes back instead of an error
        assert_eq!(response.status, 503);
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test]
    async fn test_recovery_mid_budget() {
        let mock = Arc::new(MockTransport::new());
        mock.enqueue(ok(503, "busy"));
        mock.enqueue(ok(500, "oops"));
        mock.enqueue(ok(200, r#"{"transactionId":"TXN9"}"#));
        let session = TransferSession::with_transport(mock.clone(), policy(5, 0.0));

        let response = session.send(post("http://t/transfer")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_zero_budget_returns_first_response() {
        let mock = Arc::new(MockTransport::new());
        mock.set_fallback(ok(503, "busy"));
        let session = TransferSession::with_transport(mock.clone(), policy(0, 0.0));

        let response = session.send(post("http://t/transfer")).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_post_never_retried() {
        let mock = Arc::new(MockTransport::new());
        mock.set_fallback(ok(503, "busy"));
        let session = TransferSession::with_transport(mock.clone(), policy(3, 0.0));

        let mut request = post("http://t/status");
        request.method = "GET".to_string();
        let response = session.send(request).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_transport_failure_retried() {
        let mock = Arc::new(MockTransport::new());
        mock.enqueue(Err(TransportError::Timeout));
        mock.enqueue(Err(TransportError::Connect("refused".into())));
        mock.enqueue(ok(200, "{}"));
        let session = TransferSession::with_transport(mock.clone(), policy(3, 0.0));

        let response = session.send(post("http://t/transfer")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_transport_failure_returned_last() {
        let mock = Arc::new(MockTransport::new());
        mock.set_fallback(Err(TransportError::Timeout));
        let session = TransferSession::with_transport(mock.clone(), policy(2, 0.0));

        let err = session.send(post("http://t/transfer")).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_transport_failure_is_terminal() {
        let mock = Arc::new(MockTransport::new());
        mock.set_fallback(Err(TransportError::Other {
            kind: "builder".into(),
            message: "invalid URL".into(),
        }));
        let session = TransferSession::with_transport(mock.clone(), policy(3, 0.0));

        let err = session.send(post("http://t/transfer")).await.unwrap_err();
        assert!(matches!(err, TransportError::Other { .. }));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_classification_carries_context() {
        let err = classify_transport_failure(TransportError::Timeout, "http://t/transfer", 30);
        assert_eq!(err.to_string(), "Request timed out after 30s");

        let err = classify_transport_failure(
            TransportError::Connect("refused".into()),
            "http://t/transfer",
            30,
        );
        assert_eq!(
            err.to_string(),
            "Connection error - unable to reach API at http://t/transfer: refused"
        );

        let err = classify_transport_failure(
            TransportError::Other {
                kind: "decode".into(),
                message: "bad gzip".into(),
            },
            "http://t/transfer",
            30,
        );
        assert_eq!(err.code(), "UNEXPECTED");
    }
}
