//! Tracking API client.
//!
//! Two layers:
//! - [`TrackingTransport`]: one raw HTTP attempt, reporting *what happened on
//!   the wire* as a [`TransportFailure`].
//! - [`TrackingClient`]: classifies failures into [`TrackError`] and applies
//!   the cold-start [`RetryPolicy`].
//!
//! The controller only ever sees a classified [`TrackError`].

use async_trait::async_trait;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;

use crate::constants::{api as api_const, messages};
use crate::types::{Carrier, CarrierList, TrackingQuery, TrackingResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackErrorKind {
    NotFound,
    InvalidFormat,
    ServerError,
    NetworkUnavailable,
    Timeout,
    Unknown,
}

impl TrackErrorKind {
    /// Failures where no HTTP response was received.
    pub fn is_transport(self) -> bool {
        matches!(self, TrackErrorKind::Timeout | TrackErrorKind::NetworkUnavailable)
    }
}

/// Classified tracking failure carrying a user-facing message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TrackError {
    pub kind: TrackErrorKind,
    pub message: String,
}

impl TrackError {
    pub fn new(kind: TrackErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Raw outcome of a failed attempt, before classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportFailure {
    /// A response arrived with a non-2xx status. `message` is the body's
    /// `message` or `detail` field when present.
    Status { code: u16, message: Option<String> },
    /// No response before the timeout elapsed.
    Timeout,
    /// No response for any other network reason (refused, DNS, reset...).
    Network(String),
    /// Anything else, e.g. an undecodable 2xx body.
    Other(String),
}

/// Map a raw transport outcome to the error the user sees.
pub fn classify(failure: TransportFailure) -> TrackError {
    use TrackErrorKind::*;
    match failure {
        TransportFailure::Status { code: 404, message } => TrackError::new(
            NotFound,
            message.unwrap_or_else(|| messages::NOT_FOUND.to_string()),
        ),
        TransportFailure::Status { code: 400, message } => TrackError::new(
            InvalidFormat,
            message.unwrap_or_else(|| messages::INVALID_FORMAT.to_string()),
        ),
        // 500 bodies are never shown
        TransportFailure::Status { code: 500, .. } => TrackError::new(ServerError, messages::SERVER_ERROR),
        TransportFailure::Status { message, .. } => TrackError::new(
            Unknown,
            message.unwrap_or_else(|| messages::UNEXPECTED_STATUS.to_string()),
        ),
        TransportFailure::Timeout => TrackError::new(Timeout, messages::TIMEOUT),
        TransportFailure::Network(_) => TrackError::new(NetworkUnavailable, messages::NETWORK_UNAVAILABLE),
        TransportFailure::Other(_) => TrackError::new(Unknown, messages::UNEXPECTED),
    }
}

/// Retry configuration for tolerating a cold-starting backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (transport failures only).
    pub max_retries: u32,
    /// Timeout of the first attempt.
    pub base_timeout: Duration,
    /// Timeout of every retried attempt. Must exceed `base_timeout`.
    pub retry_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_timeout: Duration::from_millis(api_const::BASE_TIMEOUT_MS),
            retry_timeout: Duration::from_millis(api_const::RETRY_TIMEOUT_MS),
        }
    }
}

impl RetryPolicy {
    /// Timeout for attempt `n` (0 = first attempt).
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            self.base_timeout
        } else {
            self.retry_timeout
        }
    }
}

/// One HTTP attempt against the tracking backend.
#[async_trait]
pub trait TrackingTransport: Send + Sync {
    async fn fetch_tracking(
        &self,
        query: &TrackingQuery,
        timeout: Duration,
    ) -> Result<TrackingResult, TransportFailure>;

    async fn fetch_carriers(&self, timeout: Duration) -> Result<Vec<Carrier>, TransportFailure>;

    async fn ping(&self, timeout: Duration) -> Result<(), TransportFailure>;
}

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default http client: {e}");
                reqwest::Client::new()
            })
    })
}

/// reqwest-backed transport for the DakDash REST API.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tracking_url(&self, number: &str) -> String {
        format!("{}/api/track/{}", self.base_url, urlencoding::encode(number))
    }

    async fn get(&self, url: &str, query: &[(&str, &str)], timeout: Duration) -> Result<reqwest::Response, TransportFailure> {
        let res = http_client()
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(transport_failure)?;

        if res.status().is_success() {
            return Ok(res);
        }
        let code = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Err(TransportFailure::Status {
            code,
            message: error_message(&body),
        })
    }
}

#[async_trait]
impl TrackingTransport for HttpTransport {
    async fn fetch_tracking(
        &self,
        query: &TrackingQuery,
        timeout: Duration,
    ) -> Result<TrackingResult, TransportFailure> {
        let url = self.tracking_url(&query.number);
        log::debug!("GET {url} carrier={} timeout={}ms", query.carrier, timeout.as_millis());
        let res = self
            .get(&url, &[("carrier", query.carrier.as_str())], timeout)
            .await?;
        res.json::<TrackingResult>().await.map_err(transport_failure)
    }

    async fn fetch_carriers(&self, timeout: Duration) -> Result<Vec<Carrier>, TransportFailure> {
        let url = format!("{}/api/carriers", self.base_url);
        let res = self.get(&url, &[], timeout).await?;
        let list = res.json::<CarrierList>().await.map_err(transport_failure)?;
        Ok(list.carriers)
    }

    async fn ping(&self, timeout: Duration) -> Result<(), TransportFailure> {
        let url = format!("{}/", self.base_url);
        self.get(&url, &[], timeout).await.map(|_| ())
    }
}

fn transport_failure(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout
    } else if e.is_connect() || e.is_request() {
        TransportFailure::Network(e.to_string())
    } else {
        TransportFailure::Other(e.to_string())
    }
}

/// Pull `message` (or FastAPI's `detail`) out of an error body.
pub fn error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v.get("message")
        .and_then(Value::as_str)
        .or_else(|| v.get("detail").and_then(Value::as_str))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Classifying, retrying client used by the fetch worker.
pub struct TrackingClient<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: TrackingTransport> TrackingClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Track one parcel.
    ///
    /// HTTP-classified failures are final. Timeouts and network failures are
    /// retried up to `max_retries` times with the longer `retry_timeout`.
    pub async fn track(&self, query: &TrackingQuery) -> Result<TrackingResult, TrackError> {
        let mut attempt = 0u32;
        loop {
            let timeout = self.policy.timeout_for(attempt);
            match self.transport.fetch_tracking(query, timeout).await {
                Ok(result) => {
                    if attempt > 0 {
                        log::info!("track {} succeeded on retry {attempt}", query.number);
                    }
                    return Ok(result);
                }
                Err(failure) => {
                    let err = classify(failure);
                    if err.kind.is_transport() && attempt < self.policy.max_retries {
                        attempt += 1;
                        log::warn!(
                            "track {} {:?} retry={} timeout={}ms",
                            query.number,
                            err.kind,
                            attempt,
                            self.policy.retry_timeout.as_millis()
                        );
                        continue;
                    }
                    log::warn!("track {} failed: {:?} {}", query.number, err.kind, err.message);
                    return Err(err);
                }
            }
        }
    }

    /// Carrier listing; callers wanting a fallback go through `carriers::list_carriers`.
    pub async fn carriers(&self) -> Result<Vec<Carrier>, TrackError> {
        self.transport
            .fetch_carriers(Duration::from_millis(api_const::LOOKUP_TIMEOUT_MS))
            .await
            .map_err(classify)
    }

    /// `GET /` liveness probe.
    pub async fn health(&self) -> Result<(), TrackError> {
        self.transport
            .ping(Duration::from_millis(api_const::LOOKUP_TIMEOUT_MS))
            .await
            .map_err(classify)
    }
}
