// Micetro REST gateway
//
// Wraps `reqwest::Client` with URL construction under `/mmws/api/`,
// per-request Basic auth, the connection retry policy, and response
// classification. Typed endpoint helpers (ranges, IPAM records, refs)
// live in sibling modules as inherent methods.

use std::time::Duration;

use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::classify::{ApiResponse, classify};
use crate::connection::Connection;
use crate::error::Error;
use crate::query::Query;
use crate::retry::{FailureKind, RetryPolicy};
use crate::transport::TransportConfig;

/// Fixed path between the suite's base URL and every endpoint.
pub const API_PREFIX: &str = "mmws/api";

/// Stateless gateway to one Micetro suite.
///
/// Holds only read-only data, so a single instance can serve any number of
/// concurrent calls. Retry state lives on the stack of each call.
pub struct Gateway {
    http: reqwest::Client,
    connection: Connection,
    retry: RetryPolicy,
    timeout: Duration,
    cancel: CancellationToken,
}

impl Gateway {
    /// Build a gateway with a fresh HTTP client from `transport`.
    pub fn new(connection: Connection, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            connection,
            retry: transport.retry,
            timeout: transport.timeout,
            cancel: CancellationToken::new(),
        })
    }

    /// Wrap a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, connection: Connection, retry: RetryPolicy) -> Self {
        Self {
            http,
            connection,
            retry,
            timeout: TransportConfig::default().timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort pending retry backoffs when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/mmws/api/{endpoint}` and append `query`.
    ///
    /// `endpoint` may already carry a query string; `query` is appended
    /// after it.
    pub fn endpoint_url(&self, endpoint: &str, query: &Query) -> Result<Url, Error> {
        let (path, existing) = match endpoint.split_once('?') {
            Some((path, qs)) => (path, Some(qs)),
            None => (endpoint, None),
        };

        let base = self.connection.base_url().as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{API_PREFIX}/{path}"))?;

        let encoded = query.encode();
        let qs = match (existing.filter(|q| !q.is_empty()), encoded.is_empty()) {
            (Some(existing), true) => existing.to_owned(),
            (Some(existing), false) => format!("{existing}&{encoded}"),
            (None, false) => encoded,
            (None, true) => String::new(),
        };
        if !qs.is_empty() {
            url.set_query(Some(&qs));
        }

        Ok(url)
    }

    // ── Calls ────────────────────────────────────────────────────────

    /// Issue one logical API call.
    ///
    /// `body`, when present, is sent as JSON regardless of `method`.
    pub async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<ApiResponse, Error> {
        self.call_with_query(endpoint, method, &Query::new(), body)
            .await
    }

    /// Like [`call`](Self::call), with structured query parameters.
    pub async fn call_with_query(
        &self,
        endpoint: &str,
        method: Method,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<ApiResponse, Error> {
        let url = self.endpoint_url(endpoint, query)?;

        self.retry
            .run(url.as_str(), &self.cancel, |attempt| {
                self.send_once(method.clone(), &url, body, attempt)
            })
            .await
    }

    /// `GET` shorthand.
    pub async fn get(&self, endpoint: &str, query: &Query) -> Result<ApiResponse, Error> {
        self.call_with_query(endpoint, Method::GET, query, None)
            .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        attempt: u32,
    ) -> Result<ApiResponse, Error> {
        debug!(%method, %url, attempt, "sending request");

        let mut builder = self.http.request(method, url.clone()).basic_auth(
            self.connection.username(),
            Some(self.connection.password().expose_secret()),
        );
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| self.send_error(url, e))?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| self.send_error(url, e))?;

        trace!(status = status.as_u16(), len = bytes.len(), "response received");
        classify(status, status.canonical_reason(), &bytes)
    }

    fn send_error(&self, url: &Url, err: reqwest::Error) -> Error {
        let url_str = url.to_string();
        match FailureKind::of(&err) {
            FailureKind::Connection => Error::Connection {
                url: url_str,
                message: source_chain(&err),
            },
            FailureKind::Tls => Error::Tls {
                url: url_str,
                message: source_chain(&err),
            },
            FailureKind::Resolution => Error::Resolution {
                url: url_str,
                message: source_chain(&err),
            },
            FailureKind::Timeout => Error::Timeout {
                url: url_str,
                timeout_secs: self.timeout.as_secs(),
            },
            FailureKind::Other => Error::Transport(err),
        }
    }
}

/// Render the causes below a reqwest error as `a: b: c`.
fn source_chain(err: &reqwest::Error) -> String {
    let mut parts = Vec::new();
    let mut current = std::error::Error::source(err);
    while let Some(e) = current {
        parts.push(e.to_string());
        current = e.source();
    }
    if parts.is_empty() {
        err.to_string()
    } else {
        parts.join(": ")
    }
}
