use thiserror::Error;

/// Top-level error type for the `micetro-api` crate.
///
/// Every variant is fatal to the calling operation. Only
/// [`Error::Connection`] is ever retried, and only inside the gateway's
/// [`RetryPolicy`](crate::RetryPolicy); once the policy gives up it is
/// surfaced as [`Error::RetriesExhausted`].
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The suite (or the HA/load-balancer in front of it) refused or
    /// dropped the connection.
    #[error("Error connecting to {url}: {message}")]
    Connection { url: String, message: String },

    /// Connection-level failures persisted through every attempt.
    #[error("Error connecting to {url} after {attempts} attempts: {reason}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// Host name could not be resolved.
    #[error("Failed lookup url for {url}: {message}")]
    Resolution { url: String, message: String },

    /// TLS handshake or certificate error.
    #[error("TLS error for {url}: {message}")]
    Tls { url: String, message: String },

    /// Request exceeded the configured per-request deadline.
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Any other HTTP transport failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Building the HTTP client failed (bad CA file, TLS backend init).
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// A pending retry was abandoned because the caller cancelled.
    #[error("Request cancelled")]
    Cancelled,

    // ── API ─────────────────────────────────────────────────────────
    /// The suite rejected the request (`{"error": {"message", "code"}}`).
    #[error("API error (HTTP {status}): {message}{}", code_suffix(.code.as_deref()))]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for the connection-level failures the retry policy
    /// is allowed to repeat.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Returns `true` if the suite answered with 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Extract the API error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Build a [`Error::Deserialization`] carrying a short body preview.
    pub(crate) fn deserialization(err: &serde_json::Error, body: &str) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    }
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|c| format!(" ({c})")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_code() {
        let err = Error::Api {
            status: 400,
            message: "Object not found".into(),
            code: Some("2049".into()),
        };
        assert_eq!(err.to_string(), "API error (HTTP 400): Object not found (2049)");
        assert_eq!(err.api_error_code(), Some("2049"));
    }

    #[test]
    fn only_connection_errors_are_retryable() {
        let api = Error::Api {
            status: 503,
            message: "unavailable".into(),
            code: None,
        };
        assert!(!api.is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(
            !Error::Tls {
                url: "https://ipam".into(),
                message: "bad cert".into()
            }
            .is_retryable()
        );
    }
}
