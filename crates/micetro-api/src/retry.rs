// Retry policy for connection-level failures.
//
// Kept separate from response classification: the policy only knows
// whether an attempt failed with a retryable error, never what the
// suite answered.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::Error;

/// Fixed-delay retry policy.
///
/// Each attempt is independent; the policy holds no state between calls,
/// so one instance can be shared by any number of concurrent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Drive `op` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget runs out.
    ///
    /// `op` receives the 1-based attempt number. The backoff sleep races
    /// `cancel`, so cancelling never waits out a pending delay.
    pub async fn run<T, F, Fut>(
        &self,
        url: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, Error>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op(attempt).await {
                Err(err) if err.is_retryable() => {
                    if attempt >= max_attempts {
                        return Err(Error::RetriesExhausted {
                            url: url.to_owned(),
                            attempts: attempt,
                            reason: err.to_string(),
                        });
                    }

                    warn!(attempt, max_attempts, error = %err, "connection failed, retrying");

                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(Error::Cancelled),
                        () = tokio::time::sleep(self.delay) => {}
                    }
                }
                other => return other,
            }
        }
    }
}

// ── Failure classification ───────────────────────────────────────────

/// Coarse category of a failed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Refused, reset, or unreachable peer. The only retryable kind.
    Connection,
    /// Certificate or handshake failure.
    Tls,
    /// DNS / name resolution failure.
    Resolution,
    /// The whole request exceeded its deadline.
    Timeout,
    Other,
}

impl FailureKind {
    /// Classify a reqwest send error.
    ///
    /// The top-level message embeds the request URL, so matching starts at
    /// the first source to avoid false hits on host names.
    pub fn of(err: &reqwest::Error) -> Self {
        if err.is_timeout() && !err.is_connect() {
            return Self::Timeout;
        }

        let kind = std::error::Error::source(err).map_or(Self::Other, Self::from_chain);

        match kind {
            Self::Other if err.is_connect() => Self::Connection,
            kind => kind,
        }
    }

    /// Walk an error chain and pick the most specific category.
    ///
    /// Resolution and TLS markers win over a generic I/O kind found
    /// deeper in the chain.
    pub fn from_chain(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut kind = Self::Other;
        let mut current = Some(err);

        while let Some(e) = current {
            let text = e.to_string().to_ascii_lowercase();
            if text.contains("dns error")
                || text.contains("failed to lookup address")
                || text.contains("name or service not known")
            {
                return Self::Resolution;
            }
            if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
                return Self::Tls;
            }
            if let Some(io_err) = e.downcast_ref::<io::Error>() {
                if is_connection_kind(io_err.kind()) {
                    kind = Self::Connection;
                }
            }
            current = e.source();
        }

        kind
    }
}

fn is_connection_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::TimedOut
            | io::ErrorKind::AddrNotAvailable
    )
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug)]
    struct Wrapped {
        message: &'static str,
        source: io::Error,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.source)
        }
    }

    fn refused() -> Error {
        Error::Connection {
            url: "https://ipam.example.net/mmws/api/Ranges".into(),
            message: "connection refused".into(),
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            delay: Duration::from_millis(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn connection_failures_stop_after_five_attempts() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: Result<(), Error> = fast_policy()
            .run("https://ipam", &cancel, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(refused()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        match result {
            Err(Error::RetriesExhausted { attempts, reason, .. }) => {
                assert_eq!(attempts, 5);
                assert!(reason.contains("connection refused"), "{reason}");
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn api_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: Result<(), Error> = fast_policy()
            .run("https://ipam", &cancel, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(Error::Api {
                        status: 400,
                        message: "bad filter".into(),
                        code: None,
                    })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(Error::Api { status: 400, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_when_a_later_attempt_succeeds() {
        let cancel = CancellationToken::new();

        let result = fast_policy()
            .run("https://ipam", &cancel, |attempt| async move {
                if attempt < 3 { Err(refused()) } else { Ok(attempt) }
            })
            .await;

        assert_eq!(result.ok(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let slow = RetryPolicy {
            max_attempts: 5,
            delay: Duration::from_secs(3600),
        };
        let result: Result<(), Error> = slow
            .run("https://ipam", &cancel, |_| async { Err(refused()) })
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn single_attempt_policy_reports_exhaustion_immediately() {
        let cancel = CancellationToken::new();
        let result: Result<(), Error> = RetryPolicy::none()
            .run("https://ipam", &cancel, |_| async { Err(refused()) })
            .await;

        assert!(matches!(result, Err(Error::RetriesExhausted { attempts: 1, .. })));
    }

    #[test]
    fn refused_io_error_is_a_connection_failure() {
        let err = Wrapped {
            message: "tcp connect error",
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused"),
        };
        assert_eq!(FailureKind::from_chain(&err), FailureKind::Connection);
    }

    #[test]
    fn dns_failure_is_not_retryable() {
        let err = Wrapped {
            message: "dns error",
            source: io::Error::other("failed to lookup address information"),
        };
        assert_eq!(FailureKind::from_chain(&err), FailureKind::Resolution);
    }

    #[test]
    fn certificate_failure_is_tls() {
        let err = Wrapped {
            message: "client error (Connect)",
            source: io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid peer certificate: UnknownIssuer",
            ),
        };
        assert_eq!(FailureKind::from_chain(&err), FailureKind::Tls);
    }

    #[test]
    fn unrelated_errors_are_other() {
        let err = io::Error::new(io::ErrorKind::InvalidInput, "bad header");
        assert_eq!(FailureKind::from_chain(&err), FailureKind::Other);
    }
}
