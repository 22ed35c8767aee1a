//! CLI error types with miette diagnostics.
//!
//! Maps configuration, gateway and engine errors into user-facing errors
//! with stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use micetro_config::ConfigError;
use micetro_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(micetro::config),
        help(
            "Use a micetro.yml, micetro_inv.yml or micetro_inventory.yml file,\n\
             or @micetro_inventory with MM_HOST, MM_USER and MM_PASSWORD set."
        )
    )]
    Config(#[from] ConfigError),

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(micetro::validation))]
    Validation { field: String, reason: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to Micetro at {url}")]
    #[diagnostic(
        code(micetro::connection_failed),
        help("Check that the suite is reachable and mm_url is correct.")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: micetro_api::Error,
    },

    #[error("TLS verification failed for {url}: {message}")]
    #[diagnostic(
        code(micetro::tls_error),
        help("Set validate_certs: false, or point ca_cert at the suite's CA bundle.")
    )]
    TlsError { url: String, message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Micetro rejected the request (HTTP {status}): {message}{}", code_suffix(.code.as_deref()))]
    #[diagnostic(code(micetro::api_error))]
    ApiError {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error(transparent)]
    #[diagnostic(code(micetro::api))]
    Api(micetro_api::Error),

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("No range matches '{network}'")]
    #[diagnostic(code(micetro::range_not_found))]
    RangeNotFound { network: String },

    #[error("Insufficient free IP addresses for '{network}' ({found} of {requested})")]
    #[diagnostic(code(micetro::range_exhausted))]
    InsufficientAddresses {
        network: String,
        requested: u32,
        found: u32,
    },

    // ── Engine / IO ──────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(micetro::cache))]
    Cache(CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode output: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation { .. } => exit_code::CONFIG,
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|c| format!(" [code {c}]")).unwrap_or_default()
}

// ── Error mapping ────────────────────────────────────────────────────

impl From<micetro_api::Error> for CliError {
    fn from(err: micetro_api::Error) -> Self {
        use micetro_api::Error as E;

        match err {
            E::Tls { url, message } => Self::TlsError { url, message },
            E::Connection { ref url, .. }
            | E::RetriesExhausted { ref url, .. }
            | E::Resolution { ref url, .. }
            | E::Timeout { ref url, .. } => Self::ConnectionFailed {
                url: url.clone(),
                source: err,
            },
            E::Api {
                status,
                message,
                code,
            } => Self::ApiError {
                status,
                message,
                code,
            },
            E::InvalidUrl(e) => Self::Validation {
                field: "mm_url".into(),
                reason: e.to_string(),
            },
            other => Self::Api(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(e) => e.into(),
            other => Self::Cache(other),
        }
    }
}
