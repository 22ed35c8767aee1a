// Response classification.
//
// Turns a status line plus raw body into the normalized outcome every
// caller consumes. Pure: no I/O, no retries, no logging.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Reason text the suite sends with 204; normalized to an empty message.
const NO_CONTENT_SENTINEL: &str = "No Content";

/// Whether a successful response carried a decodable payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Success without a usable payload (204, empty 200, unparsable 201, ...).
    NoBody,
    /// Success with a decoded JSON payload.
    BodyJson,
}

/// A successful gateway outcome.
///
/// For [`StatusClass::NoBody`] the body is a JSON string holding the
/// reason text (empty for "No Content").
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub class: StatusClass,
    pub body: Value,
}

impl ApiResponse {
    pub fn no_body(message: impl Into<String>) -> Self {
        Self {
            class: StatusClass::NoBody,
            body: Value::String(message.into()),
        }
    }

    pub fn json(body: Value) -> Self {
        Self {
            class: StatusClass::BodyJson,
            body,
        }
    }

    pub fn has_body(&self) -> bool {
        self.class == StatusClass::BodyJson
    }

    /// The status message of a body-less response; empty for JSON bodies.
    pub fn message(&self) -> &str {
        match (&self.class, &self.body) {
            (StatusClass::NoBody, Value::String(s)) => s,
            _ => "",
        }
    }

    /// Decode the suite's `{ "result": ... }` wrapper into `T`.
    pub fn result<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let inner = match &self.body {
            Value::Object(map) => map.get("result").cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        };
        serde_json::from_value(inner).map_err(|e| Error::deserialization(&e, &self.body.to_string()))
    }

    /// Like [`result`](Self::result), but a body-less success yields
    /// `T::default()`.
    pub fn result_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, Error> {
        if self.has_body() {
            self.result()
        } else {
            Ok(T::default())
        }
    }
}

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

/// Classify a completed HTTP exchange.
///
/// `reason` is the status line's reason phrase, if known.
pub fn classify(status: StatusCode, reason: Option<&str>, body: &[u8]) -> Result<ApiResponse, Error> {
    match status {
        StatusCode::OK => {
            let text = String::from_utf8_lossy(body);
            if text.trim().is_empty() {
                return Ok(ApiResponse::no_body(""));
            }
            serde_json::from_str(&text)
                .map(ApiResponse::json)
                .map_err(|e| Error::deserialization(&e, &text))
        }
        StatusCode::CREATED => Ok(serde_json::from_slice::<Value>(body)
            .map_or_else(|_| ApiResponse::no_body(""), ApiResponse::json)),
        s if s.is_success() => {
            let reason = reason.unwrap_or_default();
            let message = if reason == NO_CONTENT_SENTINEL { "" } else { reason };
            Ok(ApiResponse::no_body(message))
        }
        s => Err(api_error(s, body)),
    }
}

/// Decode the `{"error": {"message", "code"}}` envelope of a rejected
/// request, falling back to the raw body or status line.
fn api_error(status: StatusCode, body: &[u8]) -> Error {
    let raw = String::from_utf8_lossy(body);

    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return Error::Api {
            status: status.as_u16(),
            message: envelope
                .error
                .message
                .unwrap_or_else(|| status.to_string()),
            code: envelope.error.code.and_then(code_to_string),
        };
    }

    let trimmed = raw.trim();
    Error::Api {
        status: status.as_u16(),
        message: if trimmed.is_empty() {
            status.to_string()
        } else {
            trimmed.chars().take(200).collect()
        },
        code: None,
    }
}

fn code_to_string(code: Value) -> Option<String> {
    match code {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
