//! Response classification
//!
//! Every response funnels through [`classify`] exactly once. The body is
//! parsed as JSON; an unparsable body degrades to a marker object rather
//! than failing the call, because several write endpoints return empty or
//! non-JSON bodies on success.

use serde_json::{json, Value};

use crate::error::GrazeError;

/// Raw material for classification: status plus the accumulated body bytes.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status text for the code (canonical reason phrase).
    pub status_text: String,
    /// Accumulated response body.
    pub body: Vec<u8>,
}

/// Classified result of a single call. Derived once per call and never
/// retried at this layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// HTTP 200 OK with the parsed (or degraded) JSON body.
    Success(Value),
    /// Non-200 whose body carried an application-level `message` field.
    ApplicationError {
        /// HTTP status code.
        status: u16,
        /// The body's `message` field.
        message: String,
        /// The body's `statusMessage`, else `additional.debugMessage`,
        /// else the HTTP status text.
        status_message: String,
    },
    /// Non-200 with no structured message body.
    TransportError {
        /// HTTP status code.
        status: u16,
        /// HTTP status text.
        status_text: String,
    },
    /// The request never produced a response.
    ConnectionError(String),
}

impl ResponseOutcome {
    /// Resolve to the caller-facing contract.
    pub fn into_result(self) -> Result<Value, GrazeError> {
        match self {
            Self::Success(body) => Ok(body),
            Self::ApplicationError { status, message, status_message } => {
                Err(GrazeError::Application { status, message, status_message })
            }
            Self::TransportError { status, status_text } => {
                Err(GrazeError::Transport { status, status_text })
            }
            Self::ConnectionError(cause) => Err(GrazeError::Connection(cause)),
        }
    }
}

/// Parse the accumulated body, degrading a non-JSON payload to an empty
/// object annotated with a "no data returned" marker.
pub fn parse_or_degrade(body: &[u8]) -> Value {
    match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "response body is not JSON, degrading");
            json!({ "description": "No Data returned" })
        }
    }
}

/// Classify a raw response into a [`ResponseOutcome`].
///
/// The transport layer does not surface the raw reason phrase, so "200 OK"
/// is checked as status code 200.
pub fn classify(raw: RawResponse) -> ResponseOutcome {
    let body = parse_or_degrade(&raw.body);

    if raw.status == 200 {
        return ResponseOutcome::Success(body);
    }

    if let Some(message) = body.get("message").and_then(Value::as_str) {
        let status_message = body
            .get("statusMessage")
            .and_then(Value::as_str)
            .or_else(|| body.pointer("/additional/debugMessage").and_then(Value::as_str))
            .unwrap_or(&raw.status_text)
            .to_string();
        tracing::warn!(
            status = raw.status,
            message,
            status_message,
            "graze rejected the request"
        );
        return ResponseOutcome::ApplicationError {
            status: raw.status,
            message: message.to_string(),
            status_message,
        };
    }

    tracing::warn!(status = raw.status, status_text = %raw.status_text, "request failed");
    ResponseOutcome::TransportError { status: raw.status, status_text: raw.status_text }
}

/// Status text helper for a numeric code.
pub(crate) fn status_text(status: reqwest::StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown").to_string()
}
