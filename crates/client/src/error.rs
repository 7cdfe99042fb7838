//! Error taxonomy for Graze API calls
//!
//! Every failure surfaces to the caller with a numeric status (where one was
//! received) and a message. Malformed JSON response bodies are the single
//! exception: they degrade to a "No data returned" marker instead of erroring.

use thiserror::Error;

/// Errors produced by the dispatcher core.
#[derive(Debug, Error)]
pub enum GrazeError {
    /// The request body could not be encoded; nothing was sent.
    #[error("failed to serialize request body: {0}")]
    Serialization(String),

    /// No response was received from the server.
    #[error("connection to graze failed: {0}")]
    Connection(String),

    /// Login was rejected, or the 503 retry budget was exhausted.
    #[error("authentication failed (HTTP {status}): {message}")]
    Authentication {
        /// Upstream HTTP status of the last login attempt.
        status: u16,
        /// Upstream message for the last login attempt.
        message: String,
    },

    /// The remote API rejected the operation with a structured message body.
    #[error("graze rejected request (HTTP {status}): {message} [{status_message}]")]
    Application {
        /// HTTP status of the response.
        status: u16,
        /// The body's application-level `message` field.
        message: String,
        /// Derived status message: the body's `statusMessage`, falling back
        /// to `additional.debugMessage`, then to the HTTP status text.
        status_message: String,
    },

    /// Non-2xx response without a structured message body.
    #[error("HTTP {status}: {status_text}")]
    Transport {
        /// HTTP status of the response.
        status: u16,
        /// Canonical status text for the status code.
        status_text: String,
    },

    /// TLS, proxy, or header material could not be loaded into the transport.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GrazeError {
    /// Upstream HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::Application { status, .. }
            | Self::Transport { status, .. } => Some(*status),
            Self::Serialization(_) | Self::Connection(_) | Self::Config(_) => None,
        }
    }

    /// Whether this error invalidates the cached session credential.
    ///
    /// Any classified remote error does; local failures that never reached
    /// the wire (serialization, configuration) do not.
    pub fn invalidates_session(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::Application { .. }
                | Self::Transport { .. }
                | Self::Connection(_)
        )
    }
}
