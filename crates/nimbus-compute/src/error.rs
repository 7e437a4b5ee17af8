// crates/nimbus-compute/src/error.rs
// ============================================================================
// Module: Compute Client Errors
// Description: Typed errors raised by the REST layer and compute clients.
// Purpose: Surface HTTP status failures and transport faults verbatim.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every failure in the compute client stack is a [`ClientError`]. Status
//! failures carry the HTTP status code and the message reported by the
//! compute service; the clients never catch or translate them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Compute client errors.
///
/// # Invariants
/// - `Status` is only produced when a response status falls outside the
///   success codes declared by the caller.
/// - String payloads may include untrusted server text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Response status was not among the declared success codes.
    #[error("compute request failed ({status}): {message}")]
    Status {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message reported by the service.
        message: String,
        /// Optional fault details reported by the service.
        details: Option<String>,
    },
    /// Network, TLS, timeout, or body-size failure.
    #[error("compute transport error: {0}")]
    Transport(String),
    /// JSON serialization or parsing failure.
    #[error("compute json error: {0}")]
    Json(String),
    /// Request cannot be composed for the addressed resource.
    #[error("invalid compute request: {0}")]
    InvalidRequest(String),
    /// Response did not have the expected shape.
    #[error("compute protocol error: {0}")]
    Protocol(String),
    /// Invalid client configuration.
    #[error("compute client config error: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns the HTTP status code when the error came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status {
                status, ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Returns a stable label for audit logging.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Status {
                ..
            } => "status",
            Self::Transport(_) => "transport",
            Self::Json(_) => "json",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Protocol(_) => "protocol",
            Self::Config(_) => "config",
        }
    }

    /// Builds a status error from a response body.
    ///
    /// Compute faults are shaped `{"<faultName>": {"message": .., "details": ..}}`.
    /// When the body is not a fault envelope the trimmed body text is used, and
    /// an empty body falls back to the canonical reason phrase.
    #[must_use]
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        if let Some((message, details)) = parse_fault(body) {
            return Self::Status {
                status,
                message,
                details,
            };
        }
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        let message = if text.is_empty() {
            reason_phrase(status).to_string()
        } else {
            text.to_string()
        };
        Self::Status {
            status,
            message,
            details: None,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts message and details from a single-key compute fault envelope.
fn parse_fault(body: &[u8]) -> Option<(String, Option<String>)> {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }
    let (_, Value::Object(fault)) = map.into_iter().next()? else {
        return None;
    };
    let message = fault.get("message")?.as_str()?.to_string();
    let details = match fault.get("details") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };
    Some((message, details))
}

/// Returns the canonical reason phrase for common compute status codes.
const fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Request Entity Too Large",
        415 => "Unsupported Media Type",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        _ => "Unexpected Status",
    }
}
