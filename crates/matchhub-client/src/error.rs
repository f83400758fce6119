//! REST API errors.
//!
//! Every failed request becomes an [`ApiError`] carrying the HTTP status, a
//! coarse [`ErrorCode`] for control flow, and the server's human-readable
//! message for display.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Message used when the server gave nothing better.
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed";

/// Coarse classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// 400: the server rejected the input
    BadRequest,
    /// 401: missing or expired token
    Unauthorized,
    /// 402: tokens or a subscription are needed
    PaymentRequired,
    /// 403: not allowed, including locked chat rooms
    Forbidden,
    /// 404
    NotFound,
    /// 410: the chat room expired
    ChatExpired,
    /// 429
    RateLimited,
    /// 5xx
    ServerError,
    /// The request never got a response
    Network,
    /// The response (or request) body was not the expected JSON
    Decode,
    /// Any other status
    Unknown,
}

impl ErrorCode {
    /// Classify an HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            402 => Self::PaymentRequired,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            410 => Self::ChatExpired,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Upper snake case name, e.g. `CHAT_EXPIRED`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::PaymentRequired => "PAYMENT_REQUIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::ChatExpired => "CHAT_EXPIRED",
            Self::RateLimited => "RATE_LIMITED",
            Self::ServerError => "SERVER_ERROR",
            Self::Network => "NETWORK",
            Self::Decode => "DECODE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed REST request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} ({code}, status {status})")]
pub struct ApiError {
    /// HTTP status, or 0 when no response arrived
    pub status: u16,
    /// Classification
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Build from a non-success response.
    ///
    /// The message is taken from the JSON body: `detail`, then `message`, then
    /// `error`, then the first field of a validation error map. Anything else
    /// yields [`DEFAULT_ERROR_MESSAGE`].
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| extract_message(&value))
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned());
        Self { status, code: ErrorCode::from_status(status), message }
    }

    /// No response: connection refused, DNS failure, timeout.
    pub fn network(reason: impl fmt::Display) -> Self {
        Self { status: 0, code: ErrorCode::Network, message: reason.to_string() }
    }

    /// A body that was not the JSON we expected.
    pub fn decode(status: u16, reason: impl fmt::Display) -> Self {
        Self { status, code: ErrorCode::Decode, message: reason.to_string() }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, ErrorCode::Network | ErrorCode::RateLimited | ErrorCode::ServerError)
    }

    /// Whether the caller should log in again.
    pub fn is_auth(&self) -> bool {
        self.code == ErrorCode::Unauthorized
    }
}

const MESSAGE_KEYS: [&str; 3] = ["detail", "message", "error"];

fn extract_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;

    for key in MESSAGE_KEYS {
        if let Some(Value::String(text)) = object.get(key) {
            if !text.trim().is_empty() {
                return Some(text.clone());
            }
        }
    }

    // Validation errors: {"email": ["user with this email already exists."]}
    object.iter().filter(|(field, _)| !MESSAGE_KEYS.contains(&field.as_str())).find_map(
        |(field, value)| {
            let text = match value {
                Value::String(text) => text.as_str(),
                Value::Array(items) => items.iter().find_map(Value::as_str)?,
                _ => return None,
            };
            if text.trim().is_empty() {
                None
            } else if field == "non_field_errors" {
                Some(text.to_owned())
            } else {
                Some(format!("{field}: {text}"))
            }
        },
    )
}
