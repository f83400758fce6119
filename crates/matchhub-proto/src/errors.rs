//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding inbound frames or encoding outbound ones.
///
/// None of these are fatal to a chat session: the session controller drops the
/// offending frame and keeps its state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame text is not valid JSON
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Frame is valid JSON but not an object
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// Frame object has no `type` discriminator
    #[error("frame has no type tag")]
    MissingType,

    /// `type` discriminator is present but not a string
    #[error("frame type tag is not a string")]
    InvalidTag,

    /// Recognized frame type with a payload that does not fit it
    #[error("invalid {kind} frame: {reason}")]
    InvalidPayload {
        /// Frame type that failed to decode
        kind: &'static str,
        /// Decoder message
        reason: String,
    },

    /// Unknown message kind string
    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    /// Outbound frame could not be serialized
    #[error("encode failed: {0}")]
    Encode(String),
}
