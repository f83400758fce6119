//! Error types for the chat session core.
//!
//! The session controller absorbs every failure into state (status changes,
//! dropped frames, suppressed sends), so the only error it exposes is
//! [`ValidationError`], returned by [`OutgoingMessage::validate`] for callers
//! that want to give feedback before sending.
//!
//! [`OutgoingMessage::validate`]: crate::OutgoingMessage::validate

use matchhub_proto::MessageKind;
use thiserror::Error;

/// An outbound message that would be rejected before transmission.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// No text after trimming and no media to stand in for it
    #[error("message has no content")]
    EmptyContent,

    /// Media kind without a media URL
    #[error("{kind} message requires a media URL")]
    MissingMedia {
        /// Kind that needs media
        kind: MessageKind,
    },
}
