//! Session inputs and outputs.
//!
//! A driver feeds [`SessionEvent`]s into
//! [`ChatSession::handle`](crate::ChatSession::handle) and executes the
//! returned [`SessionAction`]s.

use std::fmt;

use matchhub_proto::{ChatMessage, ClientFrame, MessageId, MessageKind, RoomId};

use crate::{
    error::ValidationError,
    session::{ConnectionId, PeerPresence, SessionStatus},
};

/// Inputs to a [`ChatSession`](crate::ChatSession).
///
/// Transport events carry the [`ConnectionId`] of the `Connect` action they
/// answer. Events for any other id are stale and dropped.
#[derive(Debug, Clone)]
pub enum SessionEvent<I> {
    /// The transport finished opening.
    Connected {
        /// Connection that opened
        connection: ConnectionId,
    },

    /// One text frame arrived.
    FrameReceived {
        /// Connection the frame arrived on
        connection: ConnectionId,
        /// Raw frame text
        text: String,
        /// Arrival time, starts the typing window
        now: I,
    },

    /// The server closed the connection.
    TransportClosed {
        /// Connection that closed
        connection: ConnectionId,
        /// Close reason, if any
        reason: String,
    },

    /// The transport failed to open or broke.
    TransportFailed {
        /// Connection that failed
        connection: ConnectionId,
        /// Failure description
        reason: String,
    },

    /// Time advanced.
    Tick {
        /// Current time
        now: I,
    },

    /// Messages fetched from the REST history endpoint.
    HistoryLoaded {
        /// Room the history belongs to
        room_id: RoomId,
        /// Messages in any order, possibly overlapping the live stream
        messages: Vec<ChatMessage>,
    },

    /// User wants to post a message.
    SendMessage(OutgoingMessage),

    /// User is typing.
    SendTyping,

    /// User saw a message.
    MarkSeen {
        /// Message that was seen
        message_id: MessageId,
    },
}

/// Outputs of a [`ChatSession`](crate::ChatSession) for a driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a transport to the room.
    ///
    /// The driver answers with `Connected`, `TransportFailed`, frames, and
    /// eventually `TransportClosed`, all tagged with `connection`.
    Connect {
        /// Generation of this connection
        connection: ConnectionId,
        /// Room to join
        room_id: RoomId,
        /// Bearer token for the handshake
        token: AuthToken,
    },

    /// Send a frame on the current connection.
    SendFrame(ClientFrame),

    /// Close the transport for `connection`.
    Disconnect {
        /// Connection to close
        connection: ConnectionId,
    },
}

/// Bearer token for the room handshake.
///
/// `Debug` does not print the secret, so actions can be logged freely.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token, for building the handshake URL.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(<{} bytes>)", self.0.len())
    }
}

/// A message the user wants to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Payload kind
    pub kind: MessageKind,
    /// Body, caption, or gift name
    pub content: String,
    /// Media location, required for image and voice
    pub media_url: Option<String>,
}

impl OutgoingMessage {
    /// A plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self { kind: MessageKind::Text, content: content.into(), media_url: None }
    }

    /// A media message with an optional caption.
    pub fn media(kind: MessageKind, media_url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self { kind, content: caption.into(), media_url: Some(media_url.into()) }
    }

    /// Check the message before sending.
    ///
    /// A message is sendable when its trimmed content is non-empty, or when it
    /// is a non-text kind with a media URL. Image and voice messages always
    /// need a media URL.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_media = self.media_url.as_deref().is_some_and(|url| !url.trim().is_empty());

        if self.kind.requires_media() && !has_media {
            return Err(ValidationError::MissingMedia { kind: self.kind });
        }

        let has_text = !self.content.trim().is_empty();
        if has_text || (self.kind != MessageKind::Text && has_media) {
            Ok(())
        } else {
            Err(ValidationError::EmptyContent)
        }
    }

    pub(crate) fn into_frame(self) -> ClientFrame {
        let media_url = self.media_url.filter(|url| !url.trim().is_empty());
        ClientFrame::Message { message_type: self.kind, content: self.content, media_url }
    }
}

/// Owned copy of the view-facing session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Connection status
    pub status: SessionStatus,
    /// Room the session is bound to, if any
    pub room_id: Option<RoomId>,
    /// Timeline in order
    pub messages: Vec<ChatMessage>,
    /// Who is typing, if anyone
    pub typing: Option<String>,
    /// Presence of the other participant
    pub peer: PeerPresence,
    /// Most recent server rejection
    pub last_rejection: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(OutgoingMessage::text("  \n ").validate(), Err(ValidationError::EmptyContent));
        assert_eq!(OutgoingMessage::text(" hi ").validate(), Ok(()));
    }

    #[test]
    fn image_and_voice_need_media() {
        for kind in [MessageKind::Image, MessageKind::Voice] {
            let msg = OutgoingMessage { kind, content: "caption".into(), media_url: None };
            assert_eq!(msg.validate(), Err(ValidationError::MissingMedia { kind }));

            let msg = OutgoingMessage { kind, content: "caption".into(), media_url: Some(String::new()) };
            assert_eq!(msg.validate(), Err(ValidationError::MissingMedia { kind }));

            assert_eq!(OutgoingMessage::media(kind, "https://cdn/x", "").validate(), Ok(()));
        }
    }

    #[test]
    fn gifts_and_stickers_need_content_or_media() {
        let gift = OutgoingMessage { kind: MessageKind::Gift, content: "rose".into(), media_url: None };
        assert_eq!(gift.validate(), Ok(()));

        let empty = OutgoingMessage { kind: MessageKind::Sticker, content: String::new(), media_url: None };
        assert_eq!(empty.validate(), Err(ValidationError::EmptyContent));

        let sticker = OutgoingMessage::media(MessageKind::Sticker, "https://cdn/wave.webp", "");
        assert_eq!(sticker.validate(), Ok(()));
    }

    #[test]
    fn text_with_media_still_needs_content() {
        let msg = OutgoingMessage {
            kind: MessageKind::Text,
            content: " ".into(),
            media_url: Some("https://cdn/x".into()),
        };
        assert_eq!(msg.validate(), Err(ValidationError::EmptyContent));
    }

    #[test]
    fn token_debug_hides_secret() {
        let token = AuthToken::new("secret-jwt");
        assert_eq!(format!("{token:?}"), "AuthToken(<10 bytes>)");
        assert_eq!(token.expose(), "secret-jwt");
    }
}
