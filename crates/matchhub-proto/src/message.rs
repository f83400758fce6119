//! Chat message payload.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{MessageId, ProtocolError, Timestamp};

/// Kind of payload a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text body
    #[default]
    Text,
    /// Image with optional caption
    Image,
    /// Voice note
    Voice,
    /// Gift; `content` holds the gift name
    Gift,
    /// Sticker
    Sticker,
}

impl MessageKind {
    /// All kinds, in wire order.
    pub const ALL: [Self; 5] = [Self::Text, Self::Image, Self::Voice, Self::Gift, Self::Sticker];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
            Self::Gift => "gift",
            Self::Sticker => "sticker",
        }
    }

    /// Kinds whose payload lives at `media_url` and is meaningless without it.
    pub fn requires_media(self) -> bool {
        matches!(self, Self::Image | Self::Voice)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::UnknownKind(s.to_owned()))
    }
}

/// A chat message as assigned by the server.
///
/// Decoding accepts every spelling the MatchHub server and REST API use for
/// the same field (`message_id`/`id`, `sender`/`sender_handle`,
/// `timestamp`/`created_at`, ...). The REST history endpoint nests the author
/// as a user object; only its `anonymous_handle` is kept.
///
/// # Invariants
///
/// - `seen` only ever moves from `false` to `true` once a message is in a
///   timeline.
/// - `media_url` is never `Some("")`; empty strings decode as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Server-assigned id, unique within the room.
    #[serde(alias = "message_id")]
    pub id: MessageId,

    /// Author's pseudonym. Empty if the server omitted it.
    #[serde(
        default,
        alias = "sender",
        alias = "senderHandle",
        deserialize_with = "sender_handle"
    )]
    pub sender_handle: String,

    /// Payload kind.
    #[serde(
        default,
        rename = "message_type",
        alias = "messageType",
        alias = "type",
        deserialize_with = "lenient_kind"
    )]
    pub kind: MessageKind,

    /// Text body, caption, or gift name.
    #[serde(default, deserialize_with = "string_or_null")]
    pub content: String,

    /// Location of the media payload.
    #[serde(
        default,
        alias = "mediaUrl",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty"
    )]
    pub media_url: Option<String>,

    /// Whether the other participant has seen the message.
    #[serde(default, alias = "is_seen")]
    pub seen: bool,

    /// Ordering key.
    #[serde(alias = "createdAt", alias = "timestamp")]
    pub created_at: Timestamp,
}

impl ChatMessage {
    /// Build a message with no media and `seen = false`.
    pub fn new(
        id: impl Into<MessageId>,
        sender_handle: impl Into<String>,
        kind: MessageKind,
        content: impl Into<String>,
        created_at: impl Into<Timestamp>,
    ) -> Self {
        Self {
            id: id.into(),
            sender_handle: sender_handle.into(),
            kind,
            content: content.into(),
            media_url: None,
            seen: false,
            created_at: created_at.into(),
        }
    }

    /// Attach a media URL.
    #[must_use]
    pub fn with_media(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.media_url = if url.is_empty() { None } else { Some(url) };
        self
    }
}

/// Author field: a bare handle string, or a user object with
/// `anonymous_handle`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SenderField {
    Handle(String),
    User { anonymous_handle: String },
    Other(serde::de::IgnoredAny),
}

fn sender_handle<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match SenderField::deserialize(deserializer)? {
        SenderField::Handle(handle) | SenderField::User { anonymous_handle: handle } => handle,
        SenderField::Other(_) => String::new(),
    })
}

/// Unknown kinds fall back to text rather than rejecting the whole message.
fn lenient_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MessageKind, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| raw.parse().ok()).unwrap_or_default())
}

fn string_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|url| !url.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Image".parse::<MessageKind>().unwrap(), MessageKind::Image);
        assert_eq!(" sticker ".parse::<MessageKind>().unwrap(), MessageKind::Sticker);
        assert!(matches!("video".parse::<MessageKind>(), Err(ProtocolError::UnknownKind(_))));
    }

    #[test]
    fn only_image_and_voice_require_media() {
        let requiring: Vec<_> =
            MessageKind::ALL.into_iter().filter(|kind| kind.requires_media()).collect();
        assert_eq!(requiring, vec![MessageKind::Image, MessageKind::Voice]);
    }

    #[test]
    fn decodes_websocket_spelling() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"message_id":"7","sender":"quiet-otter","message_type":"image",
                "content":"look","media_url":"https://cdn/x.png",
                "timestamp":"2024-05-01T10:00:00+00:00"}"#,
        )
        .unwrap();

        assert_eq!(msg.id.as_str(), "7");
        assert_eq!(msg.sender_handle, "quiet-otter");
        assert_eq!(msg.kind, MessageKind::Image);
        assert_eq!(msg.media_url.as_deref(), Some("https://cdn/x.png"));
        assert!(!msg.seen);
        assert!(msg.created_at.as_datetime().is_some());
    }

    #[test]
    fn decodes_rest_history_spelling() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"id":12,"message_uuid":"c0ffee","sender":{"anonymous_handle":"blue-fox","email":"x@y"},
                "message_type":"text","content":"hey","media_url":"","seen":true,
                "created_at":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(msg.id.as_str(), "12");
        assert_eq!(msg.sender_handle, "blue-fox");
        assert_eq!(msg.media_url, None);
        assert!(msg.seen);
    }

    #[test]
    fn decodes_minimal_camel_case_message() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"id":"m1","createdAt":"T1","content":"hi"}"#).unwrap();

        assert_eq!(msg.id.as_str(), "m1");
        assert_eq!(msg.sender_handle, "");
        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.created_at, Timestamp::Opaque("T1".to_string()));
    }

    #[test]
    fn unknown_kind_falls_back_to_text() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"id":"m1","created_at":"T1","message_type":"hologram"}"#)
                .unwrap();
        assert_eq!(msg.kind, MessageKind::Text);
    }

    #[test]
    fn missing_id_or_timestamp_is_rejected() {
        assert!(serde_json::from_str::<ChatMessage>(r#"{"created_at":"T1"}"#).is_err());
        assert!(serde_json::from_str::<ChatMessage>(r#"{"id":"m1"}"#).is_err());
    }

    #[test]
    fn with_media_drops_empty_url() {
        let msg = ChatMessage::new("m1", "a", MessageKind::Image, "", "T1").with_media("");
        assert_eq!(msg.media_url, None);
    }
}
