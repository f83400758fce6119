//! Inbound and outbound frames.
//!
//! # Wire format
//!
//! One JSON object per WebSocket text message, discriminated by `type`:
//!
//! ```text
//! server -> client                          client -> server
//! {"type":"message", ...ChatMessage}        {"type":"message","message_type","content","media_url"?}
//! {"type":"typing","user",...}           {"type":"typing"}
//! {"type":"seen","message_id","user"?}      {"type":"seen","message_id"}
//! {"type":"user_joined","user"}
//! {"type":"user_left","user"}
//! {"error":"..."}                           (no type tag: server rejection)
//! ```
//!
//! A `message` frame carries the message either flat in the frame or nested
//! under a `message` key; both decode to the same [`ServerFrame::Message`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ChatMessage, MessageId, MessageKind,
    errors::{ProtocolError, Result},
};

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// A message was posted to the room (possibly a redelivery).
    Message(ChatMessage),

    /// The other participant is typing.
    Typing {
        /// Pseudonym of the typist
        handle: String,
    },

    /// A message was seen by the other participant.
    Seen {
        /// Message that was seen
        message_id: MessageId,
        /// Pseudonym of the reader, if the server included it
        by: Option<String>,
    },

    /// The other participant opened the room.
    UserJoined {
        /// Pseudonym of the participant
        handle: String,
    },

    /// The other participant left the room.
    UserLeft {
        /// Pseudonym of the participant
        handle: String,
    },

    /// The server refused the last client frame (empty message, locked room).
    Rejected {
        /// Human-readable reason
        reason: String,
    },

    /// Well-formed frame with a `type` this client does not know.
    Unknown {
        /// The unrecognized discriminator
        tag: String,
    },
}

#[derive(Deserialize)]
struct TypingPayload {
    #[serde(alias = "user", alias = "user_handle", alias = "sender")]
    handle: String,
}

#[derive(Deserialize)]
struct SeenPayload {
    message_id: MessageId,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Deserialize)]
struct PresencePayload {
    #[serde(alias = "handle")]
    user: String,
}

impl ServerFrame {
    /// Decode one inbound text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Malformed` if the text is not JSON
    /// - `ProtocolError::NotAnObject` if it is not a JSON object
    /// - `ProtocolError::MissingType` if there is neither `type` nor `error`
    /// - `ProtocolError::InvalidTag` if `type` is not a string
    /// - `ProtocolError::InvalidPayload` if a known type has an unusable body
    ///
    /// Unknown `type` values are not errors; they decode to
    /// [`ServerFrame::Unknown`].
    pub fn decode(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let Value::Object(mut fields) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let tag = match fields.remove("type") {
            Some(Value::String(tag)) => tag,
            Some(_) => return Err(ProtocolError::InvalidTag),
            None => {
                return match fields.get("error") {
                    Some(Value::String(reason)) => Ok(Self::Rejected { reason: reason.clone() }),
                    _ => Err(ProtocolError::MissingType),
                };
            },
        };

        match tag.as_str() {
            "message" => {
                let body = match fields.remove("message") {
                    Some(nested @ Value::Object(_)) => nested,
                    _ => Value::Object(fields),
                };
                decode_body::<ChatMessage>("message", body).map(Self::Message)
            },
            "typing" => {
                let typing: TypingPayload = decode_body("typing", Value::Object(fields))?;
                // The server relays pulses with `is_typing: false`; every one means typing.
                Ok(Self::Typing { handle: typing.handle })
            },
            "seen" => {
                let seen: SeenPayload = decode_body("seen", Value::Object(fields))?;
                Ok(Self::Seen { message_id: seen.message_id, by: seen.user })
            },
            "user_joined" => {
                let presence: PresencePayload = decode_body("user_joined", Value::Object(fields))?;
                Ok(Self::UserJoined { handle: presence.user })
            },
            "user_left" => {
                let presence: PresencePayload = decode_body("user_left", Value::Object(fields))?;
                Ok(Self::UserLeft { handle: presence.user })
            },
            _ => Ok(Self::Unknown { tag }),
        }
    }

    /// Frame type name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Typing { .. } => "typing",
            Self::Seen { .. } => "seen",
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::Rejected { .. } => "error",
            Self::Unknown { .. } => "unknown",
        }
    }
}

fn decode_body<T: serde::de::DeserializeOwned>(kind: &'static str, body: Value) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| ProtocolError::InvalidPayload { kind, reason: e.to_string() })
}

/// Frames sent by the client.
///
/// The client never assigns message ids or timestamps; the server echoes every
/// accepted message back as a [`ServerFrame::Message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Post a message.
    Message {
        /// Payload kind
        message_type: MessageKind,
        /// Body, caption, or gift name
        content: String,
        /// Media location for non-text kinds
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_url: Option<String>,
    },

    /// Typing pulse. Carries no payload.
    Typing,

    /// Seen receipt.
    Seen {
        /// Message that was seen
        message_id: MessageId,
    },
}

impl ClientFrame {
    /// Serialize to the JSON text sent over the socket.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Frame type name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::Typing => "typing",
            Self::Seen { .. } => "seen",
        }
    }
}
