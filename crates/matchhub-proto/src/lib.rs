//! MatchHub chat wire protocol.
//!
//! Frames exchanged over a chat room's WebSocket are JSON objects carrying a
//! `type` discriminator. Inbound frames are decoded exactly once at the
//! boundary into [`ServerFrame`], a closed sum type with an explicit
//! [`ServerFrame::Unknown`] fallback so new server frame kinds never break an
//! older client. Outbound frames are built from [`ClientFrame`].
//!
//! # Components
//!
//! - [`ChatMessage`]: A message as the server assigns it (id, author, kind,
//!   payload, seen flag, timestamp)
//! - [`Timestamp`]: Server-assigned ordering key
//! - [`ServerFrame`]: Inbound frames (message, typing, seen, presence,
//!   rejection)
//! - [`ClientFrame`]: Outbound frames (message, typing pulse, seen receipt)
//! - [`ProtocolError`]: Decode/encode failures

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;
mod ids;
mod message;
mod timestamp;

pub use errors::{ProtocolError, Result};
pub use frame::{ClientFrame, ServerFrame};
pub use ids::{MessageId, RoomId};
pub use message::{ChatMessage, MessageKind};
pub use timestamp::Timestamp;
