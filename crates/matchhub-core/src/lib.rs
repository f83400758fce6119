//! Chat session core.
//!
//! Sans-IO state machine for one MatchHub chat room. The [`ChatSession`]
//! reconciles an unordered, at-least-once stream of server frames into a
//! deduplicated, time-ordered [`MessageTimeline`], tracks the typing indicator
//! and seen receipts, and turns user intents into outbound frames.
//!
//! # Architecture
//!
//! Methods take inputs (and the current time) and return [`SessionAction`]s
//! for a driver to execute: open a socket, send a frame, close the socket. The
//! session never performs I/O, never sleeps, and never reads a clock, so the
//! same code runs under a real WebSocket and under a virtual clock in tests.
//!
//! ```text
//!             open(room, token)            Connected
//!  ┌────────┐ ───────────────> ┌────────────┐ ────────> ┌──────┐
//!  │ Closed │                  │ Connecting │           │ Open │
//!  └────────┘ <─────────────── └────────────┘           └──────┘
//!      ↑       close / transport failure                    │
//!      └────────────────────────────────────────────────────┘
//!                  close / transport closed or failed
//! ```
//!
//! # Components
//!
//! - [`ChatSession`]: Connection lifecycle, inbound reconciliation, outbound
//!   encoding
//! - [`MessageTimeline`]: Ordered, id-unique message list
//! - [`SessionEvent`] / [`SessionAction`]: Inputs and outputs of the session
//! - [`Environment`]: Time source for drivers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
mod event;
mod session;
mod timeline;

pub use env::Environment;
pub use error::ValidationError;
pub use event::{AuthToken, OutgoingMessage, SessionAction, SessionEvent, SessionSnapshot};
pub use matchhub_proto::{ChatMessage, ClientFrame, MessageId, MessageKind, RoomId, Timestamp};
pub use session::{
    ChatSession, ConnectionId, DEFAULT_TYPING_WINDOW, PeerPresence, SessionConfig, SessionStatus,
};
pub use timeline::{InsertOutcome, MessageTimeline};
