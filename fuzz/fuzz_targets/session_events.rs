//! Fuzz target for the ChatSession state machine
//!
//! Drives a session through arbitrary interleavings of user intents,
//! transport events (current and stale), history loads, and time. Every step
//! runs the standard invariants from the harness.
//!
//! # Invariants
//!
//! - Timeline stays ordered with unique ids
//! - Seen flags never revert within a room
//! - Frames are only sent while Open
//! - Typing indicator clears once its window passes

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use matchhub_core::{ChatMessage, ConnectionId, MessageKind, OutgoingMessage, SessionEvent};
use matchhub_harness::SessionSim;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Open { room: u8 },
    Close,
    Connected { stale: bool },
    Failed { stale: bool },
    Closed { stale: bool },
    Message { id: u8, sender: u8, stamp: u8 },
    Typing { sender: u8 },
    Seen { id: u8 },
    Presence { joined: bool },
    Garbage { text: String },
    History { room: u8, ids: Vec<(u8, u8)> },
    Send { text: String },
    SendTyping,
    MarkSeen { id: u8 },
    Advance { millis: u16 },
}

fn handle(n: u8) -> String {
    format!("user-{}", n % 3)
}

fn stamp(n: u8) -> String {
    format!("2024-05-01T10:{:02}:{:02}Z", (n / 60) % 60, n % 60)
}

fn connection(sim: &SessionSim, stale: bool) -> ConnectionId {
    if stale { sim.connection().next() } else { sim.connection() }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut sim = SessionSim::default();

    for op in ops.into_iter().take(256) {
        match op {
            Op::Open { room } => {
                sim.open(&format!("room-{}", room % 3), "jwt");
            },
            Op::Close => {
                sim.close();
            },
            Op::Connected { stale } => {
                let connection = connection(&sim, stale);
                sim.step(SessionEvent::Connected { connection });
            },
            Op::Failed { stale } => {
                let connection = connection(&sim, stale);
                sim.step(SessionEvent::TransportFailed { connection, reason: "fuzz".into() });
            },
            Op::Closed { stale } => {
                let connection = connection(&sim, stale);
                sim.step(SessionEvent::TransportClosed { connection, reason: "fuzz".into() });
            },
            Op::Message { id, sender, stamp: at } => {
                sim.frame(&format!(
                    r#"{{"type":"message","id":"m{id}","sender_handle":"{}","content":"x","created_at":"{}"}}"#,
                    handle(sender),
                    stamp(at)
                ));
            },
            Op::Typing { sender } => {
                sim.frame(&format!(r#"{{"type":"typing","user":"{}"}}"#, handle(sender)));
            },
            Op::Seen { id } => {
                sim.frame(&format!(r#"{{"type":"seen","message_id":"m{id}"}}"#));
            },
            Op::Presence { joined } => {
                let tag = if joined { "user_joined" } else { "user_left" };
                sim.frame(&format!(r#"{{"type":"{tag}","user":"user-1"}}"#));
            },
            Op::Garbage { text } => {
                sim.frame(&text);
            },
            Op::History { room, ids } => {
                let messages = ids
                    .into_iter()
                    .take(32)
                    .map(|(id, at)| {
                        ChatMessage::new(format!("m{id}"), handle(id), MessageKind::Text, "h", stamp(at))
                    })
                    .collect();
                sim.history(&format!("room-{}", room % 3), messages);
            },
            Op::Send { text } => {
                sim.send(OutgoingMessage::text(text));
            },
            Op::SendTyping => {
                sim.step(SessionEvent::SendTyping);
            },
            Op::MarkSeen { id } => {
                sim.step(SessionEvent::MarkSeen { message_id: format!("m{id}").into() });
            },
            Op::Advance { millis } => {
                sim.advance(Duration::from_millis(u64::from(millis)));
            },
        }
    }
});
