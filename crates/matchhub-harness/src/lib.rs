//! Deterministic test harness for MatchHub sessions.
//!
//! In-memory implementations of the [`Environment`](matchhub_core::Environment)
//! and [`Transport`](matchhub_client::Transport) traits, so the same session
//! and runner code runs in tests without sockets or wall-clock time.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties of a session across
//! every event it handles. Use [`InvariantRegistry::standard()`] for the
//! timeline and connection invariants, and [`SessionSim`] to apply them after
//! every step of a test.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scripted_transport;
pub mod session_sim;
pub mod sim_env;

pub use invariants::{
    Invariant, InvariantRegistry, InvariantResult, Observation, OutboundOnlyWhenOpen,
    SeenMonotonic, TimelineOrdered, TypingWindowRespected, UniqueMessageIds, Violation,
};
pub use scripted_transport::{ScriptedPeer, ScriptedTransport};
pub use session_sim::SessionSim;
pub use sim_env::{SimEnv, SimInstant};
