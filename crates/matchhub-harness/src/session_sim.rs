//! Session driven step by step under a virtual clock.
//!
//! `SessionSim` plays the driver's role without a runtime: it feeds events to
//! a [`ChatSession`], checks the registered invariants after every step, and
//! hands back the actions so tests can assert on them.

use std::time::Duration;

use matchhub_core::{
    ChatMessage, ChatSession, ConnectionId, Environment, OutgoingMessage, RoomId, SessionAction,
    SessionConfig, SessionEvent,
};

use crate::{
    invariants::{InvariantRegistry, Observation},
    sim_env::{SimEnv, SimInstant},
};

/// Session under test.
#[derive(Debug)]
pub struct SessionSim {
    session: ChatSession<SimInstant>,
    env: SimEnv,
    invariants: InvariantRegistry,
    steps: usize,
}

impl Default for SessionSim {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SessionSim {
    /// Closed session with the standard invariants.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: ChatSession::new(config),
            env: SimEnv::new(),
            invariants: InvariantRegistry::standard(),
            steps: 0,
        }
    }

    /// Replace the invariant set.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = registry;
        self
    }

    /// Session under test.
    pub fn session(&self) -> &ChatSession<SimInstant> {
        &self.session
    }

    /// The virtual clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Current connection generation.
    pub fn connection(&self) -> ConnectionId {
        self.session.connection()
    }

    /// Open a room.
    pub fn open(&mut self, room_id: &str, token: &str) -> Vec<SessionAction> {
        self.observe("open", |session| session.open(room_id, token))
    }

    /// Close the session.
    pub fn close(&mut self) -> Vec<SessionAction> {
        self.observe("close", ChatSession::close)
    }

    /// Open a room and report the transport as connected.
    pub fn open_connected(&mut self, room_id: &str, token: &str) -> Vec<SessionAction> {
        let mut actions = self.open(room_id, token);
        actions.extend(self.connected());
        actions
    }

    /// Report the current connection as established.
    pub fn connected(&mut self) -> Vec<SessionAction> {
        let connection = self.connection();
        self.step(SessionEvent::Connected { connection })
    }

    /// Deliver an inbound frame on the current connection, stamped now.
    pub fn frame(&mut self, text: &str) -> Vec<SessionAction> {
        let connection = self.connection();
        let now = self.env.now();
        self.step(SessionEvent::FrameReceived { connection, text: text.to_owned(), now })
    }

    /// Report the current connection as closed by the peer.
    pub fn transport_closed(&mut self) -> Vec<SessionAction> {
        let connection = self.connection();
        self.step(SessionEvent::TransportClosed { connection, reason: "closed".into() })
    }

    /// Merge history for `room_id`.
    pub fn history(&mut self, room_id: &str, messages: Vec<ChatMessage>) -> Vec<SessionAction> {
        self.step(SessionEvent::HistoryLoaded { room_id: RoomId::new(room_id), messages })
    }

    /// Send a message.
    pub fn send(&mut self, message: OutgoingMessage) -> Vec<SessionAction> {
        self.step(SessionEvent::SendMessage(message))
    }

    /// Advance the clock and tick.
    pub fn advance(&mut self, duration: Duration) -> Vec<SessionAction> {
        self.env.advance(duration);
        let now = self.env.now();
        self.step(SessionEvent::Tick { now })
    }

    /// Apply one event and check invariants.
    ///
    /// # Panics
    ///
    /// Panics if an invariant is violated.
    pub fn step(&mut self, event: SessionEvent<SimInstant>) -> Vec<SessionAction> {
        self.observe("event", |session| session.handle(event))
    }

    fn observe(
        &mut self,
        label: &str,
        apply: impl FnOnce(&mut ChatSession<SimInstant>) -> Vec<SessionAction>,
    ) -> Vec<SessionAction> {
        let before = self.session.snapshot();
        let actions = apply(&mut self.session);
        let remaining = self.session.next_deadline(self.env.now());
        let observation = Observation::new(before, self.session.snapshot(), actions.clone())
            .with_typing_remaining(remaining);

        self.steps += 1;
        self.invariants.assert_all(&observation, &format!("at step {} ({label})", self.steps));
        actions
    }
}
