//! Chat session state machine.
//!
//! One [`ChatSession`] per chat screen. It owns the connection lifecycle for a
//! single room, reconciles inbound frames into a [`MessageTimeline`], and turns
//! user intents into outbound frames. Every method is synchronous and returns
//! the [`SessionAction`]s the driver must execute.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use matchhub_proto::{ChatMessage, ClientFrame, MessageId, RoomId, ServerFrame};
use tracing::{debug, info, trace, warn};

use crate::{
    event::{AuthToken, OutgoingMessage, SessionAction, SessionEvent, SessionSnapshot},
    timeline::{InsertOutcome, MessageTimeline},
};

/// How long a typing indicator stays up after the latest typing frame.
pub const DEFAULT_TYPING_WINDOW: Duration = Duration::from_secs(3);

/// Generation counter for transport connections.
///
/// Each `Connect` action carries a fresh id. Events from older generations
/// arrive late after a reopen or close and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Raw generation number.
    pub fn get(self) -> u64 {
        self.0
    }

    /// The following generation.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Connection status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// `Connect` issued, waiting for the transport
    Connecting,
    /// Transport open; outbound frames are sent
    Open,
    /// No connection. Inbound events are ignored.
    #[default]
    Closed,
}

/// Presence of the other participant, from join/leave frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeerPresence {
    /// No join or leave seen on this room yet
    #[default]
    Unknown,
    /// The other participant has the room open
    Joined,
    /// The other participant left
    Left,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a typing indicator stays up without a new typing frame
    pub typing_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { typing_window: DEFAULT_TYPING_WINDOW }
    }
}

#[derive(Debug, Clone)]
struct Typing<I> {
    handle: String,
    since: I,
}

/// Chat session for one room.
///
/// Pure state machine: no I/O and no clock. Time arrives inside events, so the
/// session runs identically under real and virtual time.
///
/// # Invariants
///
/// - The timeline is unique by id and ordered by `created_at`.
/// - A message's `seen` flag never goes from `true` to `false`.
/// - While `Closed`, no inbound frame, tick, or history changes state.
/// - Outbound frames are only produced while `Open`.
#[derive(Debug, Clone)]
pub struct ChatSession<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    config: SessionConfig,
    status: SessionStatus,
    room_id: Option<RoomId>,
    token: Option<AuthToken>,
    connection: ConnectionId,
    timeline: MessageTimeline,
    typing: Option<Typing<I>>,
    peer: PeerPresence,
    last_rejection: Option<String>,
}

impl<I> Default for ChatSession<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl<I> ChatSession<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a session in [`SessionStatus::Closed`] bound to no room.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            status: SessionStatus::Closed,
            room_id: None,
            token: None,
            connection: ConnectionId::default(),
            timeline: MessageTimeline::new(),
            typing: None,
            peer: PeerPresence::Unknown,
            last_rejection: None,
        }
    }

    /// Open (or switch) the session to a room.
    ///
    /// Blank `room_id` or `token` means the caller is not ready yet: nothing
    /// happens. Reopening the room and token that are already connecting or
    /// open is a no-op. Any other change tears down the current connection
    /// first; switching rooms also clears the timeline.
    pub fn open(&mut self, room_id: &str, token: &str) -> Vec<SessionAction> {
        let (room_id, token) = (room_id.trim(), token.trim());
        if room_id.is_empty() || token.is_empty() {
            debug!("open skipped: room or token not ready");
            return Vec::new();
        }

        let same_room = self.room_id.as_ref().is_some_and(|r| r.as_str() == room_id);
        let same_token = self.token.as_ref().is_some_and(|t| t.expose() == token);
        if self.is_active() && same_room && same_token {
            trace!(room = room_id, "open ignored: already connected");
            return Vec::new();
        }

        let mut actions = self.teardown();

        if !same_room {
            self.timeline.clear();
            self.peer = PeerPresence::Unknown;
            self.last_rejection = None;
            self.room_id = Some(RoomId::new(room_id));
        }

        let token = AuthToken::new(token);
        self.token = Some(token.clone());
        self.connection = self.connection.next();
        self.status = SessionStatus::Connecting;

        info!(room = room_id, connection = %self.connection, "opening chat connection");

        actions.push(SessionAction::Connect {
            connection: self.connection,
            room_id: RoomId::new(room_id),
            token,
        });
        actions
    }

    /// Close the session. Idempotent.
    ///
    /// Emits one `Disconnect` if a connection was active. The connection
    /// generation advances, so anything the old transport still delivers is
    /// stale.
    pub fn close(&mut self) -> Vec<SessionAction> {
        let actions = self.teardown();
        if !actions.is_empty() {
            info!(connection = %self.connection, "chat connection closed");
        }
        self.connection = self.connection.next();
        actions
    }

    /// Process one event. Never fails; problems are logged and absorbed.
    pub fn handle(&mut self, event: SessionEvent<I>) -> Vec<SessionAction> {
        match event {
            SessionEvent::Connected { connection } => {
                if self.is_current(connection) && self.status == SessionStatus::Connecting {
                    self.status = SessionStatus::Open;
                    info!(%connection, "chat connection open");
                } else {
                    trace!(%connection, "ignoring stale connect");
                }
                Vec::new()
            },

            SessionEvent::FrameReceived { connection, text, now } => {
                if self.is_current(connection) && self.is_active() {
                    self.handle_frame(&text, now);
                } else {
                    trace!(%connection, "dropping frame for stale connection");
                }
                Vec::new()
            },

            SessionEvent::TransportClosed { connection, reason } => {
                if self.is_current(connection) && self.is_active() {
                    info!(%connection, %reason, "chat connection closed by server");
                    self.mark_closed();
                }
                Vec::new()
            },

            SessionEvent::TransportFailed { connection, reason } => {
                if self.is_current(connection) && self.is_active() {
                    warn!(%connection, %reason, "chat connection failed");
                    self.mark_closed();
                }
                Vec::new()
            },

            SessionEvent::Tick { now } => {
                self.expire_typing(now);
                Vec::new()
            },

            SessionEvent::HistoryLoaded { room_id, messages } => {
                self.merge_history(&room_id, messages);
                Vec::new()
            },

            SessionEvent::SendMessage(message) => self.send_message(message),

            SessionEvent::SendTyping => self.send_frame(ClientFrame::Typing),

            SessionEvent::MarkSeen { message_id } => {
                if message_id.is_blank() {
                    debug!("seen receipt skipped: no message id");
                    return Vec::new();
                }
                self.send_frame(ClientFrame::Seen { message_id })
            },
        }
    }

    /// How long until the next tick would change state.
    ///
    /// `None` when nothing is pending. The driver sleeps this long, then sends
    /// [`SessionEvent::Tick`].
    pub fn next_deadline(&self, now: I) -> Option<Duration> {
        let typing = self.typing.as_ref()?;
        Some(self.config.typing_window.saturating_sub(now - typing.since))
    }

    /// Current connection status
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// True when outbound frames would be sent.
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Room the session is bound to, if any.
    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    /// Current connection generation.
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Timeline in order.
    pub fn messages(&self) -> &[ChatMessage] {
        self.timeline.as_slice()
    }

    /// The underlying timeline.
    pub fn timeline(&self) -> &MessageTimeline {
        &self.timeline
    }

    /// Look up one message.
    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.timeline.get(id)
    }

    /// Pseudonym of whoever is typing, while the window is open.
    pub fn typing_handle(&self) -> Option<&str> {
        self.typing.as_ref().map(|t| t.handle.as_str())
    }

    /// Presence of the other participant.
    pub fn peer(&self) -> PeerPresence {
        self.peer
    }

    /// Text of the most recent server rejection.
    pub fn last_rejection(&self) -> Option<&str> {
        self.last_rejection.as_deref()
    }

    /// Ids of messages written by someone other than `own_handle` that are
    /// not yet seen, in timeline order.
    pub fn unseen_from(&self, own_handle: &str) -> Vec<MessageId> {
        self.timeline
            .iter()
            .filter(|m| !m.seen && m.sender_handle != own_handle)
            .map(|m| m.id.clone())
            .collect()
    }

    /// Owned copy of the view-facing state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            room_id: self.room_id.clone(),
            messages: self.timeline.as_slice().to_vec(),
            typing: self.typing_handle().map(str::to_owned),
            peer: self.peer,
            last_rejection: self.last_rejection.clone(),
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Connecting | SessionStatus::Open)
    }

    fn is_current(&self, connection: ConnectionId) -> bool {
        connection == self.connection
    }

    fn teardown(&mut self) -> Vec<SessionAction> {
        let actions = if self.is_active() {
            vec![SessionAction::Disconnect { connection: self.connection }]
        } else {
            Vec::new()
        };
        self.mark_closed();
        actions
    }

    fn mark_closed(&mut self) {
        self.status = SessionStatus::Closed;
        self.typing = None;
    }

    fn handle_frame(&mut self, text: &str, now: I) {
        let frame = match ServerFrame::decode(text) {
            Ok(frame) => frame,
            Err(error) => {
                debug!(%error, "dropping undecodable frame");
                return;
            },
        };

        trace!(kind = frame.kind(), "frame received");

        match frame {
            ServerFrame::Message(message) => {
                let id = message.id.clone();
                if self.timeline.insert(message) == InsertOutcome::Duplicate {
                    trace!(%id, "duplicate message ignored");
                }
            },
            ServerFrame::Typing { handle } => {
                self.typing = Some(Typing { handle, since: now });
            },
            ServerFrame::Seen { message_id, .. } => {
                if !self.timeline.mark_seen(message_id.as_str()) {
                    trace!(%message_id, "seen receipt had no effect");
                }
            },
            ServerFrame::UserJoined { handle } => {
                debug!(%handle, "peer joined");
                self.peer = PeerPresence::Joined;
            },
            ServerFrame::UserLeft { handle } => {
                debug!(%handle, "peer left");
                self.peer = PeerPresence::Left;
            },
            ServerFrame::Rejected { reason } => {
                warn!(%reason, "server rejected request");
                self.last_rejection = Some(reason);
            },
            ServerFrame::Unknown { tag } => {
                debug!(%tag, "ignoring unknown frame type");
            },
        }
    }

    fn expire_typing(&mut self, now: I) {
        let expired =
            self.typing.as_ref().is_some_and(|t| now - t.since >= self.config.typing_window);
        if expired {
            self.typing = None;
        }
    }

    fn merge_history(&mut self, room_id: &RoomId, messages: Vec<ChatMessage>) {
        if self.status == SessionStatus::Closed || self.room_id.as_ref() != Some(room_id) {
            debug!(room = %room_id, "ignoring history for inactive room");
            return;
        }

        let mut added = 0usize;
        for message in messages {
            let seen = message.seen;
            let id = message.id.clone();
            match self.timeline.insert(message) {
                InsertOutcome::Inserted { .. } => added += 1,
                InsertOutcome::Duplicate if seen => {
                    self.timeline.mark_seen(id.as_str());
                },
                InsertOutcome::Duplicate => {},
            }
        }
        debug!(room = %room_id, added, "history merged");
    }

    fn send_message(&self, message: OutgoingMessage) -> Vec<SessionAction> {
        if !self.is_open() {
            debug!("message not sent: connection not open");
            return Vec::new();
        }
        if let Err(error) = message.validate() {
            debug!(%error, "message not sent");
            return Vec::new();
        }
        vec![SessionAction::SendFrame(message.into_frame())]
    }

    fn send_frame(&self, frame: ClientFrame) -> Vec<SessionAction> {
        if !self.is_open() {
            debug!(kind = frame.kind(), "frame not sent: connection not open");
            return Vec::new();
        }
        vec![SessionAction::SendFrame(frame)]
    }
}

#[cfg(test)]
mod tests {
    use matchhub_proto::MessageKind;

    use super::*;

    type Session = ChatSession<Instant>;

    fn open_session() -> (Session, ConnectionId) {
        let mut session = Session::default();
        let actions = session.open("room-1", "jwt");
        let connection = match actions.as_slice() {
            [SessionAction::Connect { connection, .. }] => *connection,
            other => panic!("expected a single connect, got {other:?}"),
        };
        session.handle(SessionEvent::Connected { connection });
        (session, connection)
    }

    fn frame(connection: ConnectionId, text: &str, now: Instant) -> SessionEvent<Instant> {
        SessionEvent::FrameReceived { connection, text: text.to_string(), now }
    }

    fn message_json(id: &str, created_at: &str) -> String {
        format!(
            r#"{{"type":"message","id":"{id}","sender":"blue-fox","message_type":"text","content":"hi {id}","created_at":"{created_at}"}}"#
        )
    }

    fn ids(session: &Session) -> Vec<&str> {
        session.messages().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn new_session_is_closed() {
        let session = Session::default();
        assert_eq!(session.status(), SessionStatus::Closed);
        assert!(session.room_id().is_none());
        assert!(session.messages().is_empty());
    }

    #[test]
    fn open_without_room_or_token_does_nothing() {
        let mut session = Session::default();
        assert!(session.open("", "jwt").is_empty());
        assert!(session.open("room-1", "   ").is_empty());
        assert_eq!(session.status(), SessionStatus::Closed);
    }

    #[test]
    fn open_then_connected_is_open() {
        let mut session = Session::default();
        let actions = session.open(" room-1 ", "jwt");

        assert_eq!(session.status(), SessionStatus::Connecting);
        assert!(matches!(
            actions.as_slice(),
            [SessionAction::Connect { room_id, token, .. }]
                if room_id.as_str() == "room-1" && token.expose() == "jwt"
        ));

        let connection = session.connection();
        session.handle(SessionEvent::Connected { connection });
        assert!(session.is_open());
    }

    #[test]
    fn reopening_same_room_is_a_no_op() {
        let (mut session, connection) = open_session();
        assert!(session.open("room-1", "jwt").is_empty());
        assert_eq!(session.connection(), connection);
        assert!(session.is_open());
    }

    #[test]
    fn switching_rooms_tears_down_and_resets() {
        let t0 = Instant::now();
        let (mut session, old) = open_session();
        session.handle(frame(old, &message_json("m1", "2024-05-01T10:00:00Z"), t0));
        assert_eq!(session.messages().len(), 1);

        let actions = session.open("room-2", "jwt");
        match actions.as_slice() {
            [SessionAction::Disconnect { connection }, SessionAction::Connect { connection: new, room_id, .. }] =>
            {
                assert_eq!(*connection, old);
                assert_ne!(*new, old);
                assert_eq!(room_id.as_str(), "room-2");
            },
            other => panic!("expected disconnect then connect, got {other:?}"),
        }
        assert!(session.messages().is_empty());
        assert_eq!(session.status(), SessionStatus::Connecting);
    }

    #[test]
    fn token_change_reconnects_but_keeps_timeline() {
        let t0 = Instant::now();
        let (mut session, old) = open_session();
        session.handle(frame(old, &message_json("m1", "2024-05-01T10:00:00Z"), t0));

        let actions = session.open("room-1", "refreshed-jwt");
        assert_eq!(actions.len(), 2);
        assert_eq!(ids(&session), ["m1"]);
    }

    #[test]
    fn frames_for_stale_connections_are_dropped() {
        let t0 = Instant::now();
        let (mut session, old) = open_session();
        session.open("room-2", "jwt");

        session.handle(frame(old, &message_json("late", "2024-05-01T10:00:00Z"), t0));
        session.handle(SessionEvent::TransportClosed { connection: old, reason: "bye".into() });

        assert!(session.messages().is_empty());
        assert_eq!(session.status(), SessionStatus::Connecting);
    }

    #[test]
    fn messages_are_ordered_and_deduplicated() {
        let t0 = Instant::now();
        let (mut session, conn) = open_session();

        session.handle(frame(conn, &message_json("b", "2024-05-01T10:00:02Z"), t0));
        session.handle(frame(conn, &message_json("a", "2024-05-01T10:00:01Z"), t0));
        session.handle(frame(conn, &message_json("b", "2024-05-01T10:00:02Z"), t0));

        assert_eq!(ids(&session), ["a", "b"]);
    }

    #[test]
    fn typing_expires_after_window() {
        let t0 = Instant::now();
        let (mut session, conn) = open_session();

        session.handle(frame(conn, r#"{"type":"typing","user":"blue-fox"}"#, t0));
        assert_eq!(session.typing_handle(), Some("blue-fox"));
        assert_eq!(session.next_deadline(t0 + Duration::from_secs(1)), Some(Duration::from_secs(2)));

        session.handle(SessionEvent::Tick { now: t0 + Duration::from_millis(2999) });
        assert_eq!(session.typing_handle(), Some("blue-fox"));

        session.handle(SessionEvent::Tick { now: t0 + DEFAULT_TYPING_WINDOW });
        assert_eq!(session.typing_handle(), None);
        assert_eq!(session.next_deadline(t0 + DEFAULT_TYPING_WINDOW), None);
    }

    #[test]
    fn later_typing_frame_restarts_window() {
        let t0 = Instant::now();
        let (mut session, conn) = open_session();

        session.handle(frame(conn, r#"{"type":"typing","user":"blue-fox"}"#, t0));
        let t2 = t0 + Duration::from_secs(2);
        session.handle(frame(conn, r#"{"type":"typing","user":"blue-fox"}"#, t2));

        session.handle(SessionEvent::Tick { now: t0 + Duration::from_secs(4) });
        assert_eq!(session.typing_handle(), Some("blue-fox"));

        session.handle(SessionEvent::Tick { now: t2 + DEFAULT_TYPING_WINDOW });
        assert_eq!(session.typing_handle(), None);
    }

    #[test]
    fn relayed_typing_frame_shows_the_typist() {
        let t0 = Instant::now();
        let (mut session, conn) = open_session();

        // Exactly what the server relays for a bare `{"type":"typing"}` pulse.
        session.handle(frame(conn, r#"{"type":"typing","user":"blue-fox","is_typing":false}"#, t0));
        assert_eq!(session.typing_handle(), Some("blue-fox"));

        let t1 = t0 + Duration::from_secs(1);
        session.handle(frame(conn, r#"{"type":"typing","user":"red-owl","is_typing":false}"#, t1));
        assert_eq!(session.typing_handle(), Some("red-owl"));

        session.handle(SessionEvent::Tick { now: t1 + DEFAULT_TYPING_WINDOW });
        assert_eq!(session.typing_handle(), None);
    }

    #[test]
    fn seen_marks_known_messages_only() {
        let t0 = Instant::now();
        let (mut session, conn) = open_session();

        session.handle(frame(conn, r#"{"type":"seen","message_id":"m1"}"#, t0));
        session.handle(frame(conn, &message_json("m1", "2024-05-01T10:00:00Z"), t0));
        assert!(session.message("m1").is_some_and(|m| !m.seen));

        session.handle(frame(conn, r#"{"type":"seen","message_id":"m1"}"#, t0));
        assert!(session.message("m1").is_some_and(|m| m.seen));
    }

    #[test]
    fn malformed_and_unknown_frames_leave_state_untouched() {
        let t0 = Instant::now();
        let (mut session, conn) = open_session();
        let before = session.snapshot();

        for text in ["not json", "[]", r#"{"id":"x"}"#, r#"{"type":"reaction"}"#, r#"{"type":"seen"}"#] {
            assert!(session.handle(frame(conn, text, t0)).is_empty());
        }
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn presence_and_rejections_are_recorded() {
        let t0 = Instant::now();
        let (mut session, conn) = open_session();

        session.handle(frame(conn, r#"{"type":"user_joined","user":"blue-fox"}"#, t0));
        assert_eq!(session.peer(), PeerPresence::Joined);
        session.handle(frame(conn, r#"{"type":"user_left","user":"blue-fox"}"#, t0));
        assert_eq!(session.peer(), PeerPresence::Left);

        session.handle(frame(conn, r#"{"error":"Chat room is locked"}"#, t0));
        assert_eq!(session.last_rejection(), Some("Chat room is locked"));
    }

    #[test]
    fn outbound_requires_open_connection() {
        let mut session = Session::default();
        session.open("room-1", "jwt");

        assert!(session.handle(SessionEvent::SendMessage(OutgoingMessage::text("hi"))).is_empty());
        assert!(session.handle(SessionEvent::SendTyping).is_empty());
        assert!(session.handle(SessionEvent::MarkSeen { message_id: "m1".into() }).is_empty());
    }

    #[test]
    fn outbound_frames_when_open() {
        let (mut session, _) = open_session();

        assert_eq!(session.handle(SessionEvent::SendMessage(OutgoingMessage::text("hi"))), vec![
            SessionAction::SendFrame(ClientFrame::Message {
                message_type: MessageKind::Text,
                content: "hi".into(),
                media_url: None,
            })
        ]);
        assert_eq!(session.handle(SessionEvent::SendTyping), vec![SessionAction::SendFrame(
            ClientFrame::Typing
        )]);
        assert_eq!(session.handle(SessionEvent::MarkSeen { message_id: "m1".into() }), vec![
            SessionAction::SendFrame(ClientFrame::Seen { message_id: "m1".into() })
        ]);
    }

    #[test]
    fn invalid_outbound_is_suppressed() {
        let (mut session, _) = open_session();

        assert!(session.handle(SessionEvent::SendMessage(OutgoingMessage::text("   "))).is_empty());
        let image = OutgoingMessage { kind: MessageKind::Image, content: "cap".into(), media_url: None };
        assert!(session.handle(SessionEvent::SendMessage(image)).is_empty());
        assert!(session.handle(SessionEvent::MarkSeen { message_id: " ".into() }).is_empty());
        // No optimistic append
        assert!(session.messages().is_empty());
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let t0 = Instant::now();
        let (mut session, conn) = open_session();
        session.handle(frame(conn, r#"{"type":"typing","user":"blue-fox"}"#, t0));

        assert_eq!(session.close(), vec![SessionAction::Disconnect { connection: conn }]);
        assert!(session.close().is_empty());
        assert_eq!(session.status(), SessionStatus::Closed);
        assert_eq!(session.typing_handle(), None);

        session.handle(frame(conn, &message_json("m1", "2024-05-01T10:00:00Z"), t0));
        session.handle(SessionEvent::Connected { connection: conn });
        assert!(session.messages().is_empty());
        assert_eq!(session.status(), SessionStatus::Closed);
    }

    #[test]
    fn transport_failure_closes_without_reconnect() {
        let (mut session, conn) = open_session();
        let actions =
            session.handle(SessionEvent::TransportFailed { connection: conn, reason: "reset".into() });

        assert!(actions.is_empty());
        assert_eq!(session.status(), SessionStatus::Closed);
        assert!(session.close().is_empty());
    }

    #[test]
    fn history_merges_and_upgrades_seen() {
        let t0 = Instant::now();
        let (mut session, conn) = open_session();
        session.handle(frame(conn, &message_json("m2", "2024-05-01T10:00:02Z"), t0));

        let mut seen_copy =
            ChatMessage::new("m2", "blue-fox", MessageKind::Text, "hi m2", "2024-05-01T10:00:02Z");
        seen_copy.seen = true;
        let older = ChatMessage::new("m1", "red-owl", MessageKind::Text, "hey", "2024-05-01T10:00:01Z");

        session.handle(SessionEvent::HistoryLoaded {
            room_id: "room-1".into(),
            messages: vec![seen_copy, older],
        });

        assert_eq!(ids(&session), ["m1", "m2"]);
        assert!(session.message("m2").is_some_and(|m| m.seen));
        assert_eq!(session.unseen_from("blue-fox"), vec![MessageId::from("m1")]);
    }

    #[test]
    fn history_for_other_room_is_ignored() {
        let (mut session, _) = open_session();
        let msg = ChatMessage::new("m1", "red-owl", MessageKind::Text, "hey", "2024-05-01T10:00:01Z");

        session.handle(SessionEvent::HistoryLoaded { room_id: "room-9".into(), messages: vec![msg] });
        assert!(session.messages().is_empty());
    }
}
