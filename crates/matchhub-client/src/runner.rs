//! Async session runner.
//!
//! The runner owns a [`ChatSession`] and a [`Transport`] and is the only task
//! that touches either. Callers talk to it through a cloneable
//! [`SessionHandle`]: commands go in over an `mpsc` channel, and every state
//! change comes back out as a [`SessionSnapshot`] on a `watch` channel.
//!
//! ```text
//!  SessionHandle ──commands──> SessionRunner ──frames──> Transport
//!        ↑                      │  ChatSession │ <──frames──
//!        └──────snapshots───────┘
//! ```
//!
//! One loop iteration waits for whichever comes first: a command, an inbound
//! frame (only while connected), or the session's next typing deadline.
//!
//! A handshake in progress does not block the handle. `Connecting` is
//! published before it starts, and commands keep being applied to the session
//! while it runs. A command that replaces the connection (close, another room,
//! shutdown) abandons the handshake.

use std::{collections::VecDeque, ops::Sub, time::Duration};

use matchhub_core::{
    AuthToken, ChatMessage, ChatSession, ConnectionId, Environment, MessageId, OutgoingMessage,
    RoomId, SessionAction, SessionEvent, SessionSnapshot,
};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::{ClientConfig, ConfigError},
    endpoint::chat_url,
    transport::{Transport, TransportError},
};

/// Commands buffered between a handle and its runner.
const COMMAND_CAPACITY: usize = 64;

/// The runner task has exited; the handle is no longer usable.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("session runner stopped")]
pub struct RunnerStopped;

#[derive(Debug)]
enum Command {
    Open { room_id: String, token: String },
    Close,
    SendMessage(OutgoingMessage),
    SendTyping,
    MarkSeen(MessageId),
    LoadHistory { room_id: RoomId, messages: Vec<ChatMessage> },
    Shutdown,
}

/// Cloneable handle to a running [`SessionRunner`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Open (or switch to) a room. Blank inputs are ignored by the session.
    pub async fn open(
        &self,
        room_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<(), RunnerStopped> {
        self.send(Command::Open { room_id: room_id.into(), token: token.into() }).await
    }

    /// Close the current connection.
    pub async fn close(&self) -> Result<(), RunnerStopped> {
        self.send(Command::Close).await
    }

    /// Post a message. Dropped unless connected and valid.
    pub async fn send_message(&self, message: OutgoingMessage) -> Result<(), RunnerStopped> {
        self.send(Command::SendMessage(message)).await
    }

    /// Send a typing pulse.
    pub async fn send_typing(&self) -> Result<(), RunnerStopped> {
        self.send(Command::SendTyping).await
    }

    /// Send a seen receipt.
    pub async fn mark_seen(&self, message_id: impl Into<MessageId>) -> Result<(), RunnerStopped> {
        self.send(Command::MarkSeen(message_id.into())).await
    }

    /// Merge REST history into the timeline.
    pub async fn load_history(
        &self,
        room_id: RoomId,
        messages: Vec<ChatMessage>,
    ) -> Result<(), RunnerStopped> {
        self.send(Command::LoadHistory { room_id, messages }).await
    }

    /// Close the connection and stop the runner.
    pub async fn shutdown(&self) -> Result<(), RunnerStopped> {
        self.send(Command::Shutdown).await
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    async fn send(&self, command: Command) -> Result<(), RunnerStopped> {
        self.commands.send(command).await.map_err(|_| RunnerStopped)
    }
}

/// Drives a [`ChatSession`] over a [`Transport`].
///
/// # Type Parameters
///
/// - `T`: Socket implementation
/// - `E`: Clock and timer
pub struct SessionRunner<T, E>
where
    T: Transport,
    E: Environment,
{
    session: ChatSession<E::Instant>,
    transport: T,
    env: E,
    ws_base: Url,
    connect_timeout: Duration,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    stopping: bool,
}

/// How a handshake ended.
enum Handshake {
    Finished(Result<(), TransportError>),
    /// A command replaced the connection before the handshake ended.
    Abandoned,
}

impl<T, E> SessionRunner<T, E>
where
    T: Transport + 'static,
    E: Environment,
{
    /// Create a runner and the handle that controls it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no WebSocket base URL can be derived from
    /// `config`.
    pub fn new(
        transport: T,
        env: E,
        config: &ClientConfig,
    ) -> Result<(Self, SessionHandle), ConfigError> {
        let ws_base = config.websocket_base()?;
        let session = ChatSession::new(config.session_config());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        let runner = Self {
            session,
            transport,
            env,
            ws_base,
            connect_timeout: config.connect_timeout,
            commands: command_rx,
            snapshots: snapshot_tx,
            stopping: false,
        };
        let handle = SessionHandle { commands: command_tx, snapshots: snapshot_rx };
        Ok((runner, handle))
    }

    /// Run on a new tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until [`SessionHandle::shutdown`] or until every handle is dropped.
    pub async fn run(mut self) {
        while !self.stopping {
            let deadline = self.session.next_deadline(self.env.now());
            let connected = self.transport.is_connected();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                inbound = self.transport.recv(), if connected => {
                    self.handle_inbound(inbound).await;
                },
                () = self.env.sleep(deadline.unwrap_or_default()), if deadline.is_some() => {
                    let now = self.env.now();
                    self.apply(SessionEvent::Tick { now }).await;
                },
            }
        }

        let actions = self.session.close();
        self.execute(actions).await;
        info!("session runner stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        let actions = apply_command(&mut self.session, command);
        self.execute(actions).await;
    }

    async fn handle_inbound(&mut self, inbound: Option<Result<String, TransportError>>) {
        let connection = self.session.connection();
        let event = match inbound {
            Some(Ok(text)) => SessionEvent::FrameReceived { connection, text, now: self.env.now() },
            Some(Err(error)) => {
                self.transport.close().await;
                SessionEvent::TransportFailed { connection, reason: error.to_string() }
            },
            None => SessionEvent::TransportClosed { connection, reason: "closed by peer".into() },
        };
        self.apply(event).await;
    }

    async fn apply(&mut self, event: SessionEvent<E::Instant>) {
        let actions = self.session.handle(event);
        self.execute(actions).await;
    }

    /// Execute actions until the session stops producing new ones, then
    /// publish the resulting state.
    async fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                SessionAction::Connect { connection, room_id, token } => {
                    publish(&self.session, &self.snapshots);
                    let event = match self.connect(connection, &room_id, &token, &mut queue).await {
                        Handshake::Finished(Ok(())) => SessionEvent::Connected { connection },
                        Handshake::Finished(Err(error)) => {
                            warn!(room = %room_id, %error, "chat connect failed");
                            SessionEvent::TransportFailed { connection, reason: error.to_string() }
                        },
                        Handshake::Abandoned => {
                            debug!(%connection, "handshake abandoned");
                            self.transport.close().await;
                            continue;
                        },
                    };
                    queue.extend(self.session.handle(event));
                },
                SessionAction::SendFrame(frame) => {
                    let text = match frame.encode() {
                        Ok(text) => text,
                        Err(error) => {
                            warn!(%error, kind = frame.kind(), "dropping unencodable frame");
                            continue;
                        },
                    };
                    if let Err(error) = self.transport.send(text).await {
                        self.transport.close().await;
                        let connection = self.session.connection();
                        queue.extend(self.session.handle(SessionEvent::TransportFailed {
                            connection,
                            reason: error.to_string(),
                        }));
                    }
                },
                SessionAction::Disconnect { connection } => {
                    debug!(%connection, "closing transport");
                    self.transport.close().await;
                },
            }
        }

        publish(&self.session, &self.snapshots);
    }

    /// Run the handshake for `connection` while still serving commands.
    ///
    /// Actions produced by commands in the meantime are appended to `queue`.
    async fn connect(
        &mut self,
        connection: ConnectionId,
        room_id: &RoomId,
        token: &AuthToken,
        queue: &mut VecDeque<SessionAction>,
    ) -> Handshake {
        let url = match chat_url(&self.ws_base, room_id, token) {
            Ok(url) => url,
            Err(e) => return Handshake::Finished(Err(TransportError::Connection(e.to_string()))),
        };
        let limit = self.connect_timeout;

        let outcome = {
            let handshake = tokio::time::timeout(limit, self.transport.connect(&url));
            tokio::pin!(handshake);

            loop {
                tokio::select! {
                    result = &mut handshake => {
                        break result.map_err(|_| TransportError::Timeout(limit));
                    },
                    command = self.commands.recv() => {
                        let Some(command) = command.filter(|c| !matches!(c, Command::Shutdown))
                        else {
                            self.stopping = true;
                            return Handshake::Abandoned;
                        };
                        queue.extend(apply_command(&mut self.session, command));
                        if self.session.connection() != connection {
                            return Handshake::Abandoned;
                        }
                        publish(&self.session, &self.snapshots);
                    },
                }
            }
        };

        match outcome {
            Ok(result) => Handshake::Finished(result),
            Err(timeout) => {
                self.transport.close().await;
                Handshake::Finished(Err(timeout))
            },
        }
    }
}

fn apply_command<I>(session: &mut ChatSession<I>, command: Command) -> Vec<SessionAction>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    match command {
        Command::Open { room_id, token } => session.open(&room_id, &token),
        Command::Close => session.close(),
        Command::SendMessage(message) => session.handle(SessionEvent::SendMessage(message)),
        Command::SendTyping => session.handle(SessionEvent::SendTyping),
        Command::MarkSeen(message_id) => session.handle(SessionEvent::MarkSeen { message_id }),
        Command::LoadHistory { room_id, messages } => {
            session.handle(SessionEvent::HistoryLoaded { room_id, messages })
        },
        Command::Shutdown => Vec::new(),
    }
}

fn publish<I>(session: &ChatSession<I>, snapshots: &watch::Sender<SessionSnapshot>)
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    let snapshot = session.snapshot();
    snapshots.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    });
}
