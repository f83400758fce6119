//! Interactive chat over a live session.
//!
//! Input lines are parsed into [`ChatInput`]; session snapshots are diffed by
//! [`ChatView`] into the lines to print and the seen receipts to send. The
//! async loop in [`run`] only moves data between stdin, the runner, and `out`.

use std::{collections::HashSet, io::Write};

use matchhub_client::{SessionRunner, SystemEnv, WsTransport};
use matchhub_core::{
    ChatMessage, MessageId, MessageKind, OutgoingMessage, PeerPresence, RoomId, SessionSnapshot,
    SessionStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::{
    context::Context,
    error::CliError,
    render::{message_line, presence_line},
};

const HELP: &str = "/image URL [caption]  /voice URL  /sticker URL  /gift NAME  /typing  /quit";

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Send a message
    Send(OutgoingMessage),
    /// Send a typing pulse
    Typing,
    /// Leave the chat
    Quit,
    /// Nothing to do
    Empty,
    /// Print a hint
    Usage(&'static str),
}

/// Parse one input line. Lines starting with `/` are commands.
pub fn parse_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }

    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Send(OutgoingMessage::text(line));
    };

    let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    let rest = rest.trim();
    let (first, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));

    match name {
        "quit" | "q" => ChatInput::Quit,
        "typing" => ChatInput::Typing,
        "image" if !first.is_empty() => {
            ChatInput::Send(OutgoingMessage::media(MessageKind::Image, first, tail.trim()))
        },
        "voice" if !first.is_empty() => {
            ChatInput::Send(OutgoingMessage::media(MessageKind::Voice, first, ""))
        },
        "sticker" if !first.is_empty() => {
            ChatInput::Send(OutgoingMessage::media(MessageKind::Sticker, first, ""))
        },
        "gift" if !rest.is_empty() => ChatInput::Send(OutgoingMessage {
            kind: MessageKind::Gift,
            content: rest.to_owned(),
            media_url: None,
        }),
        "image" => ChatInput::Usage("usage: /image URL [caption]"),
        "voice" => ChatInput::Usage("usage: /voice URL"),
        "sticker" => ChatInput::Usage("usage: /sticker URL"),
        "gift" => ChatInput::Usage("usage: /gift NAME"),
        _ => ChatInput::Usage(HELP),
    }
}

/// What has already been shown for one room.
#[derive(Debug, Default)]
pub struct ChatView {
    own_handle: String,
    printed: HashSet<MessageId>,
    seen_requested: HashSet<MessageId>,
    status: SessionStatus,
    typing: Option<String>,
    peer: PeerPresence,
    rejection: Option<String>,
}

/// Result of diffing one snapshot.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ViewUpdate {
    /// Lines to print, in order
    pub lines: Vec<String>,
    /// Messages to acknowledge
    pub mark_seen: Vec<MessageId>,
}

impl ChatView {
    /// Empty view for the user `own_handle`.
    pub fn new(own_handle: impl Into<String>) -> Self {
        Self { own_handle: own_handle.into(), ..Self::default() }
    }

    /// Diff `snapshot` against what was shown before.
    pub fn update(&mut self, snapshot: &SessionSnapshot) -> ViewUpdate {
        let mut update = ViewUpdate::default();

        if snapshot.status != self.status {
            self.status = snapshot.status;
            update.lines.push(format!("-- {}", status_label(snapshot.status)));
        }

        for message in &snapshot.messages {
            if self.printed.insert(message.id.clone()) {
                update.lines.push(message_line(message, &self.own_handle));
            }
            if self.wants_receipt(snapshot.status, message) {
                self.seen_requested.insert(message.id.clone());
                update.mark_seen.push(message.id.clone());
            }
        }

        if snapshot.typing != self.typing {
            self.typing.clone_from(&snapshot.typing);
            if let Some(handle) = &snapshot.typing {
                update.lines.push(format!("-- {handle} is typing..."));
            }
        }

        if snapshot.peer != self.peer {
            self.peer = snapshot.peer;
            update.lines.extend(presence_line(snapshot.peer).map(str::to_owned));
        }

        if snapshot.last_rejection != self.rejection {
            self.rejection.clone_from(&snapshot.last_rejection);
            if let Some(reason) = &snapshot.last_rejection {
                update.lines.push(format!("-- not sent: {reason}"));
            }
        }

        update
    }

    fn wants_receipt(&self, status: SessionStatus, message: &ChatMessage) -> bool {
        status == SessionStatus::Open
            && !message.seen
            && message.sender_handle != self.own_handle
            && !self.seen_requested.contains(&message.id)
    }
}

fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Closed => "disconnected",
        SessionStatus::Connecting => "connecting...",
        SessionStatus::Open => "connected",
    }
}

/// Chat in `room` until `/quit` or end of input.
pub async fn run(ctx: &Context, room: RoomId, out: &mut impl Write) -> Result<(), CliError> {
    let api = &ctx.api;
    let room_ref = &room;
    let user = ctx.authed(|token| async move { api.profile(&token).await }).await?;
    let history =
        ctx.authed(|token| async move { api.room_messages(&token, room_ref).await }).await?;
    // Refreshed by `authed` if it was stale.
    let tokens = ctx.tokens().await?;

    let (runner, handle) = SessionRunner::new(WsTransport::new(), SystemEnv::new(), &ctx.config)?;
    let task = runner.spawn();
    info!(room = %room, "chat started");

    handle.open(room.as_str(), tokens.access).await?;
    handle.load_history(room.clone(), history).await?;
    writeln!(out, "Chatting in {room} as {}. {HELP}", user.anonymous_handle)?;

    let mut view = ChatView::new(user.anonymous_handle);
    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    debug!("runner dropped its snapshot channel");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let update = view.update(&snapshot);
                for line in &update.lines {
                    writeln!(out, "{line}")?;
                }
                out.flush()?;
                for id in update.mark_seen {
                    handle.mark_seen(id).await?;
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    ChatInput::Send(message) => match message.validate() {
                        Ok(()) => handle.send_message(message).await?,
                        Err(error) => writeln!(out, "-- {error}")?,
                    },
                    ChatInput::Typing => handle.send_typing().await?,
                    ChatInput::Usage(hint) => writeln!(out, "{hint}")?,
                    ChatInput::Empty => {},
                    ChatInput::Quit => break,
                }
            }
        }
    }

    handle.shutdown().await?;
    if let Err(error) = task.await {
        debug!(%error, "runner task ended abnormally");
    }
    Ok(())
}
