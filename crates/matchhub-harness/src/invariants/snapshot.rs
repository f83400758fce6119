//! Observed session steps.

use std::time::Duration;

use matchhub_core::{ChatMessage, SessionAction, SessionSnapshot};

/// One step of a session: state before, state after, and the actions the step
/// produced.
#[derive(Debug, Clone)]
pub struct Observation {
    /// State before the step.
    pub before: SessionSnapshot,
    /// State after the step.
    pub after: SessionSnapshot,
    /// Actions returned by the step.
    pub actions: Vec<SessionAction>,
    /// Typing window left after the step, from `next_deadline`. `None` when
    /// the driver did not report it.
    pub typing_remaining: Option<Duration>,
}

impl Observation {
    /// Capture a step.
    pub fn new(before: SessionSnapshot, after: SessionSnapshot, actions: Vec<SessionAction>) -> Self {
        Self { before, after, actions, typing_remaining: None }
    }

    /// Record the typing window left after the step.
    #[must_use]
    pub fn with_typing_remaining(mut self, remaining: Option<Duration>) -> Self {
        self.typing_remaining = remaining;
        self
    }

    /// Message with `id` in the post-step timeline.
    pub fn message_after(&self, id: &str) -> Option<&ChatMessage> {
        self.after.messages.iter().find(|m| m.id.as_str() == id)
    }

    /// Number of `SendFrame` actions.
    pub fn frames_sent(&self) -> usize {
        self.actions.iter().filter(|a| matches!(a, SessionAction::SendFrame(_))).count()
    }
}
