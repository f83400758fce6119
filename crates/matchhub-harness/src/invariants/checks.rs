//! Standard invariant checks.

use std::collections::HashSet;

use super::{Invariant, InvariantResult, Observation, Violation};
use matchhub_core::SessionStatus;

/// The timeline is sorted by `created_at`.
pub struct TimelineOrdered;

impl Invariant for TimelineOrdered {
    fn name(&self) -> &'static str {
        "timeline_ordered"
    }

    fn check(&self, observation: &Observation) -> InvariantResult {
        for pair in observation.after.messages.windows(2) {
            if pair[1].created_at < pair[0].created_at {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{} ({}) is after {} ({})",
                        pair[1].id, pair[1].created_at, pair[0].id, pair[0].created_at
                    ),
                });
            }
        }
        Ok(())
    }
}

/// No message id appears twice in the timeline.
pub struct UniqueMessageIds;

impl Invariant for UniqueMessageIds {
    fn name(&self) -> &'static str {
        "unique_message_ids"
    }

    fn check(&self, observation: &Observation) -> InvariantResult {
        let mut seen = HashSet::new();
        for message in &observation.after.messages {
            if !seen.insert(message.id.as_str()) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("duplicate id {}", message.id),
                });
            }
        }
        Ok(())
    }
}

/// A message marked seen stays seen while it is in the timeline.
pub struct SeenMonotonic;

impl Invariant for SeenMonotonic {
    fn name(&self) -> &'static str {
        "seen_monotonic"
    }

    fn check(&self, observation: &Observation) -> InvariantResult {
        // A room switch replaces the timeline.
        if observation.before.room_id != observation.after.room_id {
            return Ok(());
        }

        for message in observation.before.messages.iter().filter(|m| m.seen) {
            if let Some(after) = observation.message_after(message.id.as_str()) {
                if !after.seen {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("{} went from seen to unseen", message.id),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Outbound frames are only produced while the connection is open.
pub struct OutboundOnlyWhenOpen;

impl Invariant for OutboundOnlyWhenOpen {
    fn name(&self) -> &'static str {
        "outbound_only_when_open"
    }

    fn check(&self, observation: &Observation) -> InvariantResult {
        let sent = observation.frames_sent();
        if sent > 0 && observation.before.status != SessionStatus::Open {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{sent} frame(s) sent while {:?}", observation.before.status),
            });
        }
        Ok(())
    }
}

/// A typing indicator is only shown on an active session, and never after its
/// window ran out.
pub struct TypingWindowRespected;

impl Invariant for TypingWindowRespected {
    fn name(&self) -> &'static str {
        "typing_window_respected"
    }

    fn check(&self, observation: &Observation) -> InvariantResult {
        let Some(handle) = &observation.after.typing else {
            return Ok(());
        };

        if observation.after.status == SessionStatus::Closed {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{handle} shown as typing on a closed session"),
            });
        }

        match observation.typing_remaining {
            Some(remaining) if remaining.is_zero() => Err(Violation {
                invariant: self.name(),
                message: format!("{handle} still typing after the window elapsed"),
            }),
            _ => Ok(()),
        }
    }
}
