//! Ordered, deduplicated message list for one room.

use std::collections::HashSet;

use matchhub_proto::{ChatMessage, MessageId};

/// Result of [`MessageTimeline::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The message was new and now sits at `index`.
    Inserted {
        /// Position in the timeline after insertion
        index: usize,
    },
    /// A message with the same id was already present. Nothing changed.
    Duplicate,
}

/// Messages of one room, unique by id and ordered by `created_at`.
///
/// # Invariants
///
/// - No two entries share an id.
/// - Entries are non-decreasing by `created_at`; equal timestamps keep the
///   order in which they arrived.
#[derive(Debug, Clone, Default)]
pub struct MessageTimeline {
    messages: Vec<ChatMessage>,
    ids: HashSet<MessageId>,
}

impl MessageTimeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message at its chronological position.
    ///
    /// A message whose id is already present is dropped, including its `seen`
    /// flag. Use [`mark_seen`](Self::mark_seen) to carry seen state over.
    pub fn insert(&mut self, message: ChatMessage) -> InsertOutcome {
        if self.ids.contains(&message.id) {
            return InsertOutcome::Duplicate;
        }

        // Upper bound: after every entry with created_at <= the new one.
        let index = self.messages.partition_point(|m| m.created_at <= message.created_at);
        self.ids.insert(message.id.clone());
        self.messages.insert(index, message);
        InsertOutcome::Inserted { index }
    }

    /// Insert every message in order. Returns how many were new.
    pub fn merge(&mut self, messages: impl IntoIterator<Item = ChatMessage>) -> usize {
        messages
            .into_iter()
            .filter(|m| matches!(self.insert(m.clone()), InsertOutcome::Inserted { .. }))
            .count()
    }

    /// Mark a message seen.
    ///
    /// Returns `true` only when the flag flipped. Unknown ids and messages
    /// already seen return `false`.
    pub fn mark_seen(&mut self, id: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id.as_str() == id) {
            Some(message) if !message.seen => {
                message.seen = true;
                true
            },
            _ => false,
        }
    }

    /// Look up a message by id.
    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        if !self.ids.contains(id) {
            return None;
        }
        self.messages.iter().find(|m| m.id.as_str() == id)
    }

    /// Whether a message with this id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Messages in timeline order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    /// Messages in timeline order, as a slice.
    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the timeline holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Remove every message.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.ids.clear();
    }
}

impl<'a> IntoIterator for &'a MessageTimeline {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
