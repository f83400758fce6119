//! Plain-text rendering of API models and chat state.

use matchhub_client::models::{Candidate, ChatRoom, Match, User};
use matchhub_core::{ChatMessage, MessageKind, PeerPresence, Timestamp};

/// `HH:MM` for parsed timestamps, the raw value otherwise.
pub fn clock(at: &Timestamp) -> String {
    match at.as_datetime() {
        Some(at) => at.format("%H:%M").to_string(),
        None => at.to_string(),
    }
}

/// One chat line: `[10:04] Blue Fox: hey`.
///
/// Own messages are marked once the other participant has seen them.
pub fn message_line(message: &ChatMessage, own_handle: &str) -> String {
    let sender = if message.sender_handle.is_empty() { "?" } else { &message.sender_handle };
    let mut line = format!("[{}] {sender}: ", clock(&message.created_at));

    if message.kind != MessageKind::Text {
        line.push_str(&format!("[{}] ", message.kind));
    }
    if let Some(url) = &message.media_url {
        line.push_str(url);
        if !message.content.is_empty() {
            line.push(' ');
        }
    }
    line.push_str(&message.content);

    if message.seen && message.sender_handle == own_handle {
        line.push_str(" (seen)");
    }
    line
}

/// One room in the room list.
pub fn room_line(room: &ChatRoom, own_handle: &str) -> String {
    let mut line = format!("{}  {}", room.id, room.peer_handle(own_handle));
    if room.is_locked {
        line.push_str("  locked");
    }
    match room.days_remaining {
        Some(1) => line.push_str("  1 day left"),
        Some(days) if days > 1 => line.push_str(&format!("  {days} days left")),
        Some(_) => line.push_str("  expired"),
        None => {},
    }
    line
}

/// One candidate in the discover feed.
pub fn candidate_line(candidate: &Candidate) -> String {
    let mut details = Vec::new();
    if let Some(age) = candidate.age {
        details.push(age.to_string());
    }
    details.extend(
        [&candidate.gender, &candidate.city, &candidate.degree, &candidate.profession]
            .into_iter()
            .flatten()
            .cloned(),
    );

    let mut line = format!("{}  {}", candidate.user_uuid, candidate.anonymous_handle);
    if !details.is_empty() {
        line.push_str(&format!("  {}", details.join(", ")));
    }
    if !candidate.interests.is_empty() {
        line.push_str(&format!("  [{}]", candidate.interests.join(", ")));
    }
    line
}

/// Profile as `key: value` lines; unset fields are skipped.
pub fn profile_lines(user: &User) -> Vec<String> {
    let mut lines = vec![
        format!("handle: {}", user.anonymous_handle),
        format!("id: {}", user.user_uuid),
    ];
    let optional = [
        ("email", user.email.clone()),
        ("gender", user.gender.clone()),
        ("age", user.age.map(|a| a.to_string())),
        ("height", user.height_cm.map(|h| format!("{h} cm"))),
        ("degree", user.degree.clone()),
        ("profession", user.profession.clone()),
        ("city", user.city.clone()),
        ("state", user.state.clone()),
        ("bio", user.bio.clone()),
    ];
    lines.extend(optional.into_iter().filter_map(|(key, value)| Some(format!("{key}: {}", value?))));
    if !user.interests.is_empty() {
        lines.push(format!("interests: {}", user.interests.join(", ")));
    }
    lines.push(format!("tokens: {}", user.tokens_balance));
    lines.push(format!("verified: {}", if user.is_verified { "yes" } else { "no" }));
    lines
}

/// Confirmation for a created match.
pub fn match_line(created: &Match) -> String {
    format!(
        "match {} ({}): {} + {}",
        created.id,
        created.mode.as_str(),
        created.user_a_handle,
        created.user_b_handle
    )
}

/// Status line for a presence change.
pub fn presence_line(peer: PeerPresence) -> Option<&'static str> {
    match peer {
        PeerPresence::Unknown => None,
        PeerPresence::Joined => Some("-- the other side is here"),
        PeerPresence::Left => Some("-- the other side left"),
    }
}
