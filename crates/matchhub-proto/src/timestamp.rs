//! Server-assigned message timestamps.
//!
//! `created_at` is the only ordering key for a room's timeline. The server
//! sends ISO 8601 / RFC 3339 strings, but the client must not choke on values
//! it cannot parse, so unparseable timestamps are kept verbatim and still
//! participate in a total order.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Message creation time as assigned by the server.
///
/// # Ordering
///
/// Parsed instants order chronologically regardless of the offset they were
/// written with. Opaque values order lexicographically and sort after every
/// parsed instant. The order is total, so sorting a timeline never depends on
/// arrival order except for exact ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timestamp {
    /// RFC 3339 timestamp normalized to UTC
    At(DateTime<Utc>),
    /// Value the client could not parse, kept as sent
    Opaque(String),
}

impl Timestamp {
    /// Parse a wire timestamp. Never fails; unparseable input becomes
    /// [`Timestamp::Opaque`].
    pub fn parse(raw: &str) -> Self {
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(at) => Self::At(at.with_timezone(&Utc)),
            Err(_) => Self::Opaque(raw.to_owned()),
        }
    }

    /// Parsed instant, if the server sent a valid RFC 3339 value.
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::At(at) => Some(at),
            Self::Opaque(_) => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(at) => f.write_str(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Opaque(raw) => f.write_str(raw),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}

impl From<&str> for Timestamp {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
