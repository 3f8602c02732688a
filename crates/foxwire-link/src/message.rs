use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Monotonically increasing per-controller message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which way a message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outbound,
    Inbound,
}

/// Why a received frame could not be rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptKind {
    /// Encrypted flag set but the authentication tag failed: wrong key or
    /// damaged ciphertext.
    Undecryptable,
    /// Encrypted flag set but no key is configured on this station.
    NoKey,
    /// The payload is not valid UTF-8.
    InvalidUtf8,
}

/// Message content: decoded text, or a flagged corruption marker.
///
/// Corrupt frames are delivered, not dropped — the operator sees
/// "undecryptable message received" rather than nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBody {
    Text(String),
    Corrupt(CorruptKind),
}

/// One transmitted or received message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub direction: Direction,
    /// Seconds since the Unix epoch at creation.
    pub timestamp: u64,
    /// Whether the payload travelled encrypted on the wire.
    pub encrypted: bool,
    pub body: MessageBody,
}

impl Message {
    /// The text content, if the body decoded cleanly.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text(text) => Some(text),
            MessageBody::Corrupt(_) => None,
        }
    }

    /// Whether this message arrived damaged.
    pub fn is_corrupt(&self) -> bool {
        matches!(self.body, MessageBody::Corrupt(_))
    }
}

pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
