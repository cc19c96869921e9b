//! Identifiers, instants and the events exchanged between peers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a peer connected to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(u32);

impl PeerId {
    /// Create a peer identifier from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw identifier value
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

impl From<u32> for PeerId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Absolute instant on the shared network clock, in milliseconds since the
/// Unix epoch (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkInstant(i64);

impl NetworkInstant {
    /// Create an instant from Unix milliseconds
    pub const fn from_unix_ms(unix_ms: i64) -> Self {
        Self(unix_ms)
    }

    /// Unix milliseconds of this instant
    pub const fn as_unix_ms(self) -> i64 {
        self.0
    }

    /// Convert to a chrono UTC date-time, if representable
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
    }
}

impl From<DateTime<Utc>> for NetworkInstant {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_millis())
    }
}

impl fmt::Display for NetworkInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(
                f,
                "{} ({})",
                dt.to_rfc3339_opts(SecondsFormat::Millis, true),
                self.0
            ),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Object and method invoked on every peer once a mismatch is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotifyTarget {
    /// Name of the receiving object
    pub object: String,
    /// Method invoked on the receiving object
    pub method: String,
}

impl NotifyTarget {
    /// Create a notify target
    pub fn new(object: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for NotifyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.object, self.method)
    }
}

/// Failure reported by the fetch service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("fetch failed with code {code}: {message}")]
pub struct FetchFailure {
    /// Transport or HTTP status code
    pub code: i32,
    /// Human readable failure description
    pub message: String,
}

impl FetchFailure {
    /// Create a fetch failure
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Signals fanned out to every peer through the broadcast bus.
///
/// Delivery is at-least-once and unordered; both signals are idempotent on
/// the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardSignal {
    /// Any peer able to reach the remote source should fetch it
    AttemptFetch,
    /// Invoke the notify target: the remote source changed
    NotifyAll,
}

impl GuardSignal {
    /// Method name the signal is addressed to on the receiving guard
    pub fn method_name(self) -> &'static str {
        match self {
            GuardSignal::AttemptFetch => "attempt_fetch",
            GuardSignal::NotifyAll => "notify_all",
        }
    }
}

/// Every event the environment delivers to a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    /// A peer (possibly the local one) joined the session
    PeerJoined(PeerId),
    /// A fetch previously issued by this peer completed
    FetchCompleted(std::result::Result<String, FetchFailure>),
    /// A broadcast signal arrived
    Signal(GuardSignal),
}
