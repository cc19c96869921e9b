//! Epoch marker state and pure transitions
//!
//! The marker is the only replicated field of a guard session. It moves
//! through three states and never goes back:
//!
//! ```text
//! Uninitialized --initialize--> Recorded(t) --flag_mismatch--> Mismatch
//! ```
//!
//! ## Design Principles
//! 1. Pure functions: `fn(marker, params) -> TransitionResult`
//! 2. No side effects: replication and broadcast happen in the calling layer
//! 3. Forward only: a transition is enabled only if it raises the marker
//!
//! `merge` makes the marker a join-semilattice so replicas that receive
//! writes out of order still converge on the same value.

use crate::types::NetworkInstant;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Legacy sentinel for an uninitialized marker.
pub const LEGACY_UNINITIALIZED: i64 = -1;
/// Legacy sentinel for a detected mismatch.
pub const LEGACY_MISMATCH: i64 = -2;

/// .NET ticks (100 ns since 0001-01-01) at the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
/// Ticks of the last instant a .NET `DateTime` can hold (9999-12-31).
pub const MAX_LEGACY_TICKS: i64 = 3_155_378_975_999_999_999;
const TICKS_PER_MILLISECOND: i64 = 10_000;

/// Replicated epoch marker of a guard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EpochMarker {
    /// Nobody has recorded the session creation instant yet
    #[default]
    Uninitialized,
    /// Session creation instant on the network clock
    Recorded(NetworkInstant),
    /// The remote source changed after the session started. Terminal.
    Mismatch,
}

impl EpochMarker {
    /// Position in the forward-only state order
    pub fn rank(self) -> u8 {
        match self {
            EpochMarker::Uninitialized => 0,
            EpochMarker::Recorded(_) => 1,
            EpochMarker::Mismatch => 2,
        }
    }

    /// Whether the marker is still uninitialized
    pub fn is_uninitialized(self) -> bool {
        matches!(self, EpochMarker::Uninitialized)
    }

    /// Whether a mismatch has been detected
    pub fn is_mismatch(self) -> bool {
        matches!(self, EpochMarker::Mismatch)
    }

    /// Recorded session creation instant, if any
    pub fn recorded_at(self) -> Option<NetworkInstant> {
        match self {
            EpochMarker::Recorded(instant) => Some(instant),
            _ => None,
        }
    }

    /// Whether replacing `self` with `next` keeps the marker monotonic.
    ///
    /// Rewriting the same value is allowed; replacing one recorded instant
    /// with another is not.
    pub fn can_transition_to(self, next: EpochMarker) -> bool {
        self == next || next.rank() > self.rank()
    }

    /// Join two replica values.
    ///
    /// Higher rank wins. Two recorded instants join to the earlier one, the
    /// first creation instant any coordinator wrote.
    pub fn merge(self, other: EpochMarker) -> EpochMarker {
        match (self, other) {
            (EpochMarker::Recorded(a), EpochMarker::Recorded(b)) => {
                EpochMarker::Recorded(a.min(b))
            }
            (a, b) if b.rank() > a.rank() => b,
            (a, _) => a,
        }
    }

    /// Encode as .NET `DateTime` ticks with the `-1` / `-2` sentinels older
    /// peers replicate.
    ///
    /// Returns `None` for instants outside the .NET `DateTime` range.
    pub fn to_legacy_ticks(self) -> Option<i64> {
        match self {
            EpochMarker::Uninitialized => Some(LEGACY_UNINITIALIZED),
            EpochMarker::Mismatch => Some(LEGACY_MISMATCH),
            EpochMarker::Recorded(instant) => instant
                .as_unix_ms()
                .checked_mul(TICKS_PER_MILLISECOND)
                .and_then(|ticks| ticks.checked_add(UNIX_EPOCH_TICKS))
                .filter(|ticks| (0..=MAX_LEGACY_TICKS).contains(ticks)),
        }
    }

    /// Decode the legacy tick encoding.
    ///
    /// Sub-millisecond ticks are truncated toward the past. Returns `None`
    /// for negative values other than the two sentinels and for values past
    /// the .NET `DateTime` range.
    pub fn from_legacy_ticks(ticks: i64) -> Option<Self> {
        match ticks {
            LEGACY_UNINITIALIZED => Some(EpochMarker::Uninitialized),
            LEGACY_MISMATCH => Some(EpochMarker::Mismatch),
            t if (0..=MAX_LEGACY_TICKS).contains(&t) => {
                let unix_ms = (t - UNIX_EPOCH_TICKS).div_euclid(TICKS_PER_MILLISECOND);
                Some(EpochMarker::Recorded(NetworkInstant::from_unix_ms(unix_ms)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for EpochMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpochMarker::Uninitialized => write!(f, "uninitialized"),
            EpochMarker::Recorded(instant) => write!(f, "recorded at {instant}"),
            EpochMarker::Mismatch => write!(f, "mismatch"),
        }
    }
}

/// Result of a marker transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition enabled, new marker produced
    Ok(EpochMarker),
    /// Transition was not enabled (precondition failed)
    NotEnabled(String),
}

impl TransitionResult {
    /// Check if transition succeeded
    pub fn is_ok(&self) -> bool {
        matches!(self, TransitionResult::Ok(_))
    }

    /// Get the new marker if transition succeeded
    pub fn marker(self) -> Option<EpochMarker> {
        match self {
            TransitionResult::Ok(marker) => Some(marker),
            TransitionResult::NotEnabled(_) => None,
        }
    }
}

/// Record the session creation instant.
///
/// Enabled only from `Uninitialized`.
pub fn initialize(current: EpochMarker, now: NetworkInstant) -> TransitionResult {
    match current {
        EpochMarker::Uninitialized => TransitionResult::Ok(EpochMarker::Recorded(now)),
        other => TransitionResult::NotEnabled(format!("marker already {other}")),
    }
}

/// Flag the terminal mismatch state.
///
/// Enabled only from `Recorded`.
pub fn flag_mismatch(current: EpochMarker) -> TransitionResult {
    match current {
        EpochMarker::Recorded(_) => TransitionResult::Ok(EpochMarker::Mismatch),
        other => TransitionResult::NotEnabled(format!("cannot flag mismatch from {other}")),
    }
}

/// Outcome of comparing the marker with the remote last-modified instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteComparison {
    /// The marker was never initialized; nothing to compare against
    NotInitialized,
    /// Remote source changed after the session started
    Newer {
        /// Recorded session creation instant
        recorded: NetworkInstant,
        /// Remote last-modified instant
        remote: NetworkInstant,
    },
    /// Remote source is not newer than the session (equality included)
    NotNewer,
    /// Mismatch already detected
    AlreadyMismatched,
}

/// Compare the marker with a remote last-modified instant.
///
/// Strictly-later remote instants are a mismatch; equal instants are not.
pub fn compare_remote(current: EpochMarker, remote: NetworkInstant) -> RemoteComparison {
    match current {
        EpochMarker::Uninitialized => RemoteComparison::NotInitialized,
        EpochMarker::Mismatch => RemoteComparison::AlreadyMismatched,
        EpochMarker::Recorded(recorded) if recorded < remote => {
            RemoteComparison::Newer { recorded, remote }
        }
        EpochMarker::Recorded(_) => RemoteComparison::NotNewer,
    }
}
