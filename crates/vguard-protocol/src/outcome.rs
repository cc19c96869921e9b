//! What a handler did, reported back to the host for logging and tests.

use vguard_core::NetworkInstant;

/// Action taken by the join handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinAction {
    /// Local peer is not coordinator; nothing to do
    NotCoordinator,
    /// Session creation instant recorded and replicated
    Initialized(NetworkInstant),
    /// Mismatch was already known; re-announced to every peer
    AnnouncedMismatch,
    /// Fetch dispatched from this peer
    FetchIssued,
    /// Local fetch unavailable; fetch requested from every peer
    DelegatedFetch,
    /// An effect failed; the join was dropped
    Aborted,
}

/// Result of handling a successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchVerdict {
    /// Remote source is newer; mismatch flagged and announced
    Mismatch,
    /// Remote source is not newer than the session
    Unchanged,
    /// Mismatch had already been flagged
    AlreadyMismatched,
    /// Marker was still uninitialized when the fetch completed
    NotInitialized,
    /// Metadata body could not be interpreted
    Rejected,
    /// An effect failed; the result was dropped
    Aborted,
}

impl FetchVerdict {
    /// Whether this fetch flagged the mismatch
    pub fn flagged_mismatch(self) -> bool {
        matches!(self, FetchVerdict::Mismatch)
    }
}
