//! Error types for guard operations
//!
//! `EffectError` is what injected handlers report. `GuardError` is the single
//! error type the protocol works with internally; public handlers log it and
//! never hand it back to the environment.

use crate::payload::PayloadError;
use crate::types::PeerId;
use serde::{Deserialize, Serialize};

/// Failure reported by an injected effect handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EffectError {
    /// The capability is not reachable right now
    #[error("Effect unavailable: {reason}")]
    Unavailable {
        /// Why the handler could not serve the call
        reason: String,
    },

    /// The handler refused the operation
    #[error("Effect rejected: {reason}")]
    Rejected {
        /// Why the handler refused
        reason: String,
    },

    /// A replicated write was attempted by a peer that is not coordinator
    #[error("{peer} is not the coordinator")]
    NotCoordinator {
        /// Peer that attempted the write
        peer: PeerId,
    },

    /// The peer is no longer part of the session
    #[error("{peer} is not present in the session")]
    PeerAbsent {
        /// Departed peer
        peer: PeerId,
    },
}

impl EffectError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a rejected error
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Unified error type for guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// An injected handler failed
    #[error("Effect error: {0}")]
    Effect(#[from] EffectError),

    /// The fetched metadata could not be interpreted
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// A fetch completed before the epoch marker was initialized
    #[error("Epoch marker is not initialized")]
    NotInitialized,
}

/// Standard result type for guard operations
pub type Result<T> = std::result::Result<T, GuardError>;
