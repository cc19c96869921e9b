//! Ownership directory effect
//!
//! The directory elects a single coordinator for the session object. The
//! guard only reads it and asks for coordination to move to the local peer.

use crate::errors::EffectError;
use crate::types::PeerId;
use async_trait::async_trait;
use std::sync::Arc;

/// Coordinator lookup and transfer for the guarded session object
#[async_trait]
pub trait OwnershipEffects: Send + Sync {
    /// Identity of the peer this handler serves
    fn local_peer(&self) -> PeerId;

    /// Current coordinator of the session object
    async fn coordinator(&self) -> Result<PeerId, EffectError>;

    /// Ask for coordination to move to `peer`.
    ///
    /// Returns once the transfer is effective for the requesting peer.
    async fn request_ownership(&self, peer: PeerId) -> Result<(), EffectError>;

    /// Whether the local peer is the coordinator
    async fn is_local_coordinator(&self) -> Result<bool, EffectError> {
        Ok(self.coordinator().await? == self.local_peer())
    }
}

#[async_trait]
impl<T: OwnershipEffects + ?Sized> OwnershipEffects for Arc<T> {
    fn local_peer(&self) -> PeerId {
        (**self).local_peer()
    }

    async fn coordinator(&self) -> Result<PeerId, EffectError> {
        (**self).coordinator().await
    }

    async fn request_ownership(&self, peer: PeerId) -> Result<(), EffectError> {
        (**self).request_ownership(peer).await
    }
}
