//! Broadcast effect
//!
//! Fan-out to every peer currently in the session, the sender included.
//! Delivery is at-least-once and unordered across senders.

use crate::errors::EffectError;
use crate::types::GuardSignal;
use async_trait::async_trait;
use std::sync::Arc;

/// Fire a signal to all peers
#[async_trait]
pub trait BroadcastEffects: Send + Sync {
    /// Enqueue `signal` for delivery to every present peer
    async fn broadcast(&self, signal: GuardSignal) -> Result<(), EffectError>;
}

#[async_trait]
impl<T: BroadcastEffects + ?Sized> BroadcastEffects for Arc<T> {
    async fn broadcast(&self, signal: GuardSignal) -> Result<(), EffectError> {
        (**self).broadcast(signal).await
    }
}
