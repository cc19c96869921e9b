//! Network time effect
//!
//! The session shares one authoritative clock. It is used once, to stamp the
//! session creation instant.

use crate::errors::EffectError;
use crate::types::NetworkInstant;
use async_trait::async_trait;
use std::sync::Arc;

/// Authoritative session clock
#[async_trait]
pub trait NetworkTimeEffects: Send + Sync {
    /// Current instant on the shared network clock, UTC
    async fn network_instant(&self) -> Result<NetworkInstant, EffectError>;
}

#[async_trait]
impl<T: NetworkTimeEffects + ?Sized> NetworkTimeEffects for Arc<T> {
    async fn network_instant(&self) -> Result<NetworkInstant, EffectError> {
        (**self).network_instant().await
    }
}
