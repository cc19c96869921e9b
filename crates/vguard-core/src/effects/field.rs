//! Replicated field effect
//!
//! One value shared by every peer with at-least-once, eventually-consistent
//! delivery. Reads are local and may be stale. Only the coordinator writes.

use crate::errors::EffectError;
use async_trait::async_trait;
use std::sync::Arc;

/// A single replicated value of type `T`
#[async_trait]
pub trait ReplicatedFieldEffects<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// Local replica value
    async fn read_field(&self) -> Result<T, EffectError>;

    /// Update the local replica; propagation to peers happens later
    async fn write_field(&self, value: T) -> Result<(), EffectError>;

    /// Hint that pending writes should be flushed to peers
    async fn request_sync(&self) -> Result<(), EffectError>;
}

#[async_trait]
impl<T, H> ReplicatedFieldEffects<T> for Arc<H>
where
    T: Clone + Send + Sync + 'static,
    H: ReplicatedFieldEffects<T> + ?Sized,
{
    async fn read_field(&self) -> Result<T, EffectError> {
        (**self).read_field().await
    }

    async fn write_field(&self, value: T) -> Result<(), EffectError> {
        (**self).write_field(value).await
    }

    async fn request_sync(&self) -> Result<(), EffectError> {
        (**self).request_sync().await
    }
}
