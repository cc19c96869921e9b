//! Notification effect

use crate::errors::EffectError;
use crate::types::NotifyTarget;
use async_trait::async_trait;
use std::sync::Arc;

/// Invokes the externally supplied mismatch callback on the local peer.
///
/// Receivers must tolerate repeated invocations.
#[async_trait]
pub trait NotificationEffects: Send + Sync {
    /// Invoke `target` on the local peer
    async fn invoke(&self, target: &NotifyTarget) -> Result<(), EffectError>;
}

#[async_trait]
impl<T: NotificationEffects + ?Sized> NotificationEffects for Arc<T> {
    async fn invoke(&self, target: &NotifyTarget) -> Result<(), EffectError> {
        (**self).invoke(target).await
    }
}
