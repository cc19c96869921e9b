//! Remote fetch effect

use crate::types::FetchFailure;
use async_trait::async_trait;
use std::sync::Arc;

/// Fire-and-forget text fetch.
///
/// `begin_fetch` only dispatches the request. The body or failure arrives
/// later as `GuardEvent::FetchCompleted` on the peer that issued it. An `Err`
/// here means the request could not even be dispatched.
#[async_trait]
pub trait FetchEffects: Send + Sync {
    /// Dispatch a fetch of `url`
    async fn begin_fetch(&self, url: &str) -> Result<(), FetchFailure>;
}

#[async_trait]
impl<T: FetchEffects + ?Sized> FetchEffects for Arc<T> {
    async fn begin_fetch(&self, url: &str) -> Result<(), FetchFailure> {
        (**self).begin_fetch(url).await
    }
}
