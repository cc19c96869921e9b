//! Supertrait grouping every capability the guard needs

use super::{
    BroadcastEffects, FetchEffects, NetworkTimeEffects, NotificationEffects, OwnershipEffects,
    ReplicatedFieldEffects,
};
use crate::marker::EpochMarker;

/// Supertrait for running a version guard
///
/// Combines ownership, the replicated epoch marker, fetch, broadcast, the
/// network clock and the notification sink.
pub trait GuardEffects:
    OwnershipEffects
    + ReplicatedFieldEffects<EpochMarker>
    + FetchEffects
    + BroadcastEffects
    + NetworkTimeEffects
    + NotificationEffects
{
    // Blanket-implemented below; never implemented by hand
}

/// Automatic implementation for types that satisfy the required bounds
impl<T> GuardEffects for T where
    T: OwnershipEffects
        + ReplicatedFieldEffects<EpochMarker>
        + FetchEffects
        + BroadcastEffects
        + NetworkTimeEffects
        + NotificationEffects
{
}
