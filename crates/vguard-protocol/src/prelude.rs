//! VersionGuard prelude.
//!
//! Curated re-exports for hosting a guard.

pub use crate::{FetchVerdict, JoinAction, VersionGuard};
pub use vguard_core::effects::GuardEffects;
pub use vguard_core::{
    EpochMarker, FetchFailure, GuardConfig, GuardEvent, GuardSignal, NetworkInstant, NotifyTarget,
    PeerId,
};
