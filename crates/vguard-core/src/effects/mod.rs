//! Effect traits injected into the guard
//!
//! Each trait is one capability the surrounding runtime supplies. Handlers
//! are expected to return promptly: anything slow (the fetch itself,
//! replication, broadcast delivery) is enqueued and completes as a later
//! event on the receiving peer.
//!
//! - `OwnershipEffects`: who coordinates the session object
//! - `ReplicatedFieldEffects`: the eventually-consistent epoch marker
//! - `FetchEffects`: fire-and-forget fetch of the remote source
//! - `BroadcastEffects`: fan-out of `GuardSignal`s to every peer
//! - `NetworkTimeEffects`: the authoritative shared clock
//! - `NotificationEffects`: the callback invoked once a mismatch is known

pub mod broadcast;
pub mod fetch;
pub mod field;
pub mod notify;
pub mod ownership;
pub mod supertraits;
pub mod time;

pub use broadcast::BroadcastEffects;
pub use fetch::FetchEffects;
pub use field::ReplicatedFieldEffects;
pub use notify::NotificationEffects;
pub use ownership::OwnershipEffects;
pub use supertraits::GuardEffects;
pub use time::NetworkTimeEffects;
