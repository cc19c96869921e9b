//! VersionGuard Testing Infrastructure
//!
//! In-memory stand-ins for every effect a guard consumes, and a
//! `SimulatedSession` that hosts many guards on one event queue so
//! multi-peer behavior can be driven deterministically.
//!
//! # Usage
//!
//! ```rust,no_run
//! use vguard_testkit::*;
//! use vguard_core::{GuardConfig, PeerId};
//!
//! # async fn run() -> Result<(), SimulationError> {
//! let config = GuardConfig::new("https://api.vrchat.cloud/api/1/worlds/wrld_x");
//! let mut session = SimulatedSession::new(config);
//! session.set_clock_ms(1000)?;
//! session.join(PeerId::new(1))?;
//! session.run_until_quiet().await?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod clock;
pub mod event_bus;
pub mod fetch;
pub mod field_store;
pub mod notifier;
pub mod ownership;
pub mod session;

pub use clock::ManualNetworkClock;
pub use event_bus::{Delivery, MemoryEventBus};
pub use fetch::{metadata_body, FetchCompletion, FetchOutcome, ScriptedFetchService};
pub use field_store::MemoryFieldStore;
pub use notifier::RecordingNotifier;
pub use ownership::MemoryOwnershipDirectory;
pub use session::{PeerEffects, SessionOptions, SimulatedSession, SimulationError};
