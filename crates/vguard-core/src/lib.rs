#![deny(clippy::dbg_macro)]
#![deny(clippy::todo)]
//! # VersionGuard Core - Layer 1: Types and Effect Interfaces
//!
//! Shared vocabulary for the version guard protocol:
//! - Identifiers and instants (`PeerId`, `NetworkInstant`)
//! - The replicated epoch marker and its pure, monotonic transitions
//! - Effect traits for every capability the environment injects
//! - Remote metadata payload parsing
//! - Guard configuration and startup validation
//!
//! ## Design Principles
//!
//! - **Effect Injection**: ownership, replication, fetch, broadcast, clock and
//!   notification are traits; this crate never performs I/O itself
//! - **Pure Transitions**: every marker change is computed by an effect-free
//!   function that only ever moves the marker forward
//! - **Non-fatal Errors**: nothing here panics on bad input; callers log and
//!   fall back

pub mod config;
pub mod effects;
pub mod errors;
pub mod marker;
pub mod payload;
pub mod types;

pub use config::{ConfigError, GuardConfig, DEFAULT_SOURCE_PREFIX, DEFAULT_TIMESTAMP_FIELD};
pub use errors::{EffectError, GuardError, Result};
pub use marker::{EpochMarker, RemoteComparison, TransitionResult};
pub use payload::PayloadError;
pub use types::{FetchFailure, GuardEvent, GuardSignal, NetworkInstant, NotifyTarget, PeerId};
