#![deny(clippy::dbg_macro)]
#![deny(clippy::todo)]
//! # VersionGuard Protocol - Layer 2: Peer Coordination
//!
//! Drives one guard session on one peer:
//! - the coordinator stamps the session creation instant on first join
//! - later joins poll the remote source, delegating the fetch to other peers
//!   when the local peer cannot reach it
//! - a successful fetch moves coordination to the fetching peer and compares
//!   the remote last-modified instant with the session instant
//! - a detected mismatch is replicated and fanned out to every peer
//!
//! All handlers run on the peer's single event loop and return without
//! waiting on the network. Failures are logged and never propagated.

pub mod guard;
pub mod outcome;
pub mod prelude;

pub use guard::VersionGuard;
pub use outcome::{FetchVerdict, JoinAction};
