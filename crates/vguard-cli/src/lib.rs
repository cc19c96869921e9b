//! VersionGuard command-line tooling
//!
//! Runs scenario files against a simulated session, checks guard
//! configuration files and inspects fetched metadata bodies.

pub mod commands;
pub mod scenario;

pub use scenario::{PeerFetch, PeerReport, Scenario, ScenarioReport, Step};
