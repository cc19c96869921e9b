//! Scenario files for `vguard simulate`
//!
//! A scenario names the peers of a session, what each peer's fetch does,
//! and a list of membership and clock steps. The session settles after
//! every step.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};
use vguard_core::{
    payload::parse_instant, EpochMarker, GuardConfig, NetworkInstant, NotifyTarget, PeerId,
    DEFAULT_SOURCE_PREFIX,
};
use vguard_testkit::{FetchOutcome, SessionOptions, SimulatedSession};

/// What a peer's fetch of the remote source does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeerFetch {
    /// Returns the scenario's remote metadata
    #[default]
    Ok,
    /// Rejected by the URL policy
    Unauthorized,
    /// Cannot be dispatched at all
    DispatchError,
    /// Never completes
    Hang,
}

/// One peer of the scenario
#[derive(Debug, Clone, Deserialize)]
pub struct PeerEntry {
    /// Peer number
    pub id: u32,
    /// Fetch behavior
    #[serde(default)]
    pub fetch: PeerFetch,
}

/// One scenario step
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Peer joins the session
    Join {
        /// Joining peer
        peer: u32,
    },
    /// Peer leaves the session
    Depart {
        /// Departing peer
        peer: u32,
    },
    /// Network clock moves forward
    Advance {
        /// Milliseconds to advance
        ms: i64,
    },
}

/// A full scenario
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Network clock when the scenario starts
    #[serde(default)]
    pub clock_start_ms: i64,
    /// Timestamp the remote source reports
    pub remote_updated_at: String,
    /// Shuffle deliveries with this seed
    pub seed: Option<u64>,
    /// Guard configuration; a valid one is used when absent
    pub guard: Option<GuardConfig>,
    /// Peers and their fetch behavior
    #[serde(default)]
    pub peers: Vec<PeerEntry>,
    /// Steps; every peer joins in listed order when empty
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from TOML
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse scenario")
    }

    /// Load a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Guard configuration every peer runs with
    pub fn guard_config(&self) -> GuardConfig {
        self.guard.clone().unwrap_or_else(|| {
            GuardConfig::new(format!("{DEFAULT_SOURCE_PREFIX}scenario"))
                .with_notify_target(NotifyTarget::new("version_marker", "show"))
        })
    }

    /// Steps to run, defaulting to every peer joining in order
    pub fn effective_steps(&self) -> Vec<Step> {
        if self.steps.is_empty() {
            self.peers
                .iter()
                .map(|peer| Step::Join { peer: peer.id })
                .collect()
        } else {
            self.steps.clone()
        }
    }

    /// Run the scenario to completion
    pub async fn run(&self) -> Result<ScenarioReport> {
        let remote = parse_instant(&self.remote_updated_at)
            .with_context(|| format!("Invalid remote_updated_at `{}`", self.remote_updated_at))?;

        let options = SessionOptions {
            seed: self.seed,
            ..SessionOptions::default()
        };
        let mut session = SimulatedSession::with_options(self.guard_config(), options);
        session.set_clock_ms(self.clock_start_ms)?;
        session.set_default_fetch_outcome(FetchOutcome::updated_at(remote));
        for entry in &self.peers {
            session.set_fetch_outcome(PeerId::new(entry.id), outcome_for(entry.fetch, remote));
        }

        let mut known = Vec::new();
        for step in self.effective_steps() {
            debug!(?step, "Running scenario step");
            match step {
                Step::Join { peer } => {
                    let peer = PeerId::new(peer);
                    session.join(peer)?;
                    if !known.contains(&peer) {
                        known.push(peer);
                    }
                }
                Step::Depart { peer } => {
                    if let Some(successor) = session.depart(PeerId::new(peer))? {
                        info!(%successor, "Coordination moved");
                    }
                }
                Step::Advance { ms } => {
                    session.advance_clock_ms(ms)?;
                }
            }
            session.run_until_quiet().await?;
        }

        let peers = known
            .into_iter()
            .map(|peer| PeerReport {
                peer,
                present: session.guard(peer).is_some(),
                marker: session.marker_seen_by(peer),
                notifications: session.notifications_for(peer),
                fetches: session.fetches_issued_by(peer),
                fetch_disabled: session.is_fetch_disabled(peer).unwrap_or(false),
            })
            .collect();

        Ok(ScenarioReport {
            remote,
            coordinator: session.coordinator(),
            latest: session.latest_marker(),
            peers,
        })
    }
}

fn outcome_for(fetch: PeerFetch, remote: NetworkInstant) -> FetchOutcome {
    match fetch {
        PeerFetch::Ok => FetchOutcome::updated_at(remote),
        PeerFetch::Unauthorized => FetchOutcome::unauthorized(),
        PeerFetch::DispatchError => FetchOutcome::DispatchError {
            code: -1,
            message: "fetch could not be dispatched".to_string(),
        },
        PeerFetch::Hang => FetchOutcome::Hang,
    }
}

/// Final state of one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerReport {
    /// Peer
    pub peer: PeerId,
    /// Still in the session at the end
    pub present: bool,
    /// Marker as the peer's replica reads it
    pub marker: Option<EpochMarker>,
    /// Notify-target invocations on the peer
    pub notifications: usize,
    /// Fetches the peer dispatched
    pub fetches: usize,
    /// Whether the peer gave up fetching
    pub fetch_disabled: bool,
}

/// Final state of a scenario run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Remote timestamp the scenario served
    pub remote: NetworkInstant,
    /// Coordinator at the end
    pub coordinator: Option<PeerId>,
    /// Join of every marker write
    pub latest: EpochMarker,
    /// Every peer that ever joined, in first-join order
    pub peers: Vec<PeerReport>,
}

impl ScenarioReport {
    /// Whether the session ended flagged as mismatched
    pub fn mismatch(&self) -> bool {
        self.latest.is_mismatch()
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "remote updated_at: {}", self.remote)?;
        writeln!(f, "epoch marker:      {}", self.latest)?;
        match self.coordinator {
            Some(peer) => writeln!(f, "coordinator:       {peer}")?,
            None => writeln!(f, "coordinator:       none")?,
        }
        for report in &self.peers {
            let marker = report
                .marker
                .map_or_else(|| "-".to_string(), |marker| marker.to_string());
            writeln!(
                f,
                "  {:<8} {:<8} marker={marker} notifications={} fetches={} fetch_disabled={}",
                report.peer.to_string(),
                if report.present { "present" } else { "departed" },
                report.notifications,
                report.fetches,
                report.fetch_disabled,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_tagged_by_action() {
        let scenario = Scenario::from_toml_str(
            r#"
            remote_updated_at = "1970-01-01T00:00:01.500Z"

            [[steps]]
            action = "join"
            peer = 1

            [[steps]]
            action = "advance"
            ms = 250

            [[steps]]
            action = "depart"
            peer = 1
            "#,
        )
        .unwrap();

        assert_eq!(
            scenario.steps,
            vec![
                Step::Join { peer: 1 },
                Step::Advance { ms: 250 },
                Step::Depart { peer: 1 },
            ]
        );
    }

    #[test]
    fn peers_join_in_order_without_steps() {
        let scenario = Scenario::from_toml_str(
            r#"
            remote_updated_at = "2024-05-01T12:00:00Z"

            [[peers]]
            id = 3
            fetch = "unauthorized"

            [[peers]]
            id = 1
            "#,
        )
        .unwrap();

        assert_eq!(scenario.peers[0].fetch, PeerFetch::Unauthorized);
        assert_eq!(scenario.peers[1].fetch, PeerFetch::Ok);
        assert_eq!(
            scenario.effective_steps(),
            vec![Step::Join { peer: 3 }, Step::Join { peer: 1 }]
        );
    }

    #[test]
    fn default_guard_config_is_valid() {
        let scenario = Scenario::from_toml_str("remote_updated_at = \"2024-05-01T12:00:00Z\"")
            .unwrap();
        assert!(scenario.guard_config().validate().is_empty());
    }

    #[tokio::test]
    async fn clock_overflow_fails_the_run() {
        let scenario = Scenario::from_toml_str(
            r#"
            clock_start_ms = 1
            remote_updated_at = "2024-05-01T12:00:00Z"

            [[steps]]
            action = "advance"
            ms = 9223372036854775807
            "#,
        )
        .unwrap();
        let err = scenario.run().await.unwrap_err();
        assert!(err.to_string().contains("cannot advance"));
    }

    #[tokio::test]
    async fn unrepresentable_clock_start_fails_the_run() {
        let scenario = Scenario::from_toml_str(
            "clock_start_ms = -9223372036854775807\nremote_updated_at = \"2024-05-01T12:00:00Z\"",
        )
        .unwrap();
        assert!(scenario.run().await.is_err());
    }

    #[tokio::test]
    async fn bad_timestamp_fails_the_run() {
        let scenario = Scenario::from_toml_str("remote_updated_at = \"soon\"").unwrap();
        assert!(scenario.run().await.is_err());
    }
}
