//! Scripted fetch service
//!
//! Each peer gets a scripted outcome; peers without one use the session
//! default. Completions are returned to the caller, which queues them as
//! `GuardEvent::FetchCompleted` for the issuing peer.

use std::collections::BTreeMap;
use vguard_core::{FetchFailure, NetworkInstant, PeerId, DEFAULT_TIMESTAMP_FIELD};

/// What a peer's fetch does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Completes with this body
    Body(String),
    /// Completes with a failure
    Fail {
        /// Failure code
        code: i32,
        /// Failure message
        message: String,
    },
    /// Cannot even be dispatched
    DispatchError {
        /// Failure code
        code: i32,
        /// Failure message
        message: String,
    },
    /// Never completes
    Hang,
}

impl FetchOutcome {
    /// Successful fetch of metadata last modified at `updated_at`
    pub fn updated_at(updated_at: NetworkInstant) -> Self {
        FetchOutcome::Body(metadata_body(updated_at))
    }

    /// Failure the way an untrusted-URL policy reports it
    pub fn unauthorized() -> Self {
        FetchOutcome::Fail {
            code: 401,
            message: "untrusted url".to_string(),
        }
    }
}

impl Default for FetchOutcome {
    fn default() -> Self {
        FetchOutcome::Fail {
            code: 0,
            message: "no fetch outcome scripted".to_string(),
        }
    }
}

/// Metadata body with the default timestamp field set to `updated_at`
pub fn metadata_body(updated_at: NetworkInstant) -> String {
    let text = updated_at
        .to_datetime()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();
    format!(r#"{{"id":"wrld_simulated","{DEFAULT_TIMESTAMP_FIELD}":"{text}"}}"#)
}

/// Completion handed back to the issuing peer
pub type FetchCompletion = Result<String, FetchFailure>;

/// Per-peer scripted fetch outcomes
#[derive(Debug, Clone, Default)]
pub struct ScriptedFetchService {
    outcomes: BTreeMap<PeerId, FetchOutcome>,
    default_outcome: FetchOutcome,
    issued: Vec<(PeerId, String)>,
}

impl ScriptedFetchService {
    /// Script the outcome of `peer`'s fetches
    pub fn set_outcome(&mut self, peer: PeerId, outcome: FetchOutcome) {
        self.outcomes.insert(peer, outcome);
    }

    /// Outcome for peers without a script
    pub fn set_default_outcome(&mut self, outcome: FetchOutcome) {
        self.default_outcome = outcome;
    }

    /// Dispatch a fetch for `peer`.
    ///
    /// `Ok(Some(_))` is a completion to deliver later, `Ok(None)` a fetch
    /// that never completes.
    pub fn begin(
        &mut self,
        peer: PeerId,
        url: &str,
    ) -> Result<Option<FetchCompletion>, FetchFailure> {
        let outcome = self
            .outcomes
            .get(&peer)
            .unwrap_or(&self.default_outcome)
            .clone();

        match outcome {
            FetchOutcome::DispatchError { code, message } => Err(FetchFailure::new(code, message)),
            FetchOutcome::Body(body) => {
                self.issued.push((peer, url.to_string()));
                Ok(Some(Ok(body)))
            }
            FetchOutcome::Fail { code, message } => {
                self.issued.push((peer, url.to_string()));
                Ok(Some(Err(FetchFailure::new(code, message))))
            }
            FetchOutcome::Hang => {
                self.issued.push((peer, url.to_string()));
                Ok(None)
            }
        }
    }

    /// Number of fetches `peer` dispatched
    pub fn issued_by(&self, peer: PeerId) -> usize {
        self.issued.iter().filter(|(p, _)| *p == peer).count()
    }

    /// Every dispatched fetch, in order
    pub fn issued(&self) -> &[(PeerId, String)] {
        &self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vguard_core::payload::extract_remote_instant;

    #[test]
    fn metadata_body_round_trips_through_payload_parser() {
        let updated_at = NetworkInstant::from_unix_ms(1_714_564_800_250);
        let body = metadata_body(updated_at);
        assert_eq!(
            extract_remote_instant(&body, DEFAULT_TIMESTAMP_FIELD),
            Ok(updated_at)
        );
    }

    #[test]
    fn unscripted_peers_use_the_default() {
        let mut fetch = ScriptedFetchService::default();
        fetch.set_outcome(PeerId::new(1), FetchOutcome::Hang);
        fetch.set_default_outcome(FetchOutcome::unauthorized());

        assert_eq!(fetch.begin(PeerId::new(1), "u"), Ok(None));
        assert_eq!(
            fetch.begin(PeerId::new(2), "u"),
            Ok(Some(Err(FetchFailure::new(401, "untrusted url"))))
        );
        assert_eq!(fetch.issued_by(PeerId::new(1)), 1);
        assert_eq!(fetch.issued_by(PeerId::new(2)), 1);
    }

    #[test]
    fn dispatch_errors_are_not_counted_as_issued() {
        let mut fetch = ScriptedFetchService::default();
        fetch.set_default_outcome(FetchOutcome::DispatchError {
            code: -1,
            message: "disabled".to_string(),
        });
        assert!(fetch.begin(PeerId::new(1), "u").is_err());
        assert!(fetch.issued().is_empty());
    }
}
