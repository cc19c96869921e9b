//! Version guard handler
//!
//! One `VersionGuard` runs on every peer of a session. Only the coordinator
//! ever writes the replicated epoch marker; the ownership directory keeps
//! that role unique, so no locking happens here.
//!
//! Join events are the only polling trigger. There is no timer: a stalled
//! fetch or a departed coordinator is picked up by the next join.

use crate::outcome::{FetchVerdict, JoinAction};
use tracing::{debug, error, info, instrument, warn};
use vguard_core::{
    effects::GuardEffects,
    marker::{self, RemoteComparison, TransitionResult},
    payload, ConfigError, EpochMarker, FetchFailure, GuardConfig, GuardError, GuardEvent,
    GuardSignal, PeerId, Result,
};

/// Per-peer protocol state and handlers.
pub struct VersionGuard<E> {
    config: GuardConfig,
    config_problems: Vec<ConfigError>,
    /// Set after the first fetch failure on this peer, never cleared
    local_fetch_disabled: bool,
    effects: E,
}

impl<E: GuardEffects> VersionGuard<E> {
    /// Create a guard and validate its configuration.
    ///
    /// Configuration problems are logged and kept; the guard still runs.
    pub fn new(config: GuardConfig, effects: E) -> Self {
        let config_problems = config.validate();
        for problem in &config_problems {
            error!(
                peer = %effects.local_peer(),
                error = %problem,
                "Invalid guard configuration"
            );
        }

        Self {
            config,
            config_problems,
            local_fetch_disabled: false,
            effects,
        }
    }

    /// Peer this guard runs on
    pub fn local_peer(&self) -> PeerId {
        self.effects.local_peer()
    }

    /// Guard configuration
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Problems found when the guard started
    pub fn config_problems(&self) -> &[ConfigError] {
        &self.config_problems
    }

    /// Whether this peer has given up fetching
    pub fn is_fetch_disabled(&self) -> bool {
        self.local_fetch_disabled
    }

    /// Injected effects
    pub fn effects(&self) -> &E {
        &self.effects
    }

    /// Local replica of the epoch marker
    pub async fn epoch_marker(&self) -> Result<EpochMarker> {
        Ok(self.effects.read_field().await?)
    }

    /// Dispatch any environment event.
    pub async fn handle(&mut self, event: GuardEvent) {
        match event {
            GuardEvent::PeerJoined(peer) => {
                self.on_peer_joined(peer).await;
            }
            GuardEvent::FetchCompleted(result) => self.on_fetch_complete(result).await,
            GuardEvent::Signal(signal) => self.handle_signal(signal).await,
        }
    }

    /// Dispatch a broadcast delivery.
    pub async fn handle_signal(&mut self, signal: GuardSignal) {
        debug!(
            peer = %self.local_peer(),
            method = signal.method_name(),
            "Broadcast signal received"
        );
        match signal {
            GuardSignal::AttemptFetch => {
                self.attempt_fetch().await;
            }
            GuardSignal::NotifyAll => self.notify_all().await,
        }
    }

    /// Handle a peer joining the session.
    ///
    /// No-op unless the local peer coordinates. The coordinator initializes
    /// the marker once, re-announces a known mismatch, or polls the remote
    /// source.
    #[instrument(skip(self), fields(peer = %self.effects.local_peer()))]
    pub async fn on_peer_joined(&mut self, joined: PeerId) -> JoinAction {
        match self.try_on_peer_joined().await {
            Ok(action) => {
                debug!(?action, "Join handled");
                action
            }
            Err(e) => {
                error!(error = %e, "Join handling failed");
                JoinAction::Aborted
            }
        }
    }

    async fn try_on_peer_joined(&mut self) -> Result<JoinAction> {
        if !self.effects.is_local_coordinator().await? {
            return Ok(JoinAction::NotCoordinator);
        }

        let current = self.effects.read_field().await?;
        match current {
            EpochMarker::Uninitialized => {
                let now = self.effects.network_instant().await?;
                if self.commit(current, marker::initialize(current, now)).await? {
                    self.effects.request_sync().await?;
                    info!(instant = %now, "Session creation instant recorded");
                    Ok(JoinAction::Initialized(now))
                } else {
                    Ok(JoinAction::Aborted)
                }
            }
            EpochMarker::Mismatch => {
                self.effects.broadcast(GuardSignal::NotifyAll).await?;
                Ok(JoinAction::AnnouncedMismatch)
            }
            EpochMarker::Recorded(_) => {
                if self.local_fetch_disabled {
                    self.effects.broadcast(GuardSignal::AttemptFetch).await?;
                    Ok(JoinAction::DelegatedFetch)
                } else if self.attempt_fetch().await {
                    Ok(JoinAction::FetchIssued)
                } else {
                    Ok(JoinAction::DelegatedFetch)
                }
            }
        }
    }

    /// Issue one fetch of the remote source.
    ///
    /// Returns whether a fetch was dispatched. A peer that already failed
    /// once never fetches again. A dispatch error counts as a failure.
    pub async fn attempt_fetch(&mut self) -> bool {
        if self.local_fetch_disabled {
            debug!(peer = %self.local_peer(), "Local fetch disabled, ignoring fetch request");
            return false;
        }

        match self.effects.begin_fetch(&self.config.remote_source).await {
            Ok(()) => {
                debug!(
                    peer = %self.local_peer(),
                    url = %self.config.remote_source,
                    "Fetch dispatched"
                );
                true
            }
            Err(failure) => {
                self.on_fetch_failure(failure).await;
                false
            }
        }
    }

    /// Handle a fetch completion; success and failure are its two arms.
    pub async fn on_fetch_complete(&mut self, result: std::result::Result<String, FetchFailure>) {
        match result {
            Ok(body) => {
                self.on_fetch_success(&body).await;
            }
            Err(failure) => self.on_fetch_failure(failure).await,
        }
    }

    /// Handle a fetched metadata body.
    #[instrument(skip(self, body), fields(peer = %self.effects.local_peer()))]
    pub async fn on_fetch_success(&mut self, body: &str) -> FetchVerdict {
        match self.try_on_fetch_success(body).await {
            Ok(verdict) => verdict,
            Err(GuardError::Payload(e)) => {
                error!(error = %e, "Failed to interpret remote metadata");
                debug!(body, "Rejected metadata body");
                FetchVerdict::Rejected
            }
            Err(GuardError::NotInitialized) => {
                error!("Fetch completed before the epoch marker was initialized");
                FetchVerdict::NotInitialized
            }
            Err(e) => {
                error!(error = %e, "Fetch result handling failed");
                FetchVerdict::Aborted
            }
        }
    }

    async fn try_on_fetch_success(&mut self, body: &str) -> Result<FetchVerdict> {
        // A peer that can reach the source is the best coordinator.
        let local = self.effects.local_peer();
        let coordinator = self.effects.coordinator().await?;
        if coordinator != local {
            info!(previous = %coordinator, "Taking over coordination after successful fetch");
            self.effects.request_ownership(local).await?;
        }

        let remote = payload::extract_remote_instant(body, &self.config.timestamp_field)?;
        let current = self.effects.read_field().await?;

        match marker::compare_remote(current, remote) {
            RemoteComparison::NotInitialized => Err(GuardError::NotInitialized),
            RemoteComparison::AlreadyMismatched => Ok(FetchVerdict::AlreadyMismatched),
            RemoteComparison::NotNewer => {
                debug!(%remote, marker = %current, "Remote source unchanged");
                Ok(FetchVerdict::Unchanged)
            }
            RemoteComparison::Newer { recorded, remote } => {
                if !self.commit(current, marker::flag_mismatch(current)).await? {
                    return Ok(FetchVerdict::Aborted);
                }
                warn!(
                    %recorded,
                    %remote,
                    "Remote source changed after session start, flagging mismatch"
                );
                self.effects.broadcast(GuardSignal::NotifyAll).await?;
                self.effects.request_sync().await?;
                Ok(FetchVerdict::Mismatch)
            }
        }
    }

    /// Handle a failed fetch: stop fetching on this peer for good and ask
    /// every other peer to try.
    #[instrument(skip(self), fields(peer = %self.effects.local_peer()))]
    pub async fn on_fetch_failure(&mut self, failure: FetchFailure) {
        error!(
            code = failure.code,
            reason = %failure.message,
            "Failed to fetch remote source, delegating to peers"
        );
        self.local_fetch_disabled = true;

        if let Err(e) = self.effects.broadcast(GuardSignal::AttemptFetch).await {
            error!(error = %e, "Failed to delegate fetch");
        }
    }

    /// Invoke the notify target on this peer. Safe to repeat.
    pub async fn notify_all(&self) {
        let peer = self.local_peer();
        let Some(target) = &self.config.notify_target else {
            warn!(%peer, "Mismatch notification dropped: no notify target configured");
            return;
        };

        info!(%peer, %target, "Notifying version mismatch");
        if let Err(e) = self.effects.invoke(target).await {
            error!(%peer, %target, error = %e, "Notify target invocation failed");
        }
    }

    /// Write the marker produced by `transition`. Returns whether a write
    /// happened.
    async fn commit(&self, current: EpochMarker, transition: TransitionResult) -> Result<bool> {
        match transition {
            TransitionResult::Ok(next) => {
                debug_assert!(current.can_transition_to(next));
                self.effects.write_field(next).await?;
                Ok(true)
            }
            TransitionResult::NotEnabled(reason) => {
                warn!(marker = %current, %reason, "Marker transition not enabled");
                Ok(false)
            }
        }
    }
}
