//! Simulated multi-peer session
//!
//! Hosts one `VersionGuard` per peer. All guards share a `SessionWorld`
//! holding the in-memory directory, field store, event bus, fetch script,
//! clock and notifier. Each guard sees the world through its own
//! `PeerEffects`, so every effect call is attributed to the right peer.
//!
//! Nothing runs on its own: events are queued and `step` delivers one at a
//! time. Replica propagation happens only when the queue is empty, or at
//! random points when a seed is set.

use crate::{
    clock::ManualNetworkClock, event_bus::MemoryEventBus, fetch::FetchOutcome,
    fetch::ScriptedFetchService, field_store::MemoryFieldStore, notifier::RecordingNotifier,
    ownership::MemoryOwnershipDirectory,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};
use vguard_core::effects::{
    BroadcastEffects, FetchEffects, NetworkTimeEffects, NotificationEffects, OwnershipEffects,
    ReplicatedFieldEffects,
};
use vguard_core::{
    EffectError, EpochMarker, FetchFailure, GuardConfig, GuardEvent, GuardSignal, NetworkInstant,
    NotifyTarget, PeerId,
};
use vguard_protocol::VersionGuard;

/// Errors driving a simulated session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    /// Peer already joined
    #[error("{peer} already joined the session")]
    DuplicatePeer {
        /// Offending peer
        peer: PeerId,
    },

    /// Peer is not part of the session
    #[error("{peer} is not in the session")]
    UnknownPeer {
        /// Offending peer
        peer: PeerId,
    },

    /// Requested clock reading is not a calendar instant
    #[error("network clock cannot read {ms}ms")]
    ClockOutOfRange {
        /// Requested reading
        ms: i64,
    },

    /// Advancing the clock would leave the calendar range
    #[error("network clock cannot advance from {now_ms}ms by {advance_ms}ms")]
    ClockOverflow {
        /// Reading before the move
        now_ms: i64,
        /// Requested advance
        advance_ms: i64,
    },

    /// The session did not settle
    #[error("session still busy after {steps} steps")]
    StepLimitExceeded {
        /// Steps executed before giving up
        steps: usize,
    },
}

/// Scheduling options
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Shuffle deliveries and propagation with this seed; FIFO when `None`
    pub seed: Option<u64>,
    /// Upper bound on steps for `run_until_quiet`
    pub max_steps: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: None,
            max_steps: 10_000,
        }
    }
}

/// State shared by every peer of the session
#[derive(Debug, Default)]
pub struct SessionWorld {
    /// Coordinator election
    pub directory: MemoryOwnershipDirectory,
    /// Replicated epoch marker
    pub field: MemoryFieldStore,
    /// Pending deliveries
    pub bus: MemoryEventBus,
    /// Scripted fetch outcomes
    pub fetch: ScriptedFetchService,
    /// Shared network clock
    pub clock: ManualNetworkClock,
    /// Notify-target invocations
    pub notifier: RecordingNotifier,
}

impl SessionWorld {
    fn ensure_present(&self, peer: PeerId) -> Result<(), EffectError> {
        if self.directory.contains(peer) {
            Ok(())
        } else {
            Err(EffectError::PeerAbsent { peer })
        }
    }
}

/// Effects of one peer, backed by the shared world
#[derive(Clone)]
pub struct PeerEffects {
    peer: PeerId,
    world: Arc<Mutex<SessionWorld>>,
}

#[async_trait]
impl OwnershipEffects for PeerEffects {
    fn local_peer(&self) -> PeerId {
        self.peer
    }

    async fn coordinator(&self) -> Result<PeerId, EffectError> {
        self.world
            .lock()
            .directory
            .coordinator()
            .ok_or_else(|| EffectError::unavailable("session has no coordinator"))
    }

    async fn request_ownership(&self, peer: PeerId) -> Result<(), EffectError> {
        let mut world = self.world.lock();
        world.directory.transfer(peer)?;
        // The new owner starts from the latest replicated value.
        world.field.catch_up(peer);
        Ok(())
    }
}

#[async_trait]
impl ReplicatedFieldEffects<EpochMarker> for PeerEffects {
    async fn read_field(&self) -> Result<EpochMarker, EffectError> {
        self.world.lock().field.read(self.peer)
    }

    async fn write_field(&self, value: EpochMarker) -> Result<(), EffectError> {
        let mut world = self.world.lock();
        if world.directory.coordinator() != Some(self.peer) {
            return Err(EffectError::NotCoordinator { peer: self.peer });
        }
        world.field.write(self.peer, value)
    }

    async fn request_sync(&self) -> Result<(), EffectError> {
        let mut world = self.world.lock();
        world.ensure_present(self.peer)?;
        world.field.request_sync();
        Ok(())
    }
}

#[async_trait]
impl FetchEffects for PeerEffects {
    async fn begin_fetch(&self, url: &str) -> Result<(), FetchFailure> {
        let mut world = self.world.lock();
        if let Some(completion) = world.fetch.begin(self.peer, url)? {
            world
                .bus
                .push(self.peer, GuardEvent::FetchCompleted(completion));
        }
        Ok(())
    }
}

#[async_trait]
impl BroadcastEffects for PeerEffects {
    async fn broadcast(&self, signal: GuardSignal) -> Result<(), EffectError> {
        let mut world = self.world.lock();
        world.ensure_present(self.peer)?;
        let roster = world.directory.roster().to_vec();
        world.bus.broadcast(self.peer, signal, &roster);
        Ok(())
    }
}

#[async_trait]
impl NetworkTimeEffects for PeerEffects {
    async fn network_instant(&self) -> Result<NetworkInstant, EffectError> {
        Ok(self.world.lock().clock.now())
    }
}

#[async_trait]
impl NotificationEffects for PeerEffects {
    async fn invoke(&self, target: &NotifyTarget) -> Result<(), EffectError> {
        self.world.lock().notifier.record(self.peer, target);
        Ok(())
    }
}

/// A session of guards driven by a single event queue
pub struct SimulatedSession {
    config: GuardConfig,
    options: SessionOptions,
    world: Arc<Mutex<SessionWorld>>,
    guards: BTreeMap<PeerId, VersionGuard<PeerEffects>>,
    rng: Option<ChaCha8Rng>,
}

impl SimulatedSession {
    /// Create a FIFO session where every guard uses `config`
    pub fn new(config: GuardConfig) -> Self {
        Self::with_options(config, SessionOptions::default())
    }

    /// Create a session with explicit scheduling options
    pub fn with_options(config: GuardConfig, options: SessionOptions) -> Self {
        let rng = options.seed.map(ChaCha8Rng::seed_from_u64);
        Self {
            config,
            options,
            world: Arc::new(Mutex::new(SessionWorld::default())),
            guards: BTreeMap::new(),
            rng,
        }
    }

    /// Set the network clock
    pub fn set_clock_ms(&self, now_ms: i64) -> Result<NetworkInstant, SimulationError> {
        self.world
            .lock()
            .clock
            .set(now_ms)
            .ok_or(SimulationError::ClockOutOfRange { ms: now_ms })
    }

    /// Advance the network clock
    pub fn advance_clock_ms(&self, ms: i64) -> Result<NetworkInstant, SimulationError> {
        let mut world = self.world.lock();
        let before = world.clock.now().as_unix_ms();
        world.clock.advance(ms).ok_or(SimulationError::ClockOverflow {
            now_ms: before,
            advance_ms: ms,
        })
    }

    /// Script `peer`'s fetches
    pub fn set_fetch_outcome(&self, peer: PeerId, outcome: FetchOutcome) {
        self.world.lock().fetch.set_outcome(peer, outcome);
    }

    /// Script fetches of peers without their own outcome
    pub fn set_default_fetch_outcome(&self, outcome: FetchOutcome) {
        self.world.lock().fetch.set_default_outcome(outcome);
    }

    /// Add `peer` and queue its join event for every present peer.
    pub fn join(&mut self, peer: PeerId) -> Result<(), SimulationError> {
        if self.guards.contains_key(&peer) {
            return Err(SimulationError::DuplicatePeer { peer });
        }

        let roster = {
            let mut world = self.world.lock();
            world.field.add_replica(peer);
            if world.directory.add_peer(peer) {
                world.field.catch_up(peer);
                debug!(%peer, "Peer joined an empty session and coordinates it");
            }
            world.directory.roster().to_vec()
        };

        let effects = PeerEffects {
            peer,
            world: Arc::clone(&self.world),
        };
        self.guards
            .insert(peer, VersionGuard::new(self.config.clone(), effects));

        let mut world = self.world.lock();
        for present in roster {
            world.bus.push(present, GuardEvent::PeerJoined(peer));
        }
        Ok(())
    }

    /// Remove `peer`. Returns the new coordinator if coordination moved.
    pub fn depart(&mut self, peer: PeerId) -> Result<Option<PeerId>, SimulationError> {
        if self.guards.remove(&peer).is_none() {
            return Err(SimulationError::UnknownPeer { peer });
        }

        let mut world = self.world.lock();
        let successor = world.directory.remove_peer(peer);
        world.field.remove_replica(peer);
        world.bus.drop_for(peer);
        if let Some(successor) = successor {
            world.field.catch_up(successor);
            debug!(%peer, %successor, "Coordinator departed");
        }
        Ok(successor)
    }

    /// Deliver one event, or propagate replicas when idle. Returns whether
    /// any work was done.
    pub async fn step(&mut self) -> bool {
        let propagate_early = match self.rng.as_mut() {
            Some(rng) => rng.gen_bool(0.25),
            None => false,
        };

        let delivery = {
            let mut world = self.world.lock();
            if propagate_early && world.field.propagate() {
                trace!("Replicas propagated");
                return true;
            }
            match world.bus.pop(self.rng.as_mut()) {
                Some(delivery) => Some(delivery),
                None => {
                    if world.field.propagate() {
                        trace!("Replicas propagated");
                        return true;
                    }
                    None
                }
            }
        };

        let Some(delivery) = delivery else {
            return false;
        };

        match self.guards.get_mut(&delivery.to) {
            Some(guard) => {
                trace!(to = %delivery.to, event = ?delivery.event, "Delivering event");
                guard.handle(delivery.event).await;
            }
            None => trace!(to = %delivery.to, "Dropping event for departed peer"),
        }
        true
    }

    /// Step until nothing is queued and every replica is current. Returns
    /// the number of steps taken.
    pub async fn run_until_quiet(&mut self) -> Result<usize, SimulationError> {
        let mut steps = 0;
        while self.step().await {
            steps += 1;
            if steps >= self.options.max_steps {
                return Err(SimulationError::StepLimitExceeded { steps });
            }
        }
        Ok(steps)
    }

    /// Join `peer` and run the session until it settles
    pub async fn join_and_settle(&mut self, peer: PeerId) -> Result<usize, SimulationError> {
        self.join(peer)?;
        self.run_until_quiet().await
    }

    /// Present peers in join order
    pub fn peers(&self) -> Vec<PeerId> {
        self.world.lock().directory.roster().to_vec()
    }

    /// Current coordinator
    pub fn coordinator(&self) -> Option<PeerId> {
        self.world.lock().directory.coordinator()
    }

    /// Marker as `peer`'s replica currently reads it
    pub fn marker_seen_by(&self, peer: PeerId) -> Option<EpochMarker> {
        self.world.lock().field.read(peer).ok()
    }

    /// Join of every marker write in the session
    pub fn latest_marker(&self) -> EpochMarker {
        self.world.lock().field.latest()
    }

    /// Every marker write, in order
    pub fn marker_writes(&self) -> Vec<(PeerId, EpochMarker)> {
        self.world.lock().field.writes().to_vec()
    }

    /// Notifications `peer` received
    pub fn notifications_for(&self, peer: PeerId) -> usize {
        self.world.lock().notifier.count_for(peer)
    }

    /// Targets invoked on `peer`, oldest first
    pub fn notify_targets_for(&self, peer: PeerId) -> Vec<NotifyTarget> {
        self.world.lock().notifier.invocations_for(peer).to_vec()
    }

    /// Fetches `peer` dispatched
    pub fn fetches_issued_by(&self, peer: PeerId) -> usize {
        self.world.lock().fetch.issued_by(peer)
    }

    /// Whether `peer` gave up fetching
    pub fn is_fetch_disabled(&self, peer: PeerId) -> Option<bool> {
        self.guards.get(&peer).map(VersionGuard::is_fetch_disabled)
    }

    /// Every broadcast sent in the session, with its sender
    pub fn broadcasts(&self) -> Vec<(PeerId, GuardSignal)> {
        self.world.lock().bus.broadcasts().to_vec()
    }

    /// Number of flush hints received by the field store
    pub fn sync_requests(&self) -> usize {
        self.world.lock().field.sync_requests()
    }

    /// Guard hosted for `peer`
    pub fn guard(&self, peer: PeerId) -> Option<&VersionGuard<PeerEffects>> {
        self.guards.get(&peer)
    }

    /// Mutable access to `peer`'s guard, for driving handlers directly
    pub fn guard_mut(&mut self, peer: PeerId) -> Option<&mut VersionGuard<PeerEffects>> {
        self.guards.get_mut(&peer)
    }
}
