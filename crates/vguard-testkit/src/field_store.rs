//! Eventually-consistent replicated epoch marker
//!
//! Every peer reads its own replica. A write lands on the writer's replica
//! at once and reaches the others only on `propagate`. The store keeps the
//! join of every write ever made, so late or duplicated propagation can
//! never move a replica backward.

use std::collections::BTreeMap;
use vguard_core::{EffectError, EpochMarker, PeerId};

/// Replicated marker with explicit propagation
#[derive(Debug, Clone, Default)]
pub struct MemoryFieldStore {
    latest: EpochMarker,
    replicas: BTreeMap<PeerId, EpochMarker>,
    pending: bool,
    writes: Vec<(PeerId, EpochMarker)>,
    sync_requests: usize,
}

impl MemoryFieldStore {
    /// Start tracking a replica for `peer`. It starts uninitialized and
    /// catches up on the next propagation.
    pub fn add_replica(&mut self, peer: PeerId) {
        self.replicas.entry(peer).or_default();
        if !self.latest.is_uninitialized() {
            self.pending = true;
        }
    }

    /// Drop the replica of a departed peer
    pub fn remove_replica(&mut self, peer: PeerId) {
        self.replicas.remove(&peer);
    }

    /// Local replica of `peer`
    pub fn read(&self, peer: PeerId) -> Result<EpochMarker, EffectError> {
        self.replicas
            .get(&peer)
            .copied()
            .ok_or(EffectError::PeerAbsent { peer })
    }

    /// Write `value` on `peer`'s replica and queue it for propagation
    pub fn write(&mut self, peer: PeerId, value: EpochMarker) -> Result<(), EffectError> {
        let replica = self
            .replicas
            .get_mut(&peer)
            .ok_or(EffectError::PeerAbsent { peer })?;
        *replica = value;
        self.latest = self.latest.merge(value);
        self.writes.push((peer, value));
        self.pending = true;
        Ok(())
    }

    /// Record a flush hint
    pub fn request_sync(&mut self) {
        self.sync_requests += 1;
    }

    /// Bring `peer`'s replica up to date right away
    pub fn catch_up(&mut self, peer: PeerId) {
        if let Some(replica) = self.replicas.get_mut(&peer) {
            *replica = replica.merge(self.latest);
        }
    }

    /// Deliver pending writes to every replica. Returns whether anything
    /// was pending.
    pub fn propagate(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        for replica in self.replicas.values_mut() {
            *replica = replica.merge(self.latest);
        }
        self.pending = false;
        true
    }

    /// Whether writes are waiting for propagation
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Join of every write so far
    pub fn latest(&self) -> EpochMarker {
        self.latest
    }

    /// Every write, in order
    pub fn writes(&self) -> &[(PeerId, EpochMarker)] {
        &self.writes
    }

    /// Number of flush hints received
    pub fn sync_requests(&self) -> usize {
        self.sync_requests
    }
}
