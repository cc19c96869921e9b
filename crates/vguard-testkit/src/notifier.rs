//! Notification sink that records every invocation per peer

use std::collections::BTreeMap;
use vguard_core::{NotifyTarget, PeerId};

/// Records notify-target invocations
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    invocations: BTreeMap<PeerId, Vec<NotifyTarget>>,
}

impl RecordingNotifier {
    /// Record one invocation on `peer`
    pub fn record(&mut self, peer: PeerId, target: &NotifyTarget) {
        self.invocations.entry(peer).or_default().push(target.clone());
    }

    /// Number of invocations seen by `peer`
    pub fn count_for(&self, peer: PeerId) -> usize {
        self.invocations.get(&peer).map_or(0, Vec::len)
    }

    /// Invocations seen by `peer`, oldest first
    pub fn invocations_for(&self, peer: PeerId) -> &[NotifyTarget] {
        self.invocations.get(&peer).map(Vec::as_slice).unwrap_or_default()
    }
}
