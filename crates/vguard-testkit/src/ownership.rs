//! In-memory ownership directory
//!
//! Keeps the roster in join order. The first peer to join coordinates; a
//! departing coordinator hands over to the longest-present remaining peer.

use vguard_core::{EffectError, PeerId};

/// Single-coordinator directory for one session object
#[derive(Debug, Clone, Default)]
pub struct MemoryOwnershipDirectory {
    roster: Vec<PeerId>,
    coordinator: Option<PeerId>,
    transfers: usize,
}

impl MemoryOwnershipDirectory {
    /// Add a peer. Returns true if it became coordinator.
    pub fn add_peer(&mut self, peer: PeerId) -> bool {
        if !self.roster.contains(&peer) {
            self.roster.push(peer);
        }
        if self.coordinator.is_none() {
            self.coordinator = Some(peer);
            return true;
        }
        false
    }

    /// Remove a peer. Returns the new coordinator if coordination moved.
    pub fn remove_peer(&mut self, peer: PeerId) -> Option<PeerId> {
        self.roster.retain(|p| *p != peer);
        if self.coordinator != Some(peer) {
            return None;
        }
        self.coordinator = self.roster.first().copied();
        self.coordinator
    }

    /// Move coordination to `peer`
    pub fn transfer(&mut self, peer: PeerId) -> Result<(), EffectError> {
        if !self.roster.contains(&peer) {
            return Err(EffectError::PeerAbsent { peer });
        }
        if self.coordinator != Some(peer) {
            self.coordinator = Some(peer);
            self.transfers += 1;
        }
        Ok(())
    }

    /// Current coordinator
    pub fn coordinator(&self) -> Option<PeerId> {
        self.coordinator
    }

    /// Present peers in join order
    pub fn roster(&self) -> &[PeerId] {
        &self.roster
    }

    /// Whether `peer` is present
    pub fn contains(&self, peer: PeerId) -> bool {
        self.roster.contains(&peer)
    }

    /// Number of ownership transfers granted
    pub fn transfers(&self) -> usize {
        self.transfers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_peer_coordinates_and_hands_over_in_join_order() {
        let mut directory = MemoryOwnershipDirectory::default();
        assert!(directory.add_peer(PeerId::new(1)));
        assert!(!directory.add_peer(PeerId::new(2)));
        assert!(!directory.add_peer(PeerId::new(3)));

        assert_eq!(directory.remove_peer(PeerId::new(2)), None);
        assert_eq!(directory.remove_peer(PeerId::new(1)), Some(PeerId::new(3)));
        assert_eq!(directory.coordinator(), Some(PeerId::new(3)));
    }

    #[test]
    fn transfer_requires_presence() {
        let mut directory = MemoryOwnershipDirectory::default();
        directory.add_peer(PeerId::new(1));
        assert_eq!(
            directory.transfer(PeerId::new(9)),
            Err(EffectError::PeerAbsent {
                peer: PeerId::new(9)
            })
        );
        directory.add_peer(PeerId::new(2));
        directory.transfer(PeerId::new(2)).unwrap();
        directory.transfer(PeerId::new(2)).unwrap();
        assert_eq!(directory.coordinator(), Some(PeerId::new(2)));
        assert_eq!(directory.transfers(), 1);
    }

    #[test]
    fn last_departure_leaves_no_coordinator() {
        let mut directory = MemoryOwnershipDirectory::default();
        directory.add_peer(PeerId::new(1));
        assert_eq!(directory.remove_peer(PeerId::new(1)), None);
        assert_eq!(directory.coordinator(), None);
    }
}
