//! Session event queue
//!
//! Broadcasts are expanded into one delivery per present peer. Deliveries
//! are taken either in FIFO order or, with a seeded generator, in random
//! order to exercise unordered delivery.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use vguard_core::{GuardEvent, GuardSignal, PeerId};

/// One event addressed to one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Receiving peer
    pub to: PeerId,
    /// Event to hand to the peer's guard
    pub event: GuardEvent,
}

/// Pending deliveries for every peer of the session
#[derive(Debug, Clone, Default)]
pub struct MemoryEventBus {
    queue: VecDeque<Delivery>,
    broadcasts: Vec<(PeerId, GuardSignal)>,
}

impl MemoryEventBus {
    /// Queue `event` for `to`
    pub fn push(&mut self, to: PeerId, event: GuardEvent) {
        self.queue.push_back(Delivery { to, event });
    }

    /// Queue `signal` for every peer in `roster`, sender included
    pub fn broadcast(&mut self, from: PeerId, signal: GuardSignal, roster: &[PeerId]) {
        self.broadcasts.push((from, signal));
        for peer in roster {
            self.push(*peer, GuardEvent::Signal(signal));
        }
    }

    /// Take the next delivery. Random order when `rng` is given.
    pub fn pop(&mut self, rng: Option<&mut ChaCha8Rng>) -> Option<Delivery> {
        match rng {
            Some(rng) if self.queue.len() > 1 => {
                let index = rng.gen_range(0..self.queue.len());
                self.queue.remove(index)
            }
            _ => self.queue.pop_front(),
        }
    }

    /// Drop everything addressed to a departed peer
    pub fn drop_for(&mut self, peer: PeerId) {
        self.queue.retain(|delivery| delivery.to != peer);
    }

    /// Number of pending deliveries
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Every broadcast sent, with its sender
    pub fn broadcasts(&self) -> &[(PeerId, GuardSignal)] {
        &self.broadcasts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn broadcast_reaches_every_present_peer() {
        let mut bus = MemoryEventBus::default();
        let roster = [PeerId::new(1), PeerId::new(2), PeerId::new(3)];
        bus.broadcast(PeerId::new(2), GuardSignal::NotifyAll, &roster);

        let mut receivers = Vec::new();
        while let Some(delivery) = bus.pop(None) {
            assert_eq!(delivery.event, GuardEvent::Signal(GuardSignal::NotifyAll));
            receivers.push(delivery.to);
        }
        assert_eq!(receivers, roster);
        assert_eq!(bus.broadcasts(), &[(PeerId::new(2), GuardSignal::NotifyAll)]);
    }

    #[test]
    fn seeded_pop_drains_everything() {
        let mut bus = MemoryEventBus::default();
        for raw in 0..10 {
            bus.push(PeerId::new(raw), GuardEvent::PeerJoined(PeerId::new(raw)));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = Vec::new();
        while let Some(delivery) = bus.pop(Some(&mut rng)) {
            seen.push(delivery.to.get());
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn departed_peers_lose_pending_deliveries() {
        let mut bus = MemoryEventBus::default();
        bus.push(PeerId::new(1), GuardEvent::Signal(GuardSignal::AttemptFetch));
        bus.push(PeerId::new(2), GuardEvent::Signal(GuardSignal::AttemptFetch));
        bus.drop_for(PeerId::new(1));
        assert_eq!(bus.len(), 1);
        assert_eq!(bus.pop(None).map(|d| d.to), Some(PeerId::new(2)));
        assert!(bus.is_empty());
    }
}
