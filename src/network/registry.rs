//! Peer registry
//!
//! Every upgraded connection, oldest first. The session only ever sees the
//! newest one; the registry exists so housekeeping can reap the rest.

use crate::session::{Peer, PeerId};

/// Live peers in connection order
pub struct PeerRegistry<P: Peer> {
    peers: Vec<P>,
}

impl<P: Peer> PeerRegistry<P> {
    pub fn new() -> Self {
        Self { peers: Vec::new() }
    }

    pub fn insert(&mut self, peer: P) {
        self.peers.push(peer);
    }

    /// Forget a peer after its connection ended
    pub fn remove(&mut self, id: PeerId) -> Option<P> {
        let idx = self.peers.iter().position(|p| p.id() == id)?;
        Some(self.peers.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.iter().any(|p| p.id() == id)
    }

    /// Drop peers that are no longer open, then close the oldest while more
    /// than `max_clients` remain. Returns how many peers were removed.
    pub fn cleanup(&mut self, max_clients: usize) -> usize {
        let before = self.peers.len();
        self.peers.retain(|p| p.is_open());

        while self.peers.len() > max_clients {
            let oldest = self.peers.remove(0);
            tracing::debug!("Closing peer #{}: over client limit", oldest.id());
            oldest.close();
        }

        before - self.peers.len()
    }

    /// Close every peer (shutdown)
    pub fn close_all(&mut self) {
        for peer in self.peers.drain(..) {
            peer.close();
        }
    }
}

impl<P: Peer> Default for PeerRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
