//! In-process peer transport.
//!
//! [`MemoryTransport`] connects [`Peer`]s living in the same process. It
//! holds weak references, so dropping a peer makes it unreachable rather
//! than keeping it alive.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use segrun_engine::{Destination, PeerTransport, TransportError};

use crate::peer::Peer;

/// Routes payloads to registered peers by node id.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    peers: RwLock<HashMap<String, Weak<Peer>>>,
}

impl MemoryTransport {
    /// Creates a transport with no peers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `peer` reachable under its node id, replacing any previous
    /// registration for that id.
    pub fn register(&self, peer: &Arc<Peer>) {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(peer.node_id().to_string(), Arc::downgrade(peer));
    }

    /// Removes a node id. Returns false if it was not registered.
    pub fn unregister(&self, node_id: &str) -> bool {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(node_id)
            .is_some()
    }

    fn lookup(&self, node_id: &str) -> Option<Arc<Peer>> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(node_id)
            .and_then(Weak::upgrade)
    }
}

impl PeerTransport for MemoryTransport {
    fn send(&self, to: &Destination, payload: &[u8]) -> Result<(), TransportError> {
        let peer = self
            .lookup(&to.peer)
            .ok_or_else(|| TransportError::Unreachable(to.peer.clone()))?;
        peer.deliver(payload)
            .map(|_| ())
            .map_err(|e| TransportError::Other(e.to_string()))
    }
}
