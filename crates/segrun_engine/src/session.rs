//! Sessions: the state a segment runs against.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use segrun_foundation::Value;
use segrun_store::VariableStore;

use crate::config::EngineConfig;
use crate::context::Destination;

// =============================================================================
// Inbox
// =============================================================================

/// Values sent by other peers, waiting to be bound into a session's store.
///
/// An inbox is shared between a session and whoever receives on its
/// behalf. Pushing never waits for the session, so a delivery can land
/// while a segment is running; the executor binds pending values between
/// steps.
#[derive(Clone, Debug, Default)]
pub struct Inbox(Arc<Mutex<Vec<(String, Value)>>>);

impl Inbox {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(String, Value)>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `value` to be bound as `name`.
    pub fn push(&self, name: impl Into<String>, value: Value) {
        self.entries().push((name.into(), value));
    }

    /// Removes every pending value, oldest first.
    #[must_use]
    pub fn take(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut *self.entries())
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

// =============================================================================
// Session
// =============================================================================

/// An execution context: a variable store, a random source, the session's
/// node identity, and the addresses of known peers.
///
/// A session exclusively owns its store. Values reach other sessions only
/// by being pickled and sent, and arrive through the session's [`Inbox`].
pub struct Session {
    store: VariableStore,
    rng: ChaCha20Rng,
    node_id: String,
    peers: BTreeMap<String, String>,
    label: Option<String>,
    inbox: Inbox,
}

impl Session {
    /// Creates an empty session configured by `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self {
            store: VariableStore::new(),
            rng,
            node_id: config.node_id.clone(),
            peers: BTreeMap::new(),
            label: None,
            inbox: Inbox::new(),
        }
    }

    /// Creates a session with a fixed seed and default settings.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(&EngineConfig::default().with_seed(seed))
    }

    /// The variable store.
    #[must_use]
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    /// The variable store, mutably.
    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    /// The session's random source.
    pub fn rng_mut(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }

    /// This session's node id.
    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Changes the node id.
    pub fn set_node_id(&mut self, node_id: impl Into<String>) {
        self.node_id = node_id.into();
    }

    /// The session label, if one was set.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets the session label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// Records a peer's network address.
    pub fn add_peer(&mut self, peer: impl Into<String>, address: impl Into<String>) {
        self.peers.insert(peer.into(), address.into());
    }

    /// Known peers, in id order.
    pub fn peers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.peers.iter().map(|(p, a)| (p.as_str(), a.as_str()))
    }

    /// The destination for a peer, with its address if known.
    #[must_use]
    pub fn destination(&self, peer: &str) -> Destination {
        let dest = Destination::new(peer);
        match self.peers.get(peer) {
            Some(address) => dest.with_address(address.clone()),
            None => dest,
        }
    }

    /// The inbox other peers deliver into.
    #[must_use]
    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    /// Binds every pending delivery into the store, later deliveries of a
    /// name overwriting earlier ones. Returns how many were bound.
    pub fn bind_delivered(&mut self) -> usize {
        let pending = self.inbox.take();
        let count = pending.len();
        for (name, value) in pending {
            self.store.set(name, value);
        }
        count
    }

    /// Empties the store. Identity and peers are kept.
    pub fn clear(&mut self) {
        self.store.clear();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("node_id", &self.node_id)
            .field("label", &self.label)
            .field("peers", &self.peers)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
