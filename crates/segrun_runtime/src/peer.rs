//! Hosting many sessions on one node.
//!
//! A [`Peer`] owns an [`Executor`] and a table of labelled sessions. Each
//! session sits behind its own lock, so segments for different sessions
//! run concurrently while segments for the same session are serialized.
//!
//! Values sent by other peers arrive through [`Peer::deliver`], which
//! queues them in the session's [`Inbox`] and never waits for a running
//! segment. Two peers can therefore exchange values from segments running
//! in the same session at the same time. Whoever releases a session lock
//! binds anything still queued.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use thiserror::Error;

use segrun_engine::{
    AuxStore, EngineConfig, Executor, Failure, Inbox, LogSink, Outcome, PeerTransport, Segment,
    Session, Transfer,
};
use segrun_foundation::Error;

/// Label of the session that receives transfers sent from unlabelled
/// sessions.
pub const DEFAULT_SESSION: &str = "default";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a peer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerConfig {
    /// Settings handed to the executor. `engine.node_id` is this peer's id.
    pub engine: EngineConfig,
    /// Known peers and their addresses, copied into every new session.
    pub addresses: BTreeMap<String, String>,
}

impl PeerConfig {
    /// Creates a configuration for the node `node_id`.
    #[must_use]
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            engine: EngineConfig::default().with_node_id(node_id),
            addresses: BTreeMap::new(),
        }
    }

    /// Builder method to replace the engine configuration, keeping the
    /// node id.
    #[must_use]
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        let node_id = std::mem::take(&mut self.engine.node_id);
        self.engine = engine.with_node_id(node_id);
        self
    }

    /// Builder method to record a peer address.
    #[must_use]
    pub fn with_address(mut self, peer: impl Into<String>, address: impl Into<String>) -> Self {
        self.addresses.insert(peer.into(), address.into());
        self
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failure of a peer-level operation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PeerError {
    /// Inbound bytes could not be decoded.
    #[error("malformed inbound payload: {0}")]
    Decode(Error),
    /// The segment failed at a step.
    #[error(transparent)]
    Failed(#[from] Failure),
}

// =============================================================================
// Peer
// =============================================================================

type SharedSession = Arc<Mutex<Session>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A session and the inbox it shares, reachable without its lock.
#[derive(Clone)]
struct Slot {
    session: SharedSession,
    inbox: Inbox,
}

impl Slot {
    /// Binds queued deliveries unless another thread holds the session.
    /// That holder settles again after releasing it, so nothing is stranded.
    fn settle(&self) {
        while !self.inbox.is_empty() {
            match self.session.try_lock() {
                Ok(mut session) => {
                    session.bind_delivered();
                }
                Err(TryLockError::Poisoned(poisoned)) => {
                    poisoned.into_inner().bind_delivered();
                }
                Err(TryLockError::WouldBlock) => return,
            }
        }
    }
}

/// A node running segments for any number of sessions.
pub struct Peer {
    executor: Executor,
    addresses: BTreeMap<String, String>,
    sessions: Mutex<HashMap<String, Slot>>,
}

impl Peer {
    /// Creates a peer with the standard command set and null collaborators.
    #[must_use]
    pub fn new(config: PeerConfig) -> Self {
        Self {
            executor: Executor::default().with_config(config.engine),
            addresses: config.addresses,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the transport used by `transmit` and `broadcast`.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn PeerTransport>) -> Self {
        self.executor = self.executor.with_transport(transport);
        self
    }

    /// Sets the auxiliary store.
    #[must_use]
    pub fn with_aux_store(mut self, aux: Arc<dyn AuxStore>) -> Self {
        self.executor = self.executor.with_aux_store(aux);
        self
    }

    /// Sets the log sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.executor = self.executor.with_sink(sink);
        self
    }

    /// This peer's node id.
    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.executor.config().node_id
    }

    /// The executor.
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    fn slot(&self, label: &str) -> Slot {
        let mut sessions = lock(&self.sessions);
        sessions
            .entry(label.to_string())
            .or_insert_with(|| {
                let mut session = self.executor.new_session();
                session.set_label(label);
                for (peer, address) in &self.addresses {
                    session.add_peer(peer.clone(), address.clone());
                }
                Slot {
                    inbox: session.inbox().clone(),
                    session: Arc::new(Mutex::new(session)),
                }
            })
            .clone()
    }

    /// The session labelled `label`, created empty if absent.
    ///
    /// Queued deliveries are bound first when the session is idle.
    #[must_use]
    pub fn session(&self, label: &str) -> SharedSession {
        let slot = self.slot(label);
        slot.settle();
        slot.session
    }

    /// Runs a segment in the session labelled `label`.
    ///
    /// Values delivered while the segment runs are bound between its steps,
    /// or once it ends.
    ///
    /// # Errors
    ///
    /// Returns the [`Failure`] of the first failing step.
    pub fn run(&self, label: &str, segment: &Segment) -> Result<Outcome, Failure> {
        let slot = self.slot(label);
        let result = {
            let mut session = lock(&slot.session);
            let result = self.executor.execute(&mut session, segment);
            session.bind_delivered();
            result
        };
        slot.settle();
        result
    }

    /// Decodes an inbound segment and runs it.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Decode`] for malformed bytes, or
    /// [`PeerError::Failed`] if a step fails.
    pub fn run_encoded(&self, label: &str, bytes: &[u8]) -> Result<Outcome, PeerError> {
        let segment = Segment::from_bytes(bytes).map_err(PeerError::Decode)?;
        Ok(self.run(label, &segment)?)
    }

    /// Accepts a value sent by another peer.
    ///
    /// The value is meant for the session with the sender's label, or for
    /// [`DEFAULT_SESSION`] if the sender had none. It is bound at once if
    /// that session is idle, and otherwise before the running segment's
    /// next step. Returns the label.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Decode`] if the envelope or the value inside it
    /// is malformed.
    pub fn deliver(&self, bytes: &[u8]) -> Result<String, PeerError> {
        let transfer = Transfer::decode(bytes).map_err(PeerError::Decode)?;
        let label = transfer
            .session
            .clone()
            .unwrap_or_else(|| DEFAULT_SESSION.to_string());
        let name = transfer.name.clone();
        let value = transfer.into_value().map_err(PeerError::Decode)?;

        let slot = self.slot(&label);
        slot.inbox.push(name, value);
        slot.settle();
        Ok(label)
    }

    /// Drops a session and its store. Returns false if it did not exist.
    pub fn end_session(&self, label: &str) -> bool {
        lock(&self.sessions).remove(label).is_some()
    }

    /// Labels of open sessions, sorted.
    #[must_use]
    pub fn sessions(&self) -> Vec<String> {
        let mut labels: Vec<String> = lock(&self.sessions).keys().cloned().collect();
        labels.sort();
        labels
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("node_id", &self.node_id())
            .field("sessions", &self.sessions())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segrun_engine::Operand;
    use segrun_foundation::Value;

    fn peer(id: &str) -> Peer {
        Peer::new(PeerConfig::new(id).with_engine(EngineConfig::deterministic(7)))
    }

    #[test]
    fn config_keeps_node_id() {
        let config = PeerConfig::new("3")
            .with_engine(EngineConfig::deterministic(1))
            .with_address("4", "10.0.0.4:9000");
        assert_eq!(config.engine.node_id, "3");
        assert_eq!(config.engine.seed, Some(1));
        assert_eq!(config.addresses.len(), 1);
    }

    #[test]
    fn sessions_are_isolated() {
        let peer = peer("1");
        let set = |v: i64| Segment::new().call("newilist", vec!["x".into(), v.into()]);
        peer.run("a", &set(1)).unwrap();
        peer.run("b", &set(2)).unwrap();

        let a = peer.session("a");
        let b = peer.session("b");
        assert_eq!(lock(&a).store().get("x").unwrap(), &Value::from(vec![1i64]));
        assert_eq!(lock(&b).store().get("x").unwrap(), &Value::from(vec![2i64]));
        assert_eq!(peer.sessions(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn new_sessions_know_peer_addresses() {
        let peer = Peer::new(PeerConfig::new("1").with_address("2", "host:2"));
        let session = peer.session("s");
        let dest = lock(&session).destination("2");
        assert_eq!(dest.address.as_deref(), Some("host:2"));
        assert_eq!(lock(&session).label(), Some("s"));
    }

    #[test]
    fn deliver_binds_in_matching_session() {
        let peer = peer("2");
        let value = Value::from(vec![5i64, 6]);
        let bytes = Transfer::new(Some("s".into()), "1", "y", &value)
            .unwrap()
            .encode()
            .unwrap();
        assert_eq!(peer.deliver(&bytes).unwrap(), "s");
        let session = peer.session("s");
        assert_eq!(lock(&session).store().get("y").unwrap(), &value);
    }

    #[test]
    fn deliver_does_not_wait_for_a_busy_session() {
        let peer = peer("2");
        let value = Value::from(vec![1i64]);
        let bytes = Transfer::new(Some("s".into()), "1", "y", &value)
            .unwrap()
            .encode()
            .unwrap();
        let session = peer.session("s");
        {
            let guard = lock(&session);
            assert_eq!(peer.deliver(&bytes).unwrap(), "s");
            assert!(guard.store().get("y").is_err());
            assert!(!guard.inbox().is_empty());
        }
        assert_eq!(lock(&peer.session("s")).store().get("y").unwrap(), &value);
    }

    #[test]
    fn unlabelled_transfers_use_default_session() {
        let peer = peer("2");
        let bytes = Transfer::new(None, "1", "y", &Value::from(vec![1i64]))
            .unwrap()
            .encode()
            .unwrap();
        assert_eq!(peer.deliver(&bytes).unwrap(), DEFAULT_SESSION);
        assert!(matches!(peer.deliver(&[0xc1]), Err(PeerError::Decode(_))));
    }

    #[test]
    fn encoded_segments_run() {
        let peer = peer("1");
        let segment = Segment::new().call("newilist", vec![Operand::var("x"), 3.into()]);
        let outcome = peer.run_encoded("s", &segment.to_bytes().unwrap()).unwrap();
        assert_eq!(outcome.responses.len(), 1);
        assert!(matches!(peer.run_encoded("s", b"junk"), Err(PeerError::Decode(_))));

        let failing = Segment::new().call("nosuchop", vec![]);
        let err = peer.run_encoded("s", &failing.to_bytes().unwrap()).unwrap_err();
        assert!(matches!(err, PeerError::Failed(f) if f.position == 0));
    }

    #[test]
    fn end_session_drops_state() {
        let peer = peer("1");
        let _ = peer.session("s");
        assert!(peer.end_session("s"));
        assert!(!peer.end_session("s"));
        assert!(peer.sessions().is_empty());
    }
}
