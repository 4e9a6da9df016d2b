//! Segment execution.
//!
//! The executor runs a segment's steps strictly in order against one
//! session. Each step is validated immediately before it runs:
//! 1. The opcode is registered
//! 2. The operand count fits the command's arity
//! 3. Every `Var` input is bound
//!
//! A mux step applies all three checks to every branch before it reads
//! the selector, so an invalid branch fails the step whichever branch
//! would have been chosen.
//!
//! Values other peers delivered into the session's inbox are bound before
//! each step, ahead of its snapshot, so a failing step never undoes a
//! delivery.
//!
//! The store is snapshotted before every step. When a step fails, its own
//! partial effects are discarded by restoring the snapshot, execution
//! stops, and the effects of every earlier step remain. So a failure at
//! position k leaves exactly the store that steps `[0, k)` produced.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;

use thiserror::Error;

use segrun_foundation::{Error, Result};

use crate::commands::CommandContext;
use crate::config::EngineConfig;
use crate::context::{
    AuxStore, Destination, LogEvent, LogSink, NullAuxStore, NullSink, NullTransport,
    PeerTransport, TransportError,
};
use crate::operand::Operand;
use crate::registry::{CommandRegistry, CommandSpec, Response};
use crate::segment::{Invocation, Segment, Step};
use crate::session::Session;

// =============================================================================
// Outcome
// =============================================================================

/// One attempted delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transmission {
    /// Destination peer.
    pub peer: String,
    /// Name the value was sent under.
    pub name: String,
    /// The transport's verdict.
    pub result: std::result::Result<(), TransportError>,
}

impl Transmission {
    /// Returns true if the payload was delivered.
    #[must_use]
    pub fn delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of a segment that ran to completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// One response per step, in step order.
    pub responses: Vec<Response>,
    /// Every delivery attempted, in order.
    pub transmissions: Vec<Transmission>,
}

/// A segment stopped by a failing step.
///
/// Deliveries cannot be rolled back with the store, so every transmission
/// attempted before and during the failing step is reported here.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("step {position} ({opcode}) failed: {error}")]
pub struct Failure {
    /// Position of the failing step.
    pub position: usize,
    /// Opcode of the failing step.
    pub opcode: String,
    /// What went wrong, with opcode and position attached as context.
    pub error: Error,
    /// Responses of the steps that completed, in step order.
    pub responses: Vec<Response>,
    /// Every delivery attempted, including those of the failing step.
    pub transmissions: Vec<Transmission>,
}

// =============================================================================
// Executor
// =============================================================================

/// Transport calls that may still be running, timed out or not, before new
/// sends are refused.
pub const MAX_PENDING_TRANSPORT_CALLS: usize = 64;

/// One slot of the pending-call budget, released when dropped.
struct PendingCall(Arc<AtomicUsize>);

impl PendingCall {
    fn acquire(counter: &Arc<AtomicUsize>) -> Option<Self> {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < MAX_PENDING_TRANSPORT_CALLS).then_some(n + 1)
            })
            .ok()
            .map(|_| Self(Arc::clone(counter)))
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Runs segments against sessions.
///
/// An executor holds the immutable registry, the configuration, and the
/// collaborators. It carries no per-session state and can be shared
/// across threads.
#[derive(Clone)]
pub struct Executor {
    registry: Arc<CommandRegistry>,
    config: EngineConfig,
    transport: Arc<dyn PeerTransport>,
    aux: Arc<dyn AuxStore>,
    sink: Arc<dyn LogSink>,
    pending: Arc<AtomicUsize>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(Arc::new(CommandRegistry::standard()))
    }
}

impl Executor {
    /// Creates an executor with null collaborators and default settings.
    #[must_use]
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self {
            registry,
            config: EngineConfig::default(),
            transport: Arc::new(NullTransport),
            aux: Arc::new(NullAuxStore),
            sink: Arc::new(NullSink),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the peer transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn PeerTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the auxiliary store.
    #[must_use]
    pub fn with_aux_store(mut self, aux: Arc<dyn AuxStore>) -> Self {
        self.aux = aux;
        self
    }

    /// Sets the log sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The registry.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// The auxiliary store.
    #[must_use]
    pub fn aux(&self) -> &dyn AuxStore {
        self.aux.as_ref()
    }

    /// Creates a session using this executor's configuration.
    #[must_use]
    pub fn new_session(&self) -> Session {
        Session::new(&self.config)
    }

    /// Hands an event to the sink, ignoring sink failures.
    pub fn emit(&self, event: &LogEvent) {
        let _ = self.sink.record(event);
    }

    /// Runs every step of `segment` in order.
    ///
    /// # Errors
    ///
    /// Returns a [`Failure`] for the first step that fails. The store then
    /// holds exactly the effects of the steps before it.
    pub fn execute(
        &self,
        session: &mut Session,
        segment: &Segment,
    ) -> std::result::Result<Outcome, Failure> {
        self.emit(&LogEvent::SegmentStart {
            session: session.label().map(str::to_string),
            segment: segment.id.clone(),
            steps: segment.len(),
        });

        let mut outcome = Outcome::default();
        for (position, step) in segment.steps.iter().enumerate() {
            let opcode = step.opcode();
            if self.config.trace_commands {
                self.emit(&LogEvent::CommandStart {
                    position,
                    opcode: opcode.to_string(),
                });
            }

            session.bind_delivered();
            let snapshot = session.store().snapshot();
            match self.run_step(session, step, &mut outcome.transmissions) {
                Ok(response) => {
                    outcome.responses.push(response);
                    if self.config.trace_commands {
                        self.emit(&LogEvent::CommandEnd {
                            position,
                            opcode: opcode.to_string(),
                        });
                    }
                }
                Err(error) => {
                    session.store_mut().restore(snapshot);
                    let context = error
                        .context
                        .clone()
                        .unwrap_or_default()
                        .with_opcode(opcode)
                        .with_position(position);
                    let error = error.with_context(context);
                    self.emit(&LogEvent::CommandFailed {
                        position,
                        opcode: opcode.to_string(),
                        error: error.clone(),
                    });
                    self.emit(&LogEvent::SegmentEnd {
                        completed: position,
                        failed: true,
                    });
                    return Err(Failure {
                        position,
                        opcode: opcode.to_string(),
                        error,
                        responses: outcome.responses,
                        transmissions: outcome.transmissions,
                    });
                }
            }
        }

        self.emit(&LogEvent::SegmentEnd {
            completed: segment.len(),
            failed: false,
        });
        Ok(outcome)
    }

    /// Validates and runs a single invocation outside of any segment.
    ///
    /// # Errors
    ///
    /// Returns the command's error. Unlike [`execute`](Self::execute), the
    /// store is not restored on failure.
    pub fn invoke(&self, session: &mut Session, invocation: &Invocation) -> Result<Response> {
        let mut transmissions = Vec::new();
        self.call(session, invocation, &mut transmissions)
    }

    fn run_step(
        &self,
        session: &mut Session,
        step: &Step,
        transmissions: &mut Vec<Transmission>,
    ) -> Result<Response> {
        match step {
            Step::Call(invocation) => self.call(session, invocation, transmissions),
            Step::Mux { selector, branches } => {
                for branch in branches {
                    self.resolve(branch)?
                        .check_inputs(&branch.operands, session.store())?;
                }
                let k = self.selector(session, selector)?;
                let branch = usize::try_from(k)
                    .ok()
                    .and_then(|i| branches.get(i))
                    .ok_or_else(|| Error::index_out_of_range(k, branches.len()))?;
                self.call(session, branch, transmissions)
            }
        }
    }

    fn resolve(&self, invocation: &Invocation) -> Result<&CommandSpec> {
        self.registry
            .resolve(&invocation.opcode, invocation.operands.len())
    }

    fn selector(&self, session: &Session, selector: &Operand) -> Result<i64> {
        match selector {
            Operand::Var(name) => session.store().get(name)?.single_int(),
            literal => literal.literal_value()?.single_int(),
        }
    }

    fn call(
        &self,
        session: &mut Session,
        invocation: &Invocation,
        transmissions: &mut Vec<Transmission>,
    ) -> Result<Response> {
        let spec = self.resolve(invocation)?;
        spec.check_inputs(&invocation.operands, session.store())?;
        let mut ctx = CommandContext::new(&invocation.opcode, session, self, transmissions);
        (spec.run)(&mut ctx, &invocation.operands)
    }

    // =========================================================================
    // Transport calls
    // =========================================================================

    /// Sends one payload, giving up after the configured timeout.
    pub(crate) fn send(
        &self,
        dest: Destination,
        payload: Vec<u8>,
    ) -> std::result::Result<(), TransportError> {
        let transport = Arc::clone(&self.transport);
        self.with_timeout(move || transport.send(&dest, &payload))
    }

    /// Sends one payload to several peers. If the transport does not answer
    /// within the timeout, every peer is reported as timed out.
    pub(crate) fn broadcast(
        &self,
        dests: Vec<Destination>,
        payload: Vec<u8>,
    ) -> Vec<std::result::Result<(), TransportError>> {
        let count = dests.len();
        let transport = Arc::clone(&self.transport);
        match self.with_timeout(move || Ok(transport.broadcast(&dests, &payload))) {
            Ok(results) => results,
            Err(e) => vec![Err(e); count],
        }
    }

    fn with_timeout<T, F>(&self, call: F) -> std::result::Result<T, TransportError>
    where
        T: Send + 'static,
        F: FnOnce() -> std::result::Result<T, TransportError> + Send + 'static,
    {
        let timeout = self.config.transmit_timeout;
        let slot = PendingCall::acquire(&self.pending).ok_or_else(|| {
            TransportError::Other(format!(
                "{MAX_PENDING_TRANSPORT_CALLS} transport calls are still pending"
            ))
        })?;
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("segrun-transmit".to_string())
            .spawn(move || {
                let _slot = slot;
                let _ = tx.send(call());
            })
            .map_err(|e| TransportError::Other(e.to_string()))?;
        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(TransportError::Timeout(timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(TransportError::Other(
                "transport worker exited without answering".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("commands", &self.registry.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
