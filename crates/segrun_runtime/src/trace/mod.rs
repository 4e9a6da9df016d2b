//! Tracing of segment execution.
//!
//! [`Tracer`] is a [`LogSink`] that keeps recent events in a bounded ring
//! buffer and optionally echoes them to stderr. Recording costs one atomic
//! load when tracing is disabled.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use segrun_engine::{EngineConfig, Executor, Operand, Segment};
//! use segrun_runtime::trace::{Tracer, TracerConfig};
//!
//! let tracer = Arc::new(Tracer::new(TracerConfig::new().enabled()));
//! let executor = Executor::default()
//!     .with_config(EngineConfig::deterministic(1))
//!     .with_sink(tracer.clone());
//! let mut session = executor.new_session();
//! let segment = Segment::new().call("logmessage", vec![Operand::text("hello")]);
//! executor.execute(&mut session, &segment).unwrap();
//! assert_eq!(tracer.by_kind("message").len(), 1);
//! ```

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{TraceBuffer, TraceBufferStats};
pub use format::{HumanFormatter, JsonFormatter, TraceFormatter};
pub use record::TraceRecord;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use segrun_engine::{LogEvent, LogSink, SinkError};

// =============================================================================
// Trace Output
// =============================================================================

/// Where trace output should be sent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceOutput {
    /// No output (traces still recorded in buffer).
    #[default]
    None,
    /// Write each record to stderr as it arrives.
    Stderr,
}

// =============================================================================
// Tracer Configuration
// =============================================================================

/// Configuration for the tracer.
#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// Whether tracing is enabled.
    pub enabled: bool,
    /// Maximum records to keep in buffer.
    pub buffer_size: usize,
    /// Where to output traces.
    pub output: TraceOutput,
    /// Whether to use JSON format for output.
    pub json_format: bool,
    /// Event kinds to keep (empty = all).
    pub event_filter: Vec<String>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: 10_000,
            output: TraceOutput::None,
            json_format: false,
            event_filter: Vec::new(),
        }
    }
}

impl TracerConfig {
    /// Creates a new tracer configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable tracing.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Builder method to set buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Builder method to output to stderr.
    #[must_use]
    pub fn to_stderr(mut self) -> Self {
        self.output = TraceOutput::Stderr;
        self
    }

    /// Builder method to use JSON format.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Builder method to keep only the given event kinds
    /// (see [`LogEvent::kind`]).
    #[must_use]
    pub fn filter_events(mut self, kinds: Vec<String>) -> Self {
        self.event_filter = kinds;
        self
    }
}

// =============================================================================
// Tracer
// =============================================================================

struct TraceState {
    buffer: TraceBuffer,
    segment: u64,
}

/// Records log events into a ring buffer.
///
/// Shared behind an `Arc` by every executor that should feed it.
pub struct Tracer {
    enabled: AtomicBool,
    config: TracerConfig,
    state: Mutex<TraceState>,
    start_time: Instant,
}

impl Tracer {
    /// Creates a new tracer with the given configuration.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
            state: Mutex::new(TraceState {
                buffer: TraceBuffer::new(config.buffer_size),
                segment: 0,
            }),
            config,
            start_time: Instant::now(),
        }
    }

    /// Creates a tracer with default configuration (disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Creates an enabled tracer that outputs to stderr.
    #[must_use]
    pub fn to_stderr() -> Self {
        Self::new(TracerConfig::new().enabled().to_stderr())
    }

    /// Returns whether tracing is enabled.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enables tracing.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disables tracing.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    fn state(&self) -> MutexGuard<'_, TraceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an event. Returns immediately when disabled.
    #[inline]
    pub fn trace(&self, event: &LogEvent) {
        if !self.is_enabled() {
            return;
        }
        self.trace_internal(event);
    }

    fn trace_internal(&self, event: &LogEvent) {
        if !self.config.event_filter.is_empty()
            && !self.config.event_filter.iter().any(|k| k == event.kind())
        {
            return;
        }

        #[allow(clippy::cast_possible_truncation)]
        let timestamp_ns = self.start_time.elapsed().as_nanos() as u64;
        let mut state = self.state();
        if matches!(event, LogEvent::SegmentStart { .. }) {
            state.segment += 1;
        }
        let segment = state.segment;
        state.buffer.push(segment, timestamp_ns, event.clone());

        if self.config.output == TraceOutput::Stderr {
            if let Some(record) = state.buffer.recent(1).first() {
                let _ = writeln!(io::stderr(), "{}", self.format_record(record));
            }
        }
    }

    /// Formats a record using the configured format.
    #[must_use]
    pub fn format_record(&self, record: &TraceRecord) -> String {
        if self.config.json_format {
            JsonFormatter::new().format(record)
        } else {
            HumanFormatter::new().with_timestamps().format(record)
        }
    }

    /// A copy of every buffered record, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<TraceRecord> {
        self.state().buffer.iter().cloned().collect()
    }

    /// A copy of the most recent `count` records.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<TraceRecord> {
        self.state().buffer.recent(count).into_iter().cloned().collect()
    }

    /// A copy of the buffered records of one kind.
    #[must_use]
    pub fn by_kind(&self, kind: &str) -> Vec<TraceRecord> {
        self.state().buffer.by_kind(kind).into_iter().cloned().collect()
    }

    /// Number of buffered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().buffer.len()
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().buffer.is_empty()
    }

    /// Clears the trace buffer.
    pub fn clear(&self) {
        self.state().buffer.clear();
    }

    /// Returns buffer statistics.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        self.state().buffer.stats()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LogSink for Tracer {
    fn record(&self, event: &LogEvent) -> Result<(), SinkError> {
        self.trace(event);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
