//! Trace record type.

use segrun_engine::LogEvent;

/// A timestamped log event.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceRecord {
    /// Unique record ID, increasing for the tracer's lifetime.
    pub id: u64,
    /// Sequence number of the segment this event belongs to; bumped at each
    /// segment start.
    pub segment: u64,
    /// Timestamp in nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The event.
    pub event: LogEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, segment: u64, timestamp_ns: u64, event: LogEvent) -> Self {
        Self {
            id,
            segment,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.event.kind()
    }

    /// Returns true for segment start and end events.
    #[must_use]
    pub fn is_segment_boundary(&self) -> bool {
        matches!(
            self.event,
            LogEvent::SegmentStart { .. } | LogEvent::SegmentEnd { .. }
        )
    }

    /// Returns true for events emitted by logging commands.
    #[must_use]
    pub fn is_user_event(&self) -> bool {
        matches!(
            self.event,
            LogEvent::Message(_) | LogEvent::Variable { .. } | LogEvent::Stats(_)
        )
    }
}
