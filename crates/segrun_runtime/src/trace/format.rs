//! Trace output formatters.
//!
//! Provides human-readable and JSON formatters for trace records.

use std::fmt::Write;

use segrun_engine::LogEvent;

use super::record::TraceRecord;

// =============================================================================
// Trace Formatter Trait
// =============================================================================

/// Trait for formatting trace records.
pub trait TraceFormatter {
    /// Formats a single trace record to a string.
    fn format(&self, record: &TraceRecord) -> String;

    /// Formats multiple records, one per line.
    fn format_many(&self, records: &[&TraceRecord]) -> String {
        records
            .iter()
            .map(|r| self.format(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Human-Readable Formatter
// =============================================================================

/// Formats trace records in human-readable form.
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    /// Whether to include timestamps.
    pub show_timestamps: bool,
    /// Whether to include record IDs.
    pub show_ids: bool,
}

impl HumanFormatter {
    /// Creates a new human formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to show timestamps.
    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamps = true;
        self
    }

    /// Builder method to show record IDs.
    #[must_use]
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_timestamp(ns: u64) -> String {
        let us = ns / 1000;
        if us >= 1_000_000 {
            format!("{:.3}s", us as f64 / 1_000_000.0)
        } else if us >= 1000 {
            format!("{:.3}ms", us as f64 / 1000.0)
        } else {
            format!("{us}us")
        }
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let mut prefix = String::new();
        if self.show_ids {
            let _ = write!(prefix, "[{:06}] ", record.id);
        }
        let _ = write!(prefix, "S{:04} ", record.segment);
        if self.show_timestamps {
            let _ = write!(
                prefix,
                "{:>10} ",
                Self::format_timestamp(record.timestamp_ns)
            );
        }

        let event = match &record.event {
            LogEvent::SegmentStart {
                session,
                segment,
                steps,
            } => {
                let id = segment.as_deref().unwrap_or("-");
                match session {
                    Some(label) => format!("=== SEGMENT {id} START ({steps} steps, session {label}) ==="),
                    None => format!("=== SEGMENT {id} START ({steps} steps) ==="),
                }
            }
            LogEvent::SegmentEnd { completed, failed } => {
                let status = if *failed { "FAILED" } else { "OK" };
                format!("=== SEGMENT END ({completed} completed, {status}) ===")
            }
            LogEvent::CommandStart { position, opcode } => format!("  >> [{position}] {opcode}"),
            LogEvent::CommandEnd { position, opcode } => format!("  << [{position}] {opcode}"),
            LogEvent::CommandFailed {
                position,
                opcode,
                error,
            } => format!("  !! [{position}] {opcode}: {error}"),
            LogEvent::Message(text) => format!("  MESSAGE {text}"),
            LogEvent::Variable { name, value } => match value {
                Some(value) => format!("  VARIABLE {name} = {value}"),
                None => format!("  VARIABLE {name} unbound"),
            },
            LogEvent::Stats(stats) => format!("  STATS {stats}"),
        };

        format!("{prefix}{event}")
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

/// Formats trace records as single-line JSON objects.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Creates a new JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn escape(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    fn string(s: &str) -> String {
        format!("\"{}\"", Self::escape(s))
    }

    fn optional(s: Option<&str>) -> String {
        s.map_or_else(|| "null".to_string(), Self::string)
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let data = match &record.event {
            LogEvent::SegmentStart {
                session,
                segment,
                steps,
            } => format!(
                "\"session\":{},\"segment_id\":{},\"steps\":{steps}",
                Self::optional(session.as_deref()),
                Self::optional(segment.as_deref())
            ),
            LogEvent::SegmentEnd { completed, failed } => {
                format!("\"completed\":{completed},\"failed\":{failed}")
            }
            LogEvent::CommandStart { position, opcode }
            | LogEvent::CommandEnd { position, opcode } => {
                format!("\"position\":{position},\"opcode\":{}", Self::string(opcode))
            }
            LogEvent::CommandFailed {
                position,
                opcode,
                error,
            } => format!(
                "\"position\":{position},\"opcode\":{},\"error\":{}",
                Self::string(opcode),
                Self::string(&error.to_string())
            ),
            LogEvent::Message(text) => format!("\"text\":{}", Self::string(text)),
            LogEvent::Variable { name, value } => format!(
                "\"name\":{},\"value\":{}",
                Self::string(name),
                Self::optional(value.as_ref().map(ToString::to_string).as_deref())
            ),
            LogEvent::Stats(stats) => format!(
                "\"variables\":{},\"elements\":{},\"bytes\":{}",
                stats.variables, stats.elements, stats.bytes
            ),
        };
        format!(
            "{{\"id\":{},\"segment\":{},\"timestamp_ns\":{},\"kind\":\"{}\",{data}}}",
            record.id,
            record.segment,
            record.timestamp_ns,
            record.kind()
        )
    }
}
