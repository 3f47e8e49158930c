//! # Log sink for worker messages.
//!
//! The [`EventDispatcher`](crate::EventDispatcher) renders every non-monitor
//! message with [`Message::to_log_line`](crate::Message::to_log_line) and appends it
//! to a [`LogSink`]. The default sink, [`TracingLog`], forwards lines to `tracing`
//! under the `enginevisor::engine` target so hosts can filter engine output
//! separately from the supervisor's own diagnostics.

use tracing::Level;

/// Destination of rendered worker log lines.
pub trait LogSink: Send + Sync + 'static {
    /// Appends one line at `level`.
    fn append(&self, level: Level, line: String);
}

/// [`LogSink`] that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn append(&self, level: Level, line: String) {
        match level {
            Level::ERROR => tracing::error!(target: "enginevisor::engine", "{line}"),
            Level::WARN => tracing::warn!(target: "enginevisor::engine", "{line}"),
            Level::INFO => tracing::info!(target: "enginevisor::engine", "{line}"),
            Level::DEBUG => tracing::debug!(target: "enginevisor::engine", "{line}"),
            _ => tracing::trace!(target: "enginevisor::engine", "{line}"),
        }
    }
}
