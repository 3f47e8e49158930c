//! # Messages emitted by the worker.
//!
//! A [`Message`] is the envelope a [`WorkerHandle`](crate::WorkerHandle) hands to its
//! listeners: a [`MessageKind`], an integer payload whose meaning depends on the kind,
//! and a typed [`Payload`].
//!
//! | Kind                | `integer`           | `payload`               | Log level |
//! |---------------------|---------------------|-------------------------|-----------|
//! | `ProcessStarted`    | pid                 | `Text` (command line)   | INFO      |
//! | `ProcessTerminated` | exit code (-1 = signal) | `Empty`             | INFO/WARN |
//! | `ProcessInfo`       | 0                   | `Text`                  | INFO      |
//! | `ProcessWarn`       | 0                   | `Text`                  | WARN      |
//! | `ProcessError`      | 0                   | `Text`                  | ERROR     |
//! | `MonitorFailed`     | 0                   | `Text` (reason)         | ERROR     |
//! | `MonitorUpdate`     | pid                 | `Sample`                | TRACE     |
//!
//! Messages are immutable once built; the constructors keep kind and payload consistent.
//!
//! ## Example
//! ```rust
//! use enginevisor::{Message, MessageKind, MonitorSample};
//!
//! let msg = Message::monitor_update(MonitorSample::new(1234, 5.0, "2048"));
//! assert_eq!(msg.kind(), MessageKind::MonitorUpdate);
//! assert_eq!(msg.integer(), 1234);
//! assert!(msg.sample().is_some());
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::ServiceError;

/// Classification of worker messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Worker process was spawned.
    ProcessStarted,
    /// Worker process exited.
    ProcessTerminated,
    /// Informational output line.
    ProcessInfo,
    /// Warning output line.
    ProcessWarn,
    /// Error output line.
    ProcessError,
    /// Resource sampling of the worker failed.
    MonitorFailed,
    /// Periodic resource sample (high frequency).
    MonitorUpdate,
}

impl MessageKind {
    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            MessageKind::ProcessStarted => "process_started",
            MessageKind::ProcessTerminated => "process_terminated",
            MessageKind::ProcessInfo => "process_info",
            MessageKind::ProcessWarn => "process_warn",
            MessageKind::ProcessError => "process_error",
            MessageKind::MonitorFailed => "monitor_failed",
            MessageKind::MonitorUpdate => "monitor_update",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One resource sample of the worker process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSample {
    /// Worker process id.
    pub pid: u32,
    /// CPU usage in percent.
    pub cpu: f32,
    /// Resident memory in kilobytes, as reported (numeric text).
    pub rss: String,
}

impl MonitorSample {
    /// Creates a sample.
    pub fn new(pid: u32, cpu: f32, rss: impl Into<String>) -> Self {
        Self {
            pid,
            cpu,
            rss: rss.into(),
        }
    }

    /// Parses the resident memory into bytes.
    ///
    /// Fails with [`ServiceError::MalformedSample`] when `rss` is not an integer.
    pub fn rss_bytes(&self) -> Result<u64, ServiceError> {
        let kb: u64 = self
            .rss
            .trim()
            .parse()
            .map_err(|_| ServiceError::MalformedSample {
                field: "rss",
                value: self.rss.clone(),
            })?;
        Ok(kb.saturating_mul(1024))
    }
}

/// Typed payload of a [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No payload.
    Empty,
    /// Text payload (output line, command line, failure reason).
    Text(Arc<str>),
    /// Resource sample (only on `MonitorUpdate`).
    Sample(MonitorSample),
}

impl Payload {
    /// Converts the payload into its wire representation.
    ///
    /// Returns `None` for [`Payload::Empty`] or when the value cannot be represented.
    pub fn to_wire(&self) -> Option<serde_json::Value> {
        match self {
            Payload::Empty => None,
            Payload::Text(text) => Some(serde_json::Value::String(text.to_string())),
            Payload::Sample(sample) => serde_json::to_value(sample).ok(),
        }
    }
}

/// Envelope emitted by the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    kind: MessageKind,
    integer: i64,
    payload: Payload,
}

impl Message {
    fn text(kind: MessageKind, integer: i64, text: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            integer,
            payload: Payload::Text(text.into()),
        }
    }

    /// Worker process spawned with `pid` using `command`.
    pub fn process_started(pid: u32, command: impl Into<Arc<str>>) -> Self {
        Self::text(MessageKind::ProcessStarted, i64::from(pid), command)
    }

    /// Worker process exited with `exit_code` (-1 when killed by a signal).
    pub fn process_terminated(exit_code: i32) -> Self {
        Self {
            kind: MessageKind::ProcessTerminated,
            integer: i64::from(exit_code),
            payload: Payload::Empty,
        }
    }

    /// Informational output line.
    pub fn info(line: impl Into<Arc<str>>) -> Self {
        Self::text(MessageKind::ProcessInfo, 0, line)
    }

    /// Warning output line.
    pub fn warn(line: impl Into<Arc<str>>) -> Self {
        Self::text(MessageKind::ProcessWarn, 0, line)
    }

    /// Error output line.
    pub fn error(line: impl Into<Arc<str>>) -> Self {
        Self::text(MessageKind::ProcessError, 0, line)
    }

    /// Sampling failed for `reason`.
    pub fn monitor_failed(reason: impl Into<Arc<str>>) -> Self {
        Self::text(MessageKind::MonitorFailed, 0, reason)
    }

    /// Periodic resource sample.
    pub fn monitor_update(sample: MonitorSample) -> Self {
        Self {
            kind: MessageKind::MonitorUpdate,
            integer: i64::from(sample.pid),
            payload: Payload::Sample(sample),
        }
    }

    #[inline]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    #[inline]
    pub fn integer(&self) -> i64 {
        self.integer
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the sample carried by a `MonitorUpdate`.
    #[inline]
    pub fn sample(&self) -> Option<&MonitorSample> {
        match &self.payload {
            Payload::Sample(sample) => Some(sample),
            _ => None,
        }
    }

    #[inline]
    pub fn is_monitor_update(&self) -> bool {
        matches!(self.kind, MessageKind::MonitorUpdate)
    }

    /// Level at which [`to_log_line`](Self::to_log_line) should be recorded.
    pub fn log_level(&self) -> Level {
        match self.kind {
            MessageKind::ProcessStarted | MessageKind::ProcessInfo => Level::INFO,
            MessageKind::ProcessTerminated if self.integer == 0 => Level::INFO,
            MessageKind::ProcessTerminated | MessageKind::ProcessWarn => Level::WARN,
            MessageKind::ProcessError | MessageKind::MonitorFailed => Level::ERROR,
            MessageKind::MonitorUpdate => Level::TRACE,
        }
    }

    /// Renders the message for the log sink, prefixed by the worker version.
    pub fn to_log_line(&self, version: &str) -> String {
        let text = match &self.payload {
            Payload::Text(text) => text.as_ref(),
            _ => "",
        };
        match self.kind {
            MessageKind::ProcessStarted => {
                format!("{version} started (pid {}): {text}", self.integer)
            }
            MessageKind::ProcessTerminated => {
                format!("{version} terminated with exit code {}", self.integer)
            }
            MessageKind::ProcessInfo | MessageKind::ProcessWarn | MessageKind::ProcessError => {
                format!("{version}: {text}")
            }
            MessageKind::MonitorFailed => format!("{version}: monitor failed: {text}"),
            MessageKind::MonitorUpdate => match self.sample() {
                Some(s) => format!("{version}: pid={} cpu={}% rss={}kB", s.pid, s.cpu, s.rss),
                None => format!("{version}: monitor update"),
            },
        }
    }
}
