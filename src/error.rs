//! Error types used by the enginevisor runtime.
//!
//! This module defines two enums:
//!
//! - [`ServiceError`]: failures of the supervisor itself (worker environment,
//!   monitor samples, presentation configuration).
//! - [`CommandError`]: failures to enqueue a command for the command loop.
//!
//! [`ServiceError`] provides helper methods (`as_label`, `as_message`) for logs/metrics.

use thiserror::Error;

/// # Errors produced by the enginevisor runtime.
///
/// None of these are retried by the runtime: the supervisor favors a clean
/// terminal state and leaves retry policy to the host.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The worker environment is unusable (missing binary, spawn failure).
    ///
    /// Fatal to the start attempt that observed it.
    #[error("worker unavailable: {reason}")]
    WorkerUnavailable {
        /// What made the environment unusable.
        reason: String,
    },

    /// A monitor sample could not be parsed; the sample is dropped.
    #[error("malformed monitor sample: {field}={value:?}")]
    MalformedSample {
        /// Name of the offending field.
        field: &'static str,
        /// Raw value as received from the worker.
        value: String,
    },

    /// Presentation configuration (icons, launch target) is absent or empty.
    ///
    /// Fatal at service construction.
    #[error("provider misconfigured: {reason}")]
    ProviderMisconfigured {
        /// Which part of the configuration is missing.
        reason: String,
    },
}

impl ServiceError {
    /// Shorthand for [`ServiceError::WorkerUnavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ServiceError::WorkerUnavailable {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use enginevisor::ServiceError;
    ///
    /// let err = ServiceError::unavailable("aria2c not found");
    /// assert_eq!(err.as_label(), "worker_unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::WorkerUnavailable { .. } => "worker_unavailable",
            ServiceError::MalformedSample { .. } => "malformed_sample",
            ServiceError::ProviderMisconfigured { .. } => "provider_misconfigured",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServiceError::WorkerUnavailable { reason } => format!("unavailable: {reason}"),
            ServiceError::MalformedSample { field, value } => {
                format!("malformed: {field}={value:?}")
            }
            ServiceError::ProviderMisconfigured { reason } => format!("misconfigured: {reason}"),
        }
    }
}

/// Error returned by [`CommandHandle`](crate::CommandHandle) submissions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Command queue is full (try again later or use the async variant).
    #[error("command queue full")]
    Full,

    /// Command loop is gone (service terminated).
    #[error("command loop closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let sample = ServiceError::MalformedSample {
            field: "rss",
            value: "12k".into(),
        };
        assert_eq!(sample.as_label(), "malformed_sample");
        assert_eq!(sample.as_message(), "malformed: rss=\"12k\"");

        let provider = ServiceError::ProviderMisconfigured {
            reason: "no provider".into(),
        };
        assert_eq!(provider.as_label(), "provider_misconfigured");
    }

    #[test]
    fn display_includes_reason() {
        let err = ServiceError::unavailable("binary missing");
        assert_eq!(err.to_string(), "worker unavailable: binary missing");
        assert_eq!(CommandError::Closed.to_string(), "command loop closed");
    }
}
