//! # Service configuration.
//!
//! Provides [`ServiceConfig`], centralized settings for one [`EngineService`](crate::EngineService),
//! and [`NotificationConfig`], the static part of the persistent indicator.
//!
//! ## Sentinel values
//! - `message_capacity = 0`, `status_capacity = 0`, `command_capacity = 0` → clamped to 1

use crate::presentation::{ConfigProvider, Notification};

/// Static content of the persistent indicator.
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    /// Stable indicator id.
    pub id: u32,
    /// Host channel/category id.
    pub channel_id: String,
    /// Indicator title.
    pub title: String,
    /// Indicator body shown until the first monitor sample arrives.
    pub text: String,
}

impl NotificationConfig {
    /// Builds the indicator template using the provider's resources.
    pub(crate) fn template(&self, provider: &dyn ConfigProvider) -> Notification {
        Notification {
            id: self.id,
            channel_id: self.channel_id.clone(),
            title: self.title.clone(),
            text: self.text.clone(),
            small_icon: provider.notification_icon().to_string(),
            launch_target: provider.launch_target().to_string(),
            ongoing: true,
            summary: None,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            id: 4,
            channel_id: "engine-service".to_string(),
            title: "Download engine service".to_string(),
            text: "Download engine is running...".to_string(),
        }
    }
}

/// Configuration for the service runtime.
///
/// ## Field semantics
/// - `message_capacity`: ring buffer size of the detailed stream (min 1)
/// - `status_capacity`: ring buffer size of the coarse stream (min 1)
/// - `command_capacity`: bound of the command FIFO shared by all clients (min 1)
/// - `unknown_version`: version label used when the worker cannot report one
/// - `notification`: static indicator content
///
/// ## Notes
/// All fields are public. Prefer the clamped accessors over reading the raw capacities.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Capacity of the detailed message stream.
    ///
    /// Receivers lagging more than this many messages observe `Lagged` and skip.
    /// Monitor samples flow through here too, so keep it generous.
    pub message_capacity: usize,

    /// Capacity of the coarse status stream.
    pub status_capacity: usize,

    /// Capacity of the command queue.
    ///
    /// When full, `CommandHandle::submit` waits and `try_submit` fails with `Full`.
    pub command_capacity: usize,

    /// Version label used when `WorkerHandle::version` fails.
    pub unknown_version: String,

    /// Persistent indicator content.
    pub notification: NotificationConfig,
}

impl ServiceConfig {
    #[inline]
    pub fn message_capacity_clamped(&self) -> usize {
        self.message_capacity.max(1)
    }

    #[inline]
    pub fn status_capacity_clamped(&self) -> usize {
        self.status_capacity.max(1)
    }

    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }
}

impl Default for ServiceConfig {
    /// Default configuration:
    ///
    /// - `message_capacity = 1024`
    /// - `status_capacity = 16`
    /// - `command_capacity = 64`
    /// - `unknown_version = "engine version [unknown]"`
    fn default() -> Self {
        Self {
            message_capacity: 1024,
            status_capacity: 16,
            command_capacity: 64,
            unknown_version: "engine version [unknown]".to_string(),
            notification: NotificationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::StaticProvider;

    #[test]
    fn zero_capacities_are_clamped() {
        let cfg = ServiceConfig {
            message_capacity: 0,
            status_capacity: 0,
            command_capacity: 0,
            ..ServiceConfig::default()
        };
        assert_eq!(cfg.message_capacity_clamped(), 1);
        assert_eq!(cfg.status_capacity_clamped(), 1);
        assert_eq!(cfg.command_capacity_clamped(), 1);
    }

    #[test]
    fn template_uses_provider_resources() {
        let provider = StaticProvider::new("ic_small", "ic_launcher", "app://main");
        let n = NotificationConfig::default().template(&provider);
        assert_eq!(n.small_icon, "ic_small");
        assert_eq!(n.launch_target, "app://main");
        assert!(n.ongoing);
        assert!(n.summary.is_none());
    }
}
