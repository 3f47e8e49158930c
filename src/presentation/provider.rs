//! # Presentation configuration provider.
//!
//! A [`ConfigProvider`] supplies the host-specific resources the indicator needs.
//! [`validate`] turns missing or blank values into
//! [`ServiceError::ProviderMisconfigured`] at service construction.

use crate::error::ServiceError;

/// Source of icons and the launch target for the indicator.
pub trait ConfigProvider: Send + Sync + 'static {
    /// Small icon of the indicator.
    fn notification_icon(&self) -> &str;

    /// Icon shown next to the operational summary.
    fn launcher_icon(&self) -> &str;

    /// What the host opens when the indicator is activated.
    fn launch_target(&self) -> &str;
}

/// Provider backed by fixed strings.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    pub notification_icon: String,
    pub launcher_icon: String,
    pub launch_target: String,
}

impl StaticProvider {
    pub fn new(
        notification_icon: impl Into<String>,
        launcher_icon: impl Into<String>,
        launch_target: impl Into<String>,
    ) -> Self {
        Self {
            notification_icon: notification_icon.into(),
            launcher_icon: launcher_icon.into(),
            launch_target: launch_target.into(),
        }
    }
}

impl ConfigProvider for StaticProvider {
    fn notification_icon(&self) -> &str {
        &self.notification_icon
    }

    fn launcher_icon(&self) -> &str {
        &self.launcher_icon
    }

    fn launch_target(&self) -> &str {
        &self.launch_target
    }
}

/// Checks that every value of `provider` is present.
pub(crate) fn validate(provider: &dyn ConfigProvider) -> Result<(), ServiceError> {
    let fields = [
        ("notification_icon", provider.notification_icon()),
        ("launcher_icon", provider.launcher_icon()),
        ("launch_target", provider.launch_target()),
    ];
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(ServiceError::ProviderMisconfigured {
            reason: format!("{name} is empty"),
        }),
        None => Ok(()),
    }
}
