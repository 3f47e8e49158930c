//! # Persistent indicator contract.
//!
//! The host renders a persistent "engine is running" indicator (an ongoing
//! notification, a tray entry, a status line). enginevisor only describes *what*
//! to show through [`Notification`] and *when* through [`Presenter`]:
//!
//! - `enter_foreground` / `exit_foreground` are called only by the
//!   [`LifecycleController`](crate::LifecycleController), at most once each;
//! - `render` is called by the [`MonitorAggregator`](crate::MonitorAggregator)
//!   whenever a new operational summary is available.
//!
//! Icons and the launch target come from a [`ConfigProvider`].

mod provider;

pub use provider::{ConfigProvider, StaticProvider};
pub(crate) use provider::validate;

/// Rendered operational summary shown inside the indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    /// e.g. `Running time: 1m 5s`
    pub running_time: String,
    /// e.g. `PID: 1234`
    pub pid: String,
    /// e.g. `CPU: 5%`
    pub cpu: String,
    /// e.g. `Memory: 2.0 MiB`
    pub memory: String,
    /// Icon shown next to the summary.
    pub icon: String,
}

/// Everything the host needs to draw the indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Stable indicator id (re-rendering replaces the previous one).
    pub id: u32,
    /// Host channel/category the indicator belongs to.
    pub channel_id: String,
    pub title: String,
    pub text: String,
    pub small_icon: String,
    /// What the host opens when the indicator is activated.
    pub launch_target: String,
    /// Indicator cannot be dismissed by the user.
    pub ongoing: bool,
    /// Latest operational summary, if any sample arrived yet.
    pub summary: Option<SummaryView>,
}

impl Notification {
    /// Returns a copy of this notification carrying `summary`.
    pub fn with_summary(&self, summary: SummaryView) -> Self {
        Self {
            summary: Some(summary),
            ..self.clone()
        }
    }
}

/// Host-side renderer of the persistent indicator.
pub trait Presenter: Send + Sync + 'static {
    /// Shows the indicator and marks the service as foreground.
    fn enter_foreground(&self, notification: &Notification);

    /// Removes the indicator and leaves the foreground state.
    fn exit_foreground(&self);

    /// Replaces the indicator content.
    fn render(&self, notification: &Notification);
}
