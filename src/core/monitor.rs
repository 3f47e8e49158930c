//! # Operational summary of the running worker.
//!
//! The [`MonitorAggregator`] turns `MonitorUpdate` samples into an
//! [`OperationalSummary`] and asks the presenter to re-render the indicator.
//!
//! ```text
//! worker context ──► EventDispatcher ──► MonitorAggregator::update(sample)
//!                                          ├─ elapsed = StartClock::elapsed()
//!                                          ├─ memory  = rss kB × 1024
//!                                          ├─ store summary
//!                                          └─ Presenter::render(template + SummaryView)
//! ```
//!
//! ## Rules
//! - `None` sample or no presenter → no-op
//! - malformed `rss` → `MalformedSample`, previous summary kept, nothing rendered
//! - only the aggregator writes the summary; everybody else reads snapshots

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ServiceError;
use crate::events::MonitorSample;
use crate::presentation::{Notification, Presenter, SummaryView};

/// Start timestamp of the worker, shared between the lifecycle and the aggregator.
///
/// Stored as an offset from a fixed base so it can be reset without locking.
#[derive(Debug)]
pub struct StartClock {
    base: Instant,
    offset_ms: AtomicU64,
}

impl StartClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    /// Marks "now" as the new start.
    pub fn reset(&self) {
        let ms = self.base.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
        self.offset_ms.store(ms, Ordering::Release);
    }

    /// Time elapsed since the last [`reset`](Self::reset) (or construction).
    pub fn elapsed(&self) -> Duration {
        let offset = Duration::from_millis(self.offset_ms.load(Ordering::Acquire));
        self.base.elapsed().saturating_sub(offset)
    }
}

impl Default for StartClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest operational figures of the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationalSummary {
    /// Time since the worker was started.
    pub elapsed: Duration,
    pub pid: u32,
    /// CPU usage in percent.
    pub cpu: f32,
    /// Resident memory in bytes.
    pub memory_bytes: u64,
}

impl OperationalSummary {
    pub fn running_time(&self) -> String {
        format!("Running time: {}", format_elapsed(self.elapsed.as_secs()))
    }

    pub fn pid_line(&self) -> String {
        format!("PID: {}", self.pid)
    }

    pub fn cpu_line(&self) -> String {
        format!("CPU: {}%", self.cpu)
    }

    pub fn memory_line(&self) -> String {
        format!("Memory: {}", format_bytes(self.memory_bytes))
    }

    /// Renders the summary for the indicator.
    pub fn view(&self, icon: &str) -> SummaryView {
        SummaryView {
            running_time: self.running_time(),
            pid: self.pid_line(),
            cpu: self.cpu_line(),
            memory: self.memory_line(),
            icon: icon.to_string(),
        }
    }
}

/// Maintains the [`OperationalSummary`] from monitor samples.
pub struct MonitorAggregator {
    presenter: Option<Arc<dyn Presenter>>,
    template: Notification,
    icon: String,
    clock: Arc<StartClock>,
    summary: RwLock<Option<OperationalSummary>>,
}

impl MonitorAggregator {
    /// Creates an aggregator rendering through `presenter` (if any).
    pub fn new(
        presenter: Option<Arc<dyn Presenter>>,
        template: Notification,
        icon: impl Into<String>,
        clock: Arc<StartClock>,
    ) -> Self {
        Self {
            presenter,
            template,
            icon: icon.into(),
            clock,
            summary: RwLock::new(None),
        }
    }

    /// Applies one sample.
    ///
    /// Returns the new summary, `Ok(None)` for the no-op cases, or
    /// [`ServiceError::MalformedSample`] when the memory field does not parse.
    pub fn update(
        &self,
        sample: Option<&MonitorSample>,
    ) -> Result<Option<OperationalSummary>, ServiceError> {
        let (Some(sample), Some(presenter)) = (sample, self.presenter.as_ref()) else {
            return Ok(None);
        };

        let summary = OperationalSummary {
            elapsed: self.clock.elapsed(),
            pid: sample.pid,
            cpu: sample.cpu,
            memory_bytes: sample.rss_bytes()?,
        };
        *self.summary.write().unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());

        presenter.render(&self.template.with_summary(summary.view(&self.icon)));
        Ok(Some(summary))
    }

    /// Latest summary, if any sample was applied.
    pub fn summary(&self) -> Option<OperationalSummary> {
        self.summary
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Formats seconds as `45s`, `5m 3s` or `2h 5m 3s`.
fn format_elapsed(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Formats bytes with binary units.
fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else if bytes < GIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    }
}
