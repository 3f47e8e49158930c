//! # Coarse "is running" stream.
//!
//! [`StatusNotifier`] publishes a [`StatusEvent`] on demand, decoupled from the
//! detailed message stream so lightweight subscribers never parse message kinds.

use std::sync::Arc;

use crate::events::{Bus, StatusEvent};
use crate::worker::WorkerHandle;

/// Publishes the worker's running flag on the status bus.
pub struct StatusNotifier {
    worker: Arc<dyn WorkerHandle>,
    bus: Option<Bus<StatusEvent>>,
}

impl StatusNotifier {
    /// Notifier attached to `bus`.
    pub fn new(worker: Arc<dyn WorkerHandle>, bus: Bus<StatusEvent>) -> Self {
        Self {
            worker,
            bus: Some(bus),
        }
    }

    /// Notifier not attached to any bus yet; `emit_status` is a no-op.
    pub fn detached(worker: Arc<dyn WorkerHandle>) -> Self {
        Self { worker, bus: None }
    }

    /// Publishes the current running flag.
    ///
    /// Returns `false` when the notifier is detached.
    pub fn emit_status(&self) -> bool {
        let Some(bus) = &self.bus else {
            return false;
        };
        bus.publish(StatusEvent {
            running: self.worker.is_running(),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWorker;

    #[tokio::test]
    async fn emits_current_running_flag() {
        let worker = FakeWorker::healthy();
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let notifier = StatusNotifier::new(worker.clone(), bus);

        assert!(notifier.emit_status());
        worker.start().await.unwrap();
        assert!(notifier.emit_status());

        assert_eq!(rx.recv().await.unwrap(), StatusEvent { running: false });
        assert_eq!(rx.recv().await.unwrap(), StatusEvent { running: true });
    }

    #[test]
    fn detached_notifier_is_noop() {
        let notifier = StatusNotifier::detached(FakeWorker::healthy());
        assert!(!notifier.emit_status());
        assert!(!notifier.emit_status());
    }
}
