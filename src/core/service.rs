//! # EngineService: the host-facing supervisor.
//!
//! Owns every runtime piece around one [`WorkerHandle`] and exposes the entry
//! points a host calls on its own lifecycle callbacks.
//!
//! ## Wiring
//! ```text
//! WorkerHandle ── on_message ──► EventDispatcher ──► Bus<MessageEvent> ──┬──► subscribe_messages()
//!                                      │                                 │
//!                                      ├──► LogSink                      ├──► subscriber listener
//!                                      └──► MonitorAggregator ─► render  │        │
//!                                                                        │        ▼
//! CommandHandle ─► CommandLoop ─► StatusNotifier ─► Bus<StatusEvent> ────┴──► SubscriberSet
//!                      └──► LifecycleController ──► enter/exit foreground
//! ```
//!
//! ## Shutdown path
//! ```text
//! stop_service() / Command::Stop / signal
//!   └─► LifecycleController::request_stop()  ─► worker.stop(), exit foreground
//!        └─► token.cancel()                  ─► terminated() resolves, command loop exits
//! shutdown()
//!   ├─► worker.remove_listener(dispatcher)
//!   └─► subscriber listener drains both buses, then SubscriberSet::shutdown()
//! ```

use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::builder::ServiceBuilder;
use super::command::{CommandHandle, CommandLoop};
use super::config::ServiceConfig;
use super::lifecycle::{LifecycleController, LifecycleState};
use super::monitor::{MonitorAggregator, OperationalSummary};
use super::shutdown;
use super::status::StatusNotifier;
use crate::error::ServiceError;
use crate::events::{Bus, MessageEvent, StatusEvent};
use crate::presentation::Presenter;
use crate::worker::{MessageListener, WorkerHandle};

/// What the host asks the service to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceIntent {
    /// Start the worker and enter the foreground.
    Start,
    /// Stop the worker and end the service.
    Stop,
}

/// Supervises one worker for the lifetime of a host service.
pub struct EngineService {
    pub(super) cfg: ServiceConfig,
    pub(super) worker: Arc<dyn WorkerHandle>,
    pub(super) lifecycle: Arc<LifecycleController>,
    pub(super) dispatcher: Arc<dyn MessageListener>,
    pub(super) notifier: Arc<StatusNotifier>,
    pub(super) monitor: Arc<MonitorAggregator>,
    pub(super) messages: Bus<MessageEvent>,
    pub(super) status: Bus<StatusEvent>,
    pub(super) commands: Arc<CommandLoop>,
    pub(super) command_task: OnceLock<JoinHandle<()>>,
    pub(super) token: CancellationToken,
    pub(super) listener_stop: CancellationToken,
    pub(super) listener: Mutex<Option<JoinHandle<()>>>,
    pub(super) version: Arc<str>,
}

impl EngineService {
    /// Returns a builder for `worker`, rendering through `presenter`.
    pub fn builder(
        cfg: ServiceConfig,
        worker: Arc<dyn WorkerHandle>,
        presenter: Arc<dyn Presenter>,
    ) -> ServiceBuilder {
        ServiceBuilder::new(cfg, worker, presenter)
    }

    /// Starts the worker. Idempotent; see [`LifecycleController::request_start`].
    pub async fn start_service(&self) -> Result<(), ServiceError> {
        self.lifecycle.request_start().await
    }

    /// Stops the worker and terminates the service. Idempotent.
    pub async fn stop_service(&self) {
        self.lifecycle.request_stop().await;
    }

    /// Dispatches a host intent.
    ///
    /// A failed start terminates the service; the error is returned for the host's records.
    pub async fn handle_intent(&self, intent: ServiceIntent) -> Result<(), ServiceError> {
        debug!(?intent, "intent received");
        match intent {
            ServiceIntent::Start => self.start_service().await,
            ServiceIntent::Stop => {
                self.stop_service().await;
                Ok(())
            }
        }
    }

    /// Returns a client handle to the command loop.
    ///
    /// The loop is spawned on the first call; every handle feeds the same FIFO.
    pub fn bind(&self) -> CommandHandle {
        self.command_task
            .get_or_init(|| Arc::clone(&self.commands).run(self.token.clone()));
        self.commands.handle()
    }

    /// Receiver of the detailed message stream.
    pub fn subscribe_messages(&self) -> broadcast::Receiver<MessageEvent> {
        self.messages.subscribe()
    }

    /// Receiver of the coarse status stream.
    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusEvent> {
        self.status.subscribe()
    }

    /// Publishes the running flag right away, bypassing the command queue.
    pub fn emit_status(&self) -> bool {
        self.notifier.emit_status()
    }

    /// Latest operational summary.
    pub fn summary(&self) -> Option<OperationalSummary> {
        self.monitor.summary()
    }

    pub async fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state().await
    }

    /// Worker version resolved at build time (or the configured fallback).
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.cfg
    }

    /// Resolves once the service context has ended (stop or failed start).
    pub async fn terminated(&self) {
        self.token.cancelled().await;
    }

    /// Parks until a termination signal or the end of the service, then shuts down.
    ///
    /// Signal registration errors are returned after the shutdown completed.
    pub async fn run_until_signal(&self) -> std::io::Result<()> {
        let res = tokio::select! {
            res = shutdown::wait_for_shutdown_signal() => res,
            _ = self.terminated() => Ok(()),
        };
        self.shutdown().await;
        res
    }

    /// Stops the worker if needed, unregisters the dispatcher and drains subscribers.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        self.lifecycle.request_stop().await;
        self.worker.remove_listener(&self.dispatcher);

        self.listener_stop.cancel();
        if let Some(listener) = self.listener.lock().await.take() {
            let _ = listener.await;
        }
        info!("engine service shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Message, MessageKind, MonitorSample, ServiceEvent};
    use crate::subscribers::Subscribe;
    use crate::testing::{FakeWorker, RecordingLog, RecordingPresenter, provider};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Collect(StdMutex<Vec<ServiceEvent>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &ServiceEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    struct Fixture {
        svc: Arc<EngineService>,
        worker: Arc<FakeWorker>,
        presenter: Arc<RecordingPresenter>,
        log: Arc<RecordingLog>,
        collect: Arc<Collect>,
    }

    async fn fixture(worker: Arc<FakeWorker>) -> Fixture {
        let presenter = Arc::new(RecordingPresenter::default());
        let log = Arc::new(RecordingLog::default());
        let collect = Arc::new(Collect::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![collect.clone()];
        let svc = EngineService::builder(ServiceConfig::default(), worker.clone(), presenter.clone())
            .with_provider(provider())
            .with_log_sink(log.clone())
            .with_subscribers(subs)
            .build()
            .await
            .unwrap();
        Fixture {
            svc,
            worker,
            presenter,
            log,
            collect,
        }
    }

    #[tokio::test]
    async fn start_relays_messages_and_logs() {
        let f = fixture(FakeWorker::healthy()).await;
        let mut rx = f.svc.subscribe_messages();

        f.svc.handle_intent(ServiceIntent::Start).await.unwrap();

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, MessageKind::ProcessStarted);
        assert_eq!(ev.integer, 4242);
        assert_eq!(f.presenter.enters(), 1);
        let lines = f.log.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.starts_with("fake-engine 1.0 started (pid 4242)"));
        assert!(f.svc.is_running());
        assert_eq!(f.svc.lifecycle_state().await, LifecycleState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_updates_render_without_logging() {
        let f = fixture(FakeWorker::healthy()).await;
        f.svc.start_service().await.unwrap();
        tokio::time::advance(Duration::from_secs(24)).await;

        f.worker
            .emit(&Message::monitor_update(MonitorSample::new(4242, 5.0, "2048")));

        let summary = f.svc.summary().unwrap();
        assert_eq!(summary.running_time(), "Running time: 24s");
        assert_eq!(summary.memory_bytes, 2048 * 1024);
        assert_eq!(f.presenter.renders().len(), 1);
        assert_eq!(f.log.lines().len(), 1, "only the start line is logged");
    }

    #[tokio::test]
    async fn bound_clients_share_one_queue() {
        let f = fixture(FakeWorker::healthy()).await;
        let mut status = f.svc.subscribe_status();
        f.svc.start_service().await.unwrap();

        let a = f.svc.bind();
        let b = f.svc.bind();
        a.request_status_emission().await.unwrap();
        assert_eq!(status.recv().await.unwrap(), StatusEvent { running: true });

        b.request_stop().await.unwrap();
        f.svc.terminated().await;
        assert!(!f.worker.is_running());
        assert_eq!(f.presenter.exits(), 1);
        assert_eq!(f.svc.lifecycle_state().await, LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn failed_start_terminates_service() {
        let f = fixture(FakeWorker::unavailable("binary missing")).await;

        let err = f.svc.handle_intent(ServiceIntent::Start).await.unwrap_err();

        assert_eq!(err.as_label(), "worker_unavailable");
        f.svc.terminated().await;
        assert!(f.presenter.calls().is_empty());
    }

    #[tokio::test]
    async fn stop_intent_before_start_is_absorbing() {
        let f = fixture(FakeWorker::healthy()).await;

        f.svc.handle_intent(ServiceIntent::Stop).await.unwrap();
        f.svc.handle_intent(ServiceIntent::Start).await.unwrap();

        assert_eq!(
            f.svc.lifecycle_state().await,
            LifecycleState::StoppedBeforeStart
        );
        assert_eq!(f.worker.starts(), 0);
    }

    #[tokio::test]
    async fn shutdown_unregisters_and_drains_subscribers() {
        let f = fixture(FakeWorker::healthy()).await;
        assert_eq!(f.worker.listener_count(), 1);
        let mut status = f.svc.subscribe_status();

        f.svc.start_service().await.unwrap();
        assert!(f.svc.emit_status());
        status.recv().await.unwrap();

        f.svc.shutdown().await;
        f.svc.shutdown().await;

        assert_eq!(f.worker.listener_count(), 0);
        assert!(!f.worker.is_running());

        let seen = f.collect.0.lock().unwrap().clone();
        let kinds: Vec<_> = seen
            .iter()
            .filter_map(|e| match e {
                ServiceEvent::Message(m) => Some(m.kind),
                ServiceEvent::Status(_) => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![MessageKind::ProcessStarted, MessageKind::ProcessTerminated]
        );
        assert!(seen.contains(&ServiceEvent::Status(StatusEvent { running: true })));

        // Worker messages after shutdown no longer reach the service.
        let mut rx = f.svc.subscribe_messages();
        f.worker.emit(&Message::info("late"));
        assert!(rx.try_recv().is_err());
    }
}
