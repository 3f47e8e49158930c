use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::command::CommandLoop;
use super::config::ServiceConfig;
use super::dispatcher::EventDispatcher;
use super::lifecycle::LifecycleController;
use super::log::{LogSink, TracingLog};
use super::monitor::{MonitorAggregator, StartClock};
use super::service::EngineService;
use super::status::StatusNotifier;
use crate::error::ServiceError;
use crate::events::{Bus, MessageEvent, ServiceEvent, StatusEvent};
use crate::presentation::{self, ConfigProvider, Presenter};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::worker::{MessageListener, WorkerHandle};

/// Builder for constructing an [`EngineService`].
pub struct ServiceBuilder {
    cfg: ServiceConfig,
    worker: Arc<dyn WorkerHandle>,
    presenter: Arc<dyn Presenter>,
    provider: Option<Arc<dyn ConfigProvider>>,
    log: Arc<dyn LogSink>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ServiceBuilder {
    pub fn new(
        cfg: ServiceConfig,
        worker: Arc<dyn WorkerHandle>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            cfg,
            worker,
            presenter,
            provider: None,
            log: Arc::new(TracingLog),
            subscribers: Vec::new(),
        }
    }

    /// Sets the source of icons and launch target. Required.
    pub fn with_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replaces the default [`TracingLog`] sink for worker log lines.
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Sets subscribers fed with both streams through dedicated workers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the service.
    ///
    /// - validates the provider (missing or blank values are fatal)
    /// - queries the worker version once, falling back to `unknown_version`
    /// - registers the dispatcher on the worker
    /// - spawns the subscriber listener (when subscribers are set)
    ///
    /// Must be called within a tokio runtime.
    pub async fn build(self) -> Result<Arc<EngineService>, ServiceError> {
        let provider = self
            .provider
            .ok_or_else(|| ServiceError::ProviderMisconfigured {
                reason: "no configuration provider".to_string(),
            })?;
        presentation::validate(provider.as_ref())?;

        let version: Arc<str> = match self.worker.version().await {
            Ok(v) => v.into(),
            Err(e) => {
                warn!(error = %e, fallback = %self.cfg.unknown_version, "worker version unavailable");
                self.cfg.unknown_version.as_str().into()
            }
        };

        let notification = self.cfg.notification.template(provider.as_ref());
        let token = CancellationToken::new();
        let clock = Arc::new(StartClock::new());
        let messages = Bus::new(self.cfg.message_capacity_clamped());
        let status = Bus::new(self.cfg.status_capacity_clamped());

        let monitor = Arc::new(MonitorAggregator::new(
            Some(Arc::clone(&self.presenter)),
            notification.clone(),
            provider.launcher_icon(),
            Arc::clone(&clock),
        ));
        let dispatcher: Arc<dyn MessageListener> = Arc::new(EventDispatcher::new(
            messages.clone(),
            self.log,
            Arc::clone(&monitor),
            Arc::clone(&version),
        ));

        let lifecycle = Arc::new(LifecycleController::new(
            Arc::clone(&self.worker),
            self.presenter,
            notification,
            clock,
            token.clone(),
        ));
        let notifier = Arc::new(StatusNotifier::new(
            Arc::clone(&self.worker),
            status.clone(),
        ));
        let commands = CommandLoop::new(
            self.cfg.command_capacity_clamped(),
            Arc::clone(&notifier),
            Arc::clone(&lifecycle),
        );

        let listener_stop = CancellationToken::new();
        let listener = (!self.subscribers.is_empty()).then(|| {
            tokio::spawn(subscriber_listener(
                messages.subscribe(),
                status.subscribe(),
                SubscriberSet::new(self.subscribers),
                listener_stop.clone(),
            ))
        });

        self.worker.add_listener(Arc::clone(&dispatcher));

        Ok(Arc::new(EngineService {
            cfg: self.cfg,
            worker: self.worker,
            lifecycle,
            dispatcher,
            notifier,
            monitor,
            messages,
            status,
            commands,
            command_task: OnceLock::new(),
            token,
            listener_stop,
            listener: Mutex::new(listener),
            version,
        }))
    }
}

/// Forwards both buses into the subscriber set until `stop`, then drains what is buffered.
async fn subscriber_listener(
    mut messages: broadcast::Receiver<MessageEvent>,
    mut status: broadcast::Receiver<StatusEvent>,
    set: SubscriberSet,
    stop: CancellationToken,
) {
    use broadcast::error::{RecvError, TryRecvError};

    loop {
        tokio::select! {
            biased;
            ev = messages.recv() => match ev {
                Ok(ev) => set.emit_arc(Arc::new(ServiceEvent::Message(ev))),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, stream = "messages", "subscriber listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
            ev = status.recv() => match ev {
                Ok(ev) => set.emit_arc(Arc::new(ServiceEvent::Status(ev))),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, stream = "status", "subscriber listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = stop.cancelled() => break,
        }
    }

    loop {
        match messages.try_recv() {
            Ok(ev) => set.emit_arc(Arc::new(ServiceEvent::Message(ev))),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    loop {
        match status.try_recv() {
            Ok(ev) => set.emit_arc(Arc::new(ServiceEvent::Status(ev))),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    set.shutdown().await;
}
