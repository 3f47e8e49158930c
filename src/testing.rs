//! Fakes shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::Level;

use crate::core::LogSink;
use crate::error::ServiceError;
use crate::events::Message;
use crate::presentation::{Notification, Presenter, StaticProvider};
use crate::worker::{ListenerSet, MessageListener, WorkerHandle};

pub(crate) fn provider() -> Arc<StaticProvider> {
    Arc::new(StaticProvider::new(
        "ic_engine",
        "ic_launcher",
        "app://downloads",
    ))
}

/// In-memory worker with scripted outcomes.
pub(crate) struct FakeWorker {
    listeners: ListenerSet,
    running: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
    unavailable: Option<String>,
    version_fails: bool,
    gate: Option<Semaphore>,
}

impl FakeWorker {
    fn with(unavailable: Option<String>, version_fails: bool, gated: bool) -> Arc<Self> {
        Arc::new(Self {
            listeners: ListenerSet::new(),
            running: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            unavailable,
            version_fails,
            gate: gated.then(|| Semaphore::new(0)),
        })
    }

    pub(crate) fn healthy() -> Arc<Self> {
        Self::with(None, false, false)
    }

    pub(crate) fn unavailable(reason: &str) -> Arc<Self> {
        Self::with(Some(reason.to_string()), false, false)
    }

    pub(crate) fn without_version() -> Arc<Self> {
        Self::with(None, true, false)
    }

    /// `start()` blocks until [`release`](Self::release) is called.
    pub(crate) fn gated() -> Arc<Self> {
        Self::with(None, false, true)
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub(crate) fn emit(&self, msg: &Message) {
        self.listeners.notify(msg);
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Waits until `start()` has been entered `n` times.
    pub(crate) async fn wait_for_starts(&self, n: usize) {
        while self.starts() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl WorkerHandle for FakeWorker {
    async fn start(&self) -> Result<bool, ServiceError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(reason) = &self.unavailable {
            return Err(ServiceError::unavailable(reason.clone()));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        self.listeners.notify(&Message::process_started(4242, "fake-engine"));
        Ok(true)
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.running.swap(false, Ordering::SeqCst) {
            self.listeners.notify(&Message::process_terminated(0));
        }
    }

    async fn version(&self) -> Result<String, ServiceError> {
        if self.version_fails {
            Err(ServiceError::unavailable("no version"))
        } else {
            Ok("fake-engine 1.0".to_string())
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn add_listener(&self, listener: Arc<dyn MessageListener>) {
        self.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &Arc<dyn MessageListener>) {
        self.listeners.remove(listener);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PresenterCall {
    Enter(Notification),
    Exit,
    Render(Notification),
}

#[derive(Default)]
pub(crate) struct RecordingPresenter {
    calls: Mutex<Vec<PresenterCall>>,
}

impl RecordingPresenter {
    pub(crate) fn calls(&self) -> Vec<PresenterCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn enters(&self) -> usize {
        self.count(|c| matches!(c, PresenterCall::Enter(_)))
    }

    pub(crate) fn exits(&self) -> usize {
        self.count(|c| matches!(c, PresenterCall::Exit))
    }

    pub(crate) fn renders(&self) -> Vec<Notification> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PresenterCall::Render(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn count(&self, f: impl Fn(&PresenterCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| f(c)).count()
    }
}

impl Presenter for RecordingPresenter {
    fn enter_foreground(&self, notification: &Notification) {
        self.calls
            .lock()
            .unwrap()
            .push(PresenterCall::Enter(notification.clone()));
    }

    fn exit_foreground(&self) {
        self.calls.lock().unwrap().push(PresenterCall::Exit);
    }

    fn render(&self, notification: &Notification) {
        self.calls
            .lock()
            .unwrap()
            .push(PresenterCall::Render(notification.clone()));
    }
}

#[derive(Default)]
pub(crate) struct RecordingLog {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingLog {
    pub(crate) fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }
}

impl LogSink for RecordingLog {
    fn append(&self, level: Level, line: String) {
        self.lines.lock().unwrap().push((level, line));
    }
}
