//! # Lifecycle controller: couples the worker to the foreground indicator.
//!
//! ```text
//!                request_start()                 worker.start() ok, no stop
//!  NotStarted ─────────────────► Starting ─────────────────────────────► Running
//!      │                            │                                       │
//!      │ request_stop()             │ request_stop()                        │ request_stop()
//!      ▼                            ▼                                       ▼
//!  StoppedBeforeStart        StoppingRequested ── start completes ──► Stopped ◄──┘
//!  (absorbing)                 (enter + exit, worker.stop())
//! ```
//!
//! ## Rules
//! - The indicator is entered at most once and exited at most once.
//! - `request_stop()` sets the stopping flag *before* taking the state lock, and the
//!   start path checks the flag *under* the lock, so a stop racing with a start can
//!   never leave the indicator up or the worker running unsupervised.
//! - A start in flight is never cancelled; the stop is honored once it completes.
//! - Both requests end by cancelling the service token, except a successful start.
//! - No retry: `WorkerUnavailable` is logged, returned and terminal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::monitor::StartClock;
use crate::error::ServiceError;
use crate::presentation::{Notification, Presenter};
use crate::worker::WorkerHandle;

/// Phase of the service lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing requested yet.
    NotStarted,
    /// `WorkerHandle::start` in flight.
    Starting,
    /// Worker started and indicator shown.
    Running,
    /// Stop requested while the start was still in flight.
    StoppingRequested,
    /// Terminal state after a start.
    Stopped,
    /// Stop arrived before any start; further starts are ignored.
    StoppedBeforeStart,
}

impl LifecycleState {
    /// Whether no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Stopped | LifecycleState::StoppedBeforeStart
        )
    }
}

struct Inner {
    state: LifecycleState,
    entered: bool,
    exited: bool,
}

/// Gates start/stop requests against the worker and the presenter.
pub struct LifecycleController {
    worker: Arc<dyn WorkerHandle>,
    presenter: Arc<dyn Presenter>,
    notification: Notification,
    clock: Arc<StartClock>,
    stopping: AtomicBool,
    inner: Mutex<Inner>,
    token: CancellationToken,
}

impl LifecycleController {
    /// Creates a controller; `token` is cancelled when the service context must end.
    pub fn new(
        worker: Arc<dyn WorkerHandle>,
        presenter: Arc<dyn Presenter>,
        notification: Notification,
        clock: Arc<StartClock>,
        token: CancellationToken,
    ) -> Self {
        Self {
            worker,
            presenter,
            notification,
            clock,
            stopping: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                state: LifecycleState::NotStarted,
                entered: false,
                exited: false,
            }),
            token,
        }
    }

    /// Starts the worker and enters the foreground indicator.
    ///
    /// Only the first call from `NotStarted` has effect. Fails with
    /// [`ServiceError::WorkerUnavailable`] when the worker cannot be started; the
    /// service token is cancelled in that case.
    pub async fn request_start(&self) -> Result<(), ServiceError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != LifecycleState::NotStarted {
                debug!(state = ?inner.state, "start request ignored");
                return Ok(());
            }
            inner.state = LifecycleState::Starting;
        }

        let started = self.worker.start().await;

        let mut inner = self.inner.lock().await;
        match started {
            Ok(true) => self.clock.reset(),
            Ok(false) => debug!("worker was already running"),
            Err(e) => {
                error!(error = %e, label = e.as_label(), "worker start failed");
                inner.state = LifecycleState::Stopped;
                drop(inner);
                self.token.cancel();
                return Err(e);
            }
        }

        if self.is_stopping() {
            debug!("stop requested during start; leaving foreground immediately");
            self.enter(&mut inner);
            self.exit(&mut inner);
            self.worker.stop().await;
            inner.state = LifecycleState::Stopped;
            drop(inner);
            self.token.cancel();
        } else {
            self.enter(&mut inner);
            inner.state = LifecycleState::Running;
            info!("worker running");
        }
        Ok(())
    }

    /// Stops the worker and leaves the foreground. Idempotent.
    pub async fn request_stop(&self) {
        self.stopping.store(true, Ordering::Release);

        let mut inner = self.inner.lock().await;
        match inner.state {
            LifecycleState::NotStarted => inner.state = LifecycleState::StoppedBeforeStart,
            LifecycleState::Starting => inner.state = LifecycleState::StoppingRequested,
            LifecycleState::Running => {
                inner.state = LifecycleState::StoppingRequested;
                self.worker.stop().await;
                self.exit(&mut inner);
                inner.state = LifecycleState::Stopped;
                info!("worker stopped");
            }
            LifecycleState::StoppingRequested
            | LifecycleState::Stopped
            | LifecycleState::StoppedBeforeStart => {}
        }
        drop(inner);
        self.token.cancel();
    }

    /// Current phase.
    pub async fn state(&self) -> LifecycleState {
        self.inner.lock().await.state
    }

    /// Whether a stop has been requested.
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Clock reset on every successful start.
    pub fn clock(&self) -> &Arc<StartClock> {
        &self.clock
    }

    fn enter(&self, inner: &mut Inner) {
        if !inner.entered {
            self.presenter.enter_foreground(&self.notification);
            inner.entered = true;
        }
    }

    fn exit(&self, inner: &mut Inner) {
        if inner.entered && !inner.exited {
            self.presenter.exit_foreground();
            inner.exited = true;
        }
    }
}
