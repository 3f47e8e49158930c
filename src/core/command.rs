//! # Command loop for bound clients.
//!
//! Clients obtained through [`EngineService::bind`](crate::EngineService::bind) share one
//! bounded FIFO drained by a single task:
//!
//! ```text
//! CommandHandle ─┐
//! CommandHandle ─┼──► mpsc (FIFO) ──► CommandLoop task
//! CommandHandle ─┘                      ├─ EmitStatus ─► StatusNotifier::emit_status()
//!                                       └─ Stop       ─► LifecycleController::request_stop(), exit
//! ```
//!
//! Commands never run concurrently with each other; they may run concurrently
//! with worker event delivery. The loop also exits when the service token is cancelled.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::lifecycle::LifecycleController;
use super::status::StatusNotifier;
use crate::error::CommandError;

/// Requests a bound client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Publish the running flag on the status stream.
    EmitStatus,
    /// Stop the worker and end the service.
    Stop,
}

/// Handle for submitting commands to the loop.
#[derive(Clone, Debug)]
pub struct CommandHandle {
    tx: mpsc::Sender<Command>,
}

impl CommandHandle {
    /// Submits a command (async, waits if the queue is full).
    pub async fn submit(&self, cmd: Command) -> Result<(), CommandError> {
        self.tx.send(cmd).await.map_err(|_| CommandError::Closed)
    }

    /// Submits without waiting (fails if the queue is full).
    pub fn try_submit(&self, cmd: Command) -> Result<(), CommandError> {
        self.tx.try_send(cmd).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CommandError::Full,
            mpsc::error::TrySendError::Closed(_) => CommandError::Closed,
        })
    }

    /// Asks for a status emission.
    pub async fn request_status_emission(&self) -> Result<(), CommandError> {
        self.submit(Command::EmitStatus).await
    }

    /// Asks the service to stop; processed after the commands queued before it.
    pub async fn request_stop(&self) -> Result<(), CommandError> {
        self.submit(Command::Stop).await
    }

    /// Whether the loop has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Serializes client commands on one task.
pub struct CommandLoop {
    notifier: Arc<StatusNotifier>,
    lifecycle: Arc<LifecycleController>,
    tx: mpsc::Sender<Command>,
    rx: Mutex<Option<mpsc::Receiver<Command>>>,
}

impl CommandLoop {
    /// Creates the loop (call [`run`](Self::run) to start draining).
    pub fn new(
        capacity: usize,
        notifier: Arc<StatusNotifier>,
        lifecycle: Arc<LifecycleController>,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Arc::new(Self {
            notifier,
            lifecycle,
            tx,
            rx: Mutex::new(Some(rx)),
        })
    }

    /// Returns a handle for submitting commands.
    pub fn handle(&self) -> CommandHandle {
        CommandHandle {
            tx: self.tx.clone(),
        }
    }

    /// Spawns the draining task. A second call logs and returns immediately.
    pub fn run(self: Arc<Self>, token: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let Some(mut rx) = self.rx.lock().await.take() else {
                warn!("command loop already running");
                return;
            };

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    cmd = rx.recv() => {
                        let Some(cmd) = cmd else { break };
                        if !self.handle_command(cmd).await {
                            break;
                        }
                    }
                }
            }
            rx.close();
            debug!("command loop exited");
        })
    }

    /// Executes one command; returns `false` when the loop must end.
    async fn handle_command(&self, cmd: Command) -> bool {
        debug!(?cmd, "command received");
        match cmd {
            Command::EmitStatus => {
                self.notifier.emit_status();
                true
            }
            Command::Stop => {
                self.lifecycle.request_stop().await;
                false
            }
        }
    }
}
