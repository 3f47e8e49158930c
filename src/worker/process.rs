//! # Reference worker: the engine binary as a child process.
//!
//! [`ProcessWorker`] implements [`WorkerHandle`] on top of [`tokio::process`].
//!
//! ```text
//! start()
//!   ├─► spawn binary (stdout/stderr piped, kill_on_drop)
//!   ├─► queue ProcessStarted{pid}
//!   ├─► relay task (stdout) ──► ProcessInfo / ProcessWarn / ProcessError ─┐
//!   ├─► relay task (stderr) ──► ProcessWarn / ProcessError ───────────────┤
//!   ├─► monitor task ── every monitor_interval ──► MonitorUpdate ─────────┤
//!   │                   (process vanished)     ──► MonitorFailed, exit ───┤ mpsc
//!   ├─► waiter task ── child exits or stop() ─┐                           │
//!   │                  await monitor, relays  └──► ProcessTerminated ─────┤
//!   └─► emitter task ◄────────────────────────────────────────────────────┘
//!                     └─► ListenerSet::notify (one message at a time)
//! ```
//!
//! Listeners are only ever called from the emitter task, so they see one
//! sequential stream. `ProcessTerminated` is always the last message of a
//! session and `stop()` returns once it has been delivered.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::handle::{MessageListener, WorkerHandle};
use super::listeners::ListenerSet;
use crate::error::ServiceError;
use crate::events::{Message, MonitorSample};

/// Lower bound for the sampling period.
const MIN_MONITOR_INTERVAL: Duration = Duration::from_millis(100);

/// How long output relays may keep reading after the process exited.
///
/// A grandchild inheriting the pipes can hold them open indefinitely.
const OUTPUT_DRAIN: Duration = Duration::from_secs(2);

/// Capacity of the per-session message queue.
const QUEUE_CAPACITY: usize = 256;

/// Configuration of a [`ProcessWorker`].
#[derive(Clone, Debug)]
pub struct ProcessWorkerConfig {
    /// Engine executable (absolute path or name resolved through `PATH`).
    pub binary: PathBuf,
    /// Arguments passed on start.
    pub args: Vec<String>,
    /// Period between two monitor samples (min 100ms; clamped).
    pub monitor_interval: Duration,
    /// Single argument that makes the binary print its version and exit.
    pub version_flag: String,
}

impl Default for ProcessWorkerConfig {
    /// Default configuration:
    ///
    /// - `binary = "aria2c"`
    /// - `args = []`
    /// - `monitor_interval = 1s`
    /// - `version_flag = "--version"`
    fn default() -> Self {
        Self {
            binary: PathBuf::from("aria2c"),
            args: Vec::new(),
            monitor_interval: Duration::from_secs(1),
            version_flag: "--version".to_string(),
        }
    }
}

/// Live child process bookkeeping.
struct Session {
    token: CancellationToken,
    waiter: JoinHandle<()>,
    emitter: JoinHandle<()>,
}

impl Session {
    /// Waits until the process is reaped and every queued message was delivered.
    async fn finish(self) {
        if let Err(e) = self.waiter.await {
            warn!(error = %e, "worker waiter task failed");
        }
        if let Err(e) = self.emitter.await {
            warn!(error = %e, "worker emitter task failed");
        }
    }
}

/// Tasks the waiter joins before reporting the exit.
struct Feeders {
    monitor: JoinHandle<()>,
    /// Time the monitor gets to notice a natural exit before it is cancelled.
    monitor_grace: Duration,
    relays: Vec<JoinHandle<()>>,
}

/// Worker backed by a child process.
pub struct ProcessWorker {
    cfg: ProcessWorkerConfig,
    listeners: Arc<ListenerSet>,
    running: Arc<AtomicBool>,
    session: Mutex<Option<Session>>,
}

impl ProcessWorker {
    /// Creates a worker; nothing is spawned until [`WorkerHandle::start`].
    pub fn new(cfg: ProcessWorkerConfig) -> Self {
        Self {
            cfg,
            listeners: Arc::new(ListenerSet::new()),
            running: Arc::new(AtomicBool::new(false)),
            session: Mutex::new(None),
        }
    }

    fn command_line(&self) -> String {
        let mut line = self.cfg.binary.display().to_string();
        for arg in &self.cfg.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn unavailable(&self, err: impl std::fmt::Display) -> ServiceError {
        ServiceError::unavailable(format!("{}: {err}", self.cfg.binary.display()))
    }
}

#[async_trait]
impl WorkerHandle for ProcessWorker {
    async fn start(&self) -> Result<bool, ServiceError> {
        let mut session = self.session.lock().await;
        if self.running.load(Ordering::Acquire) {
            return Ok(false);
        }
        // Reap a session whose process already exited on its own.
        if let Some(old) = session.take() {
            old.token.cancel();
            old.finish().await;
        }

        let mut child = Command::new(&self.cfg.binary)
            .args(&self.cfg.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.unavailable(e))?;
        let Some(pid) = child.id() else {
            return Err(self.unavailable("exited before it could be observed"));
        };

        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let emitter = tokio::spawn(emit(rx, Arc::clone(&self.listeners)));

        self.running.store(true, Ordering::Release);
        let _ = tx
            .send(Message::process_started(pid, self.command_line()))
            .await;

        let mut relays = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            relays.push(tokio::spawn(relay_output(stdout, tx.clone(), false)));
        }
        if let Some(stderr) = child.stderr.take() {
            relays.push(tokio::spawn(relay_output(stderr, tx.clone(), true)));
        }

        let token = CancellationToken::new();
        let every = self.cfg.monitor_interval.max(MIN_MONITOR_INTERVAL);
        let monitor = tokio::spawn(monitor(pid, every, tx.clone(), token.clone()));
        let waiter = tokio::spawn(wait_exit(
            child,
            token.clone(),
            Feeders {
                monitor,
                monitor_grace: every + OUTPUT_DRAIN,
                relays,
            },
            tx,
            Arc::clone(&self.running),
        ));

        debug!(pid, binary = %self.cfg.binary.display(), "worker process spawned");
        *session = Some(Session {
            token,
            waiter,
            emitter,
        });
        Ok(true)
    }

    async fn stop(&self) {
        let Some(session) = self.session.lock().await.take() else {
            return;
        };
        session.token.cancel();
        session.finish().await;
    }

    async fn version(&self) -> Result<String, ServiceError> {
        let output = Command::new(&self.cfg.binary)
            .arg(&self.cfg.version_flag)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.unavailable(e))?;

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| self.unavailable("empty version output"))
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn add_listener(&self, listener: Arc<dyn MessageListener>) {
        self.listeners.add(listener);
    }

    fn remove_listener(&self, listener: &Arc<dyn MessageListener>) {
        self.listeners.remove(listener);
    }
}

/// Maps one output line onto a message kind using the engine's level markers.
pub(crate) fn classify_line(line: &str, stderr: bool) -> Message {
    if line.contains("[ERROR]") {
        Message::error(line)
    } else if line.contains("[WARN]") || stderr {
        Message::warn(line)
    } else {
        Message::info(line)
    }
}

/// Delivers queued messages to the listeners, one at a time.
async fn emit(mut rx: mpsc::Receiver<Message>, listeners: Arc<ListenerSet>) {
    while let Some(msg) = rx.recv().await {
        listeners.notify(&msg);
    }
}

async fn relay_output<R>(stream: R, tx: mpsc::Sender<Message>, stderr: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                if tx.send(classify_line(&line, stderr)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, stderr, "worker output stream failed");
                break;
            }
        }
    }
}

/// Samples the process until it vanishes or `token` is cancelled.
///
/// `MonitorFailed` is sent at most once and never after cancellation: `stop()`
/// cancels before it kills, so a deliberate stop is never reported as a failure.
async fn monitor(pid: u32, every: Duration, tx: mpsc::Sender<Message>, token: CancellationToken) {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    let mut ticker = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let msg = match system.process(pid) {
            Some(process) => Message::monitor_update(MonitorSample::new(
                pid.as_u32(),
                process.cpu_usage(),
                (process.memory() / 1024).to_string(),
            )),
            None if token.is_cancelled() => break,
            None => {
                let _ = tx
                    .send(Message::monitor_failed(format!("process {pid} not found")))
                    .await;
                break;
            }
        };
        if tx.send(msg).await.is_err() {
            break;
        }
    }
}

async fn wait_exit(
    mut child: Child,
    token: CancellationToken,
    feeders: Feeders,
    tx: mpsc::Sender<Message>,
    running: Arc<AtomicBool>,
) {
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = token.cancelled() => None,
    };
    let status = match exited {
        Some(status) => status,
        None => {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill worker process");
            }
            child.wait().await
        }
    };
    running.store(false, Ordering::Release);

    // On a natural exit the monitor reports the vanished process on its next tick.
    let mut monitor = feeders.monitor;
    if tokio::time::timeout(feeders.monitor_grace, &mut monitor)
        .await
        .is_err()
    {
        token.cancel();
        if let Err(e) = monitor.await {
            warn!(error = %e, "worker monitor task failed");
        }
    }
    token.cancel();

    for relay in feeders.relays {
        let abort = relay.abort_handle();
        if tokio::time::timeout(OUTPUT_DRAIN, relay).await.is_err() {
            abort.abort();
            debug!("worker output still open after exit; remaining lines dropped");
        }
    }

    let code = match status {
        Ok(status) => status.code().unwrap_or(-1),
        Err(e) => {
            warn!(error = %e, "failed to reap worker process");
            -1
        }
    };
    let _ = tx.send(Message::process_terminated(code)).await;
}
