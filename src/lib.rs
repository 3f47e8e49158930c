//! # enginevisor
//!
//! **Enginevisor** supervises one long-running download-engine worker from
//! inside a host process.
//!
//! It starts and stops the worker in step with a persistent foreground
//! indicator, relays the worker's messages to a detailed stream and a coarse
//! status stream, and keeps a live operational summary (running time, PID, CPU,
//! memory) rendered into that indicator.
//!
//! ## Architecture
//! ```text
//!                         ┌────────────────────────────┐
//!                         │  WorkerHandle (engine)     │
//!                         │  e.g. ProcessWorker        │
//!                         └──────┬──────────────▲──────┘
//!                   on_message() │              │ start()/stop()
//!                                ▼              │
//! ┌─────────────────────────────────────────────┴─────────────────────┐
//! │  EngineService                                                    │
//! │  - EventDispatcher   (relay + log sink)                           │
//! │  - MonitorAggregator (operational summary → Presenter::render)    │
//! │  - LifecycleController (start/stop state machine, foreground)     │
//! │  - StatusNotifier    (running flag)                               │
//! │  - CommandLoop       (FIFO of client commands)                    │
//! └──────┬──────────────────────────┬──────────────────────▲──────────┘
//!        ▼                          ▼                      │
//!   Bus<MessageEvent>         Bus<StatusEvent>       CommandHandle (bind())
//!        │                          │
//!        └──────────┬───────────────┘
//!                   ▼
//!         subscriber listener ──► SubscriberSet ──► sub.on_event(&ServiceEvent)
//! ```
//!
//! ### Lifecycle
//! ```text
//! NotStarted ─start─► Starting ─ok─► Running ─stop─► Stopped
//!     │                  │
//!     └─stop─► StoppedBeforeStart (absorbing)
//!                        └─stop─► StoppingRequested ─start completes─► Stopped
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                         |
//! |-------------------|-----------------------------------------------------------|--------------------------------------------|
//! | **Worker**        | Contract for the engine process and a reference impl.     | [`WorkerHandle`], [`MessageListener`]      |
//! | **Streams**       | Detailed messages and coarse status over broadcast.       | [`MessageEvent`], [`StatusEvent`], [`Bus`] |
//! | **Presentation**  | Persistent indicator and its configuration.               | [`Presenter`], [`ConfigProvider`]          |
//! | **Commands**      | Serialized requests from bound clients.                   | [`CommandHandle`], [`Command`]             |
//! | **Subscribers**   | Isolated fan-out of both streams.                         | [`Subscribe`], [`SubscriberSet`]           |
//! | **Errors**        | Typed errors.                                             | [`ServiceError`], [`CommandError`]         |
//! | **Configuration** | Capacities, fallback version and indicator text.          | [`ServiceConfig`]                          |
//!
//! ## Optional features
//! - `process` _(default)_: exports [`ProcessWorker`], sampled with `sysinfo`.
//! - `logging`: exports a simple built-in `LogWriter` subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use enginevisor::{
//!     EngineService, Notification, Presenter, ProcessWorker, ProcessWorkerConfig,
//!     ServiceConfig, ServiceIntent, StaticProvider,
//! };
//!
//! struct Stdout;
//!
//! impl Presenter for Stdout {
//!     fn enter_foreground(&self, n: &Notification) { println!("[fg] {}", n.title); }
//!     fn exit_foreground(&self) { println!("[fg] gone"); }
//!     fn render(&self, n: &Notification) {
//!         if let Some(s) = &n.summary { println!("{} | {}", s.running_time, s.memory); }
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let worker = Arc::new(ProcessWorker::new(ProcessWorkerConfig::default()));
//!     let svc = EngineService::builder(ServiceConfig::default(), worker, Arc::new(Stdout))
//!         .with_provider(Arc::new(StaticProvider::new("ic_engine", "ic_launcher", "app://downloads")))
//!         .build()
//!         .await?;
//!
//!     let mut messages = svc.subscribe_messages();
//!     tokio::spawn(async move {
//!         while let Ok(ev) = messages.recv().await {
//!             println!("{} {}", ev.kind, ev.integer);
//!         }
//!     });
//!
//!     svc.handle_intent(ServiceIntent::Start).await?;
//!     svc.run_until_signal().await?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod presentation;
mod subscribers;
mod worker;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use core::{
    Command, CommandHandle, CommandLoop, EngineService, EventDispatcher, LifecycleController,
    LifecycleState, LogSink, MonitorAggregator, NotificationConfig, OperationalSummary,
    ServiceBuilder, ServiceConfig, ServiceIntent, StartClock, StatusNotifier, TracingLog,
};
pub use error::{CommandError, ServiceError};
pub use events::{
    Bus, Message, MessageEvent, MessageKind, MonitorSample, Payload, ServiceEvent, StatusEvent,
};
pub use presentation::{ConfigProvider, Notification, Presenter, StaticProvider, SummaryView};
pub use subscribers::{Subscribe, SubscriberSet};
pub use worker::{ListenerSet, MessageListener, WorkerHandle};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
#[cfg(feature = "process")]
pub use worker::{ProcessWorker, ProcessWorkerConfig};
