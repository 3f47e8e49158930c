//! Runtime core: lifecycle, relay and command handling.
//!
//! The public entry point is [`EngineService`], built with [`ServiceBuilder`].
//! The pieces it wires together are public too so hosts can test or embed them
//! individually.
//!
//! Modules:
//! - [`lifecycle`]: start/stop state machine, owner of the foreground indicator;
//! - [`dispatcher`]: worker messages to the detailed stream and the log sink;
//! - [`monitor`]: monitor samples to the operational summary;
//! - [`status`]: coarse running flag;
//! - [`command`]: FIFO of client commands;
//! - [`shutdown`]: OS signal handling.

mod builder;
mod command;
mod config;
mod dispatcher;
mod lifecycle;
mod log;
mod monitor;
mod service;
mod shutdown;
mod status;

pub use builder::ServiceBuilder;
pub use command::{Command, CommandHandle, CommandLoop};
pub use config::{NotificationConfig, ServiceConfig};
pub use dispatcher::EventDispatcher;
pub use lifecycle::{LifecycleController, LifecycleState};
pub use log::{LogSink, TracingLog};
pub use monitor::{MonitorAggregator, OperationalSummary, StartClock};
pub use service::{EngineService, ServiceIntent};
pub use status::StatusNotifier;
