//! Worker messages, stream items and the broadcast bus.
//!
//! ## Contents
//! - [`Message`], [`MessageKind`], [`Payload`], [`MonitorSample`]: what the worker emits
//! - [`MessageEvent`], [`StatusEvent`], [`ServiceEvent`]: what the service publishes
//! - [`Bus`]: thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `EventDispatcher` (detailed stream), `StatusNotifier` (coarse stream).
//! - **Consumers**: host receivers from `EngineService::subscribe_*` and the
//!   subscriber listener feeding `SubscriberSet`.

mod bus;
mod message;
mod wire;

pub use bus::Bus;
pub use message::{Message, MessageKind, MonitorSample, Payload};
pub use wire::{MessageEvent, ServiceEvent, StatusEvent};
