//! # Worker handle contract.
//!
//! [`WorkerHandle`] is the seam between the supervisor and the external engine
//! process. The supervisor drives it (start/stop/version/is_running) and registers
//! a [`MessageListener`] to receive the envelopes the worker emits on its own tasks.
//!
//! ## Contract
//! - `start()` returns `Ok(true)` when it actually spawned the worker, `Ok(false)`
//!   when the worker was already running, and `Err(WorkerUnavailable)` when the
//!   environment is unusable.
//! - `stop()` is idempotent and a no-op when nothing was started.
//! - Listeners are called synchronously, in emission order, from the worker's
//!   own execution context.
//!
//! ## Example (skeleton)
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use enginevisor::{ListenerSet, Message, MessageListener, ServiceError, WorkerHandle};
//!
//! #[derive(Default)]
//! struct Null { listeners: ListenerSet }
//!
//! #[async_trait]
//! impl WorkerHandle for Null {
//!     async fn start(&self) -> Result<bool, ServiceError> {
//!         self.listeners.notify(&Message::process_started(1, "null"));
//!         Ok(true)
//!     }
//!     async fn stop(&self) {}
//!     async fn version(&self) -> Result<String, ServiceError> { Ok("null 0.0".into()) }
//!     fn is_running(&self) -> bool { false }
//!     fn add_listener(&self, l: Arc<dyn MessageListener>) { self.listeners.add(l) }
//!     fn remove_listener(&self, l: &Arc<dyn MessageListener>) { self.listeners.remove(l) }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::events::Message;

/// Observer of worker messages.
pub trait MessageListener: Send + Sync + 'static {
    /// Handles one envelope. Must not block for long: it runs on the worker's context.
    fn on_message(&self, msg: &Message);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Handle to the external worker process.
#[async_trait]
pub trait WorkerHandle: Send + Sync + 'static {
    /// Starts the worker. See the module docs for the meaning of the result.
    async fn start(&self) -> Result<bool, ServiceError>;

    /// Stops the worker if it runs; no-op otherwise.
    async fn stop(&self);

    /// Version string of the worker binary.
    async fn version(&self) -> Result<String, ServiceError>;

    /// Whether the worker process is currently alive.
    fn is_running(&self) -> bool;

    /// Registers a listener for emitted messages.
    fn add_listener(&self, listener: Arc<dyn MessageListener>);

    /// Unregisters a listener previously passed to [`add_listener`](Self::add_listener).
    fn remove_listener(&self, listener: &Arc<dyn MessageListener>);
}
