//! # Worker handle contract and implementations.
//!
//! - [`WorkerHandle`]: what the supervisor needs from the engine process
//! - [`MessageListener`]: observer capability registered on a worker
//! - [`ListenerSet`]: registry helper for worker implementations
//! - [`ProcessWorker`] (feature `process`): child-process worker sampled with `sysinfo`

mod handle;
mod listeners;
#[cfg(feature = "process")]
mod process;

pub use handle::{MessageListener, WorkerHandle};
pub use listeners::ListenerSet;
#[cfg(feature = "process")]
pub use process::{ProcessWorker, ProcessWorkerConfig};
