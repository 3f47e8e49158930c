//! # Built-in subscribers
//!
//! - [`LogWriter`]: prints events in a human-readable form (demo/debug).

mod log;

pub use log::LogWriter;
