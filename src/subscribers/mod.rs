//! # Subscribers: user observers of both service streams.
//!
//! ```text
//! Bus<MessageEvent> ─┐
//!                    ├──► subscriber listener ──► SubscriberSet::emit_arc(ServiceEvent)
//! Bus<StatusEvent>  ─┘                                ├──► [queue] ──► sub1.on_event()
//!                                                     └──► [queue] ──► subN.on_event()
//! ```
//!
//! - [`Subscribe`]: trait implemented by observers (logging, metrics, UI bridges)
//! - [`SubscriberSet`]: bounded per-subscriber queues with panic isolation
//! - `LogWriter` (feature `logging`): prints events to stdout

#[cfg(feature = "logging")]
mod embedded;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
