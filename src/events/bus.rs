//! # Broadcast bus for the service's outgoing streams.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] used for both local
//! publish/subscribe channels of the service:
//!
//! ```text
//! Publishers:                                   Receivers (many):
//!   EventDispatcher ──► Bus<MessageEvent> ──┬──► subscribe_messages() (hosts)
//!                       (detailed stream)   └──► subscriber listener ──► SubscriberSet
//!   StatusNotifier  ──► Bus<StatusEvent>  ──┬──► subscribe_status()   (hosts)
//!                       (coarse stream)     └──► subscriber listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent items for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: items are lost if there are no active receivers at send time.
//! - **Process-local**: nothing here is visible outside the host process.

use tokio::sync::broadcast;

/// Broadcast channel for one of the service streams.
///
/// Multiple publishers can publish concurrently; receivers get clones of each item.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Debug)]
pub struct Bus<T> {
    tx: broadcast::Sender<T>,
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone> Bus<T> {
    /// Creates a new bus with the given channel capacity.
    ///
    /// The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<T>(capacity);
        Self { tx }
    }

    /// Publishes an item to all active receivers.
    ///
    /// Returns the number of receivers that will observe it (0 when nobody listens;
    /// the item is dropped in that case).
    pub fn publish(&self, item: T) -> usize {
        self.tx.send(item).unwrap_or(0)
    }

    /// Creates a new receiver that observes items **sent after** this call.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
