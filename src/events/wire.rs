//! # Items carried by the two outgoing streams.
//!
//! - [`MessageEvent`]: detailed stream, one per worker [`Message`].
//! - [`StatusEvent`]: coarse stream, a bare "is the worker running" flag.
//! - [`ServiceEvent`]: union of both, as seen by [`Subscribe`](crate::Subscribe) implementations.

use serde::{Deserialize, Serialize};

use super::message::{Message, MessageKind};

/// Detailed-stream item: the transport form of a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Message classification.
    pub kind: MessageKind,
    /// Kind-specific integer payload.
    pub integer: i64,
    /// Object payload, if it is representable on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
}

impl From<&Message> for MessageEvent {
    fn from(msg: &Message) -> Self {
        Self {
            kind: msg.kind(),
            integer: msg.integer(),
            object: msg.payload().to_wire(),
        }
    }
}

/// Coarse-stream item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Whether the worker reported itself as running.
    pub running: bool,
}

/// Anything a subscriber can observe.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
    /// Detailed stream item.
    Message(MessageEvent),
    /// Coarse stream item.
    Status(StatusEvent),
}
