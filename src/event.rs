// MIT License
// Rust translation

use serde_json::Value;

use crate::protocol::{Envelope, StatusKind};

/// All events that can be emitted by the panel connection.
///
/// Users subscribe via `panel.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<LaresEvent>`.
#[derive(Debug, Clone)]
pub enum LaresEvent {
    /// WebSocket connection to the panel established
    Connected,
    /// WebSocket connection lost
    Disconnected,
    /// Login handshake completed, session token stored
    LoggedIn,
    /// Realtime change push for one registered status kind.
    /// `items` is the raw JSON section under the kind's payload key.
    Change { kind: StatusKind, items: Value },
    /// A frame that matched no pending command and no known status kind.
    Unmatched(Envelope),
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<LaresEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<LaresEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
