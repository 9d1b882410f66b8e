//! Application input events.
//!
//! Events originate from two sources:
//! - User intents from the front-end.
//! - Connection notifications and decoded server events, translated by the
//!   runtime from the connection worker's output.

use huddle_client::ConnectionState;
use huddle_proto::{Event, Request};

use crate::Intent;

/// Events processed by the [`crate::App`] state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// User intent.
    Intent(Intent),

    /// Connection state changed.
    ConnectionChanged(ConnectionState),

    /// Transport failure, reported once per occurrence.
    TransportError(String),

    /// An outbound request was not delivered.
    SendRejected {
        /// The request that was dropped
        request: Request,
        /// Why it was dropped
        reason: String,
    },

    /// Decoded server event.
    Server(Event),
}
