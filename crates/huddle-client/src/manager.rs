//! Connection lifecycle state machine.
//!
//! Owns the connect/retry policy for the single server connection. Methods
//! take time as input and return actions for the worker to execute, so the
//! policy is testable without sockets or real clocks.
//!
//! # State Machine
//!
//! ```text
//!                 start / timer
//! ┌──────────────┐ ──────────> ┌────────────┐  opened   ┌───────────┐
//! │ Disconnected │             │ Connecting │ ────────> │ Connected │
//! └──────────────┘ <────────── └────────────┘           └───────────┘
//!        ↑           error                                    │
//!        └────────────────────────────────────────────────────┘
//!                           closed / error
//! ```
//!
//! Every involuntary transition into `Disconnected` arms a fixed-period
//! reconnection timer. The timer is disarmed on reaching `Connected` and on
//! an explicit [`ConnectionManager::stop`]. A connection that drops after
//! reaching `Connected` is also reopened at once; a failed attempt waits
//! for the timer.

use std::{
    ops::Add,
    time::{Duration, Instant},
};

use crate::{ConnectionConfig, ConnectionError};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No transport open
    Disconnected,
    /// Transport open requested, waiting for it to complete
    Connecting,
    /// Transport open; sends are accepted
    Connected,
}

/// Notifications for the orchestration side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Connection state changed.
    StateChanged(ConnectionState),
    /// One text frame arrived, in transport order.
    Received(String),
    /// The transport failed. Emitted once per occurrence.
    TransportError(String),
    /// A queued send reached the worker after the connection dropped.
    SendRejected {
        /// The frame that was not written
        text: String,
        /// Why it was rejected
        error: ConnectionError,
    },
}

/// Actions returned by the connection state machine.
///
/// The worker executes these in order:
/// - `Open`: start opening the transport to `url`
/// - `Write`: write one text frame
/// - `Close`: drop the transport (and abort any pending open)
/// - `Emit`: forward an event to the orchestration side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open the transport
    Open {
        /// Endpoint to connect to
        url: String,
    },
    /// Write one text frame
    Write(String),
    /// Close the transport
    Close,
    /// Forward an event
    Emit(ConnectionEvent),
}

/// Connection state machine
///
/// Pure: no I/O, no clock. Generic over the instant type so tests and the
/// simulation harness can drive it with virtual time.
#[derive(Debug, Clone)]
pub struct ConnectionManager<I = Instant>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    state: ConnectionState,
    config: ConnectionConfig,
    /// Next reconnection attempt; `None` when the timer is disarmed
    reconnect_at: Option<I>,
}

impl<I> ConnectionManager<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create a manager in [`ConnectionState::Disconnected`] with the timer
    /// disarmed.
    pub fn new(config: ConnectionConfig) -> Self {
        Self { state: ConnectionState::Disconnected, config, reconnect_at: None }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether sends are currently accepted
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// When the reconnection timer fires next. `None` if disarmed.
    pub fn reconnect_deadline(&self) -> Option<I> {
        self.reconnect_at
    }

    /// Active configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open the transport unless already connecting or connected.
    pub fn start(&mut self) -> Vec<ConnectionAction> {
        if self.state != ConnectionState::Disconnected {
            return Vec::new();
        }

        tracing::info!(url = %self.config.url, "connecting");
        self.state = ConnectionState::Connecting;
        vec![
            ConnectionAction::Emit(ConnectionEvent::StateChanged(ConnectionState::Connecting)),
            ConnectionAction::Open { url: self.config.url.clone() },
        ]
    }

    /// Close the transport and disarm the timer. No reconnection follows.
    pub fn stop(&mut self) -> Vec<ConnectionAction> {
        self.reconnect_at = None;
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }

        tracing::info!("disconnecting");
        self.state = ConnectionState::Disconnected;
        vec![
            ConnectionAction::Close,
            ConnectionAction::Emit(ConnectionEvent::StateChanged(ConnectionState::Disconnected)),
        ]
    }

    /// Accept an outbound frame.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::NotConnected` unless connected. Nothing is queued.
    pub fn send(&mut self, text: &str) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Connected {
            return Err(ConnectionError::NotConnected);
        }
        Ok(vec![ConnectionAction::Write(text.to_owned())])
    }

    /// The transport finished opening.
    pub fn handle_open(&mut self) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Connecting => {
                tracing::info!(url = %self.config.url, "connected");
                self.state = ConnectionState::Connected;
                self.reconnect_at = None;
                vec![ConnectionAction::Emit(ConnectionEvent::StateChanged(
                    ConnectionState::Connected,
                ))]
            },
            // Open completed after stop(); the new transport is unwanted.
            ConnectionState::Disconnected => vec![ConnectionAction::Close],
            ConnectionState::Connected => Vec::new(),
        }
    }

    /// The peer closed the transport.
    pub fn handle_closed(&mut self, now: I, reason: &str) -> Vec<ConnectionAction> {
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }

        tracing::info!(reason, "connection closed");
        self.disconnect(now)
    }

    /// The transport failed while connecting or connected.
    pub fn handle_error(&mut self, now: I, error: &str) -> Vec<ConnectionAction> {
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }

        tracing::warn!(error, state = ?self.state, "transport error");
        let mut actions =
            vec![ConnectionAction::Emit(ConnectionEvent::TransportError(error.to_owned()))];
        actions.extend(self.disconnect(now));
        actions
    }

    /// One inbound text frame. Frames arriving outside `Connected` belong
    /// to a transport that is already gone and are dropped.
    pub fn handle_text(&mut self, text: String) -> Vec<ConnectionAction> {
        if self.state != ConnectionState::Connected {
            tracing::debug!(state = ?self.state, "dropping frame from stale transport");
            return Vec::new();
        }
        vec![ConnectionAction::Emit(ConnectionEvent::Received(text))]
    }

    /// Fire the reconnection timer if it is due.
    ///
    /// The timer is periodic: once due it re-arms one interval later and
    /// calls [`ConnectionManager::start`], which is a no-op while a previous
    /// attempt is still connecting.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        match self.reconnect_at {
            Some(deadline) if now >= deadline => {
                self.reconnect_at = Some(now + self.config.reconnect_interval);
                tracing::debug!("reconnect timer fired");
                self.start()
            },
            _ => Vec::new(),
        }
    }

    fn disconnect(&mut self, now: I) -> Vec<ConnectionAction> {
        let was_connected = self.state == ConnectionState::Connected;
        self.state = ConnectionState::Disconnected;
        self.reconnect_at = Some(now + self.config.reconnect_interval);
        let mut actions = vec![
            ConnectionAction::Close,
            ConnectionAction::Emit(ConnectionEvent::StateChanged(ConnectionState::Disconnected)),
        ];
        if was_connected {
            actions.extend(self.start());
        }
        actions
    }
}
