//! Connection error types.

use thiserror::Error;

/// Errors surfaced by the connection layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// A send was attempted while not connected. The message was dropped.
    #[error("not connected")]
    NotConnected,

    /// The transport failed to open, read, or write.
    #[error("transport error: {0}")]
    Transport(String),

    /// The peer closed the connection.
    #[error("connection closed: {reason}")]
    Closed {
        /// Close reason reported by the peer, possibly empty
        reason: String,
    },

    /// The connection worker has shut down and no longer accepts commands.
    #[error("connection worker stopped")]
    WorkerStopped,
}

impl ConnectionError {
    /// Returns true if the reconnection timer recovers from this error.
    ///
    /// A rejected send is never retried: the message is lost and the caller
    /// has already been told.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Closed { .. })
    }
}
