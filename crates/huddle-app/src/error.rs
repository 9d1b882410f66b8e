//! Application error types.

use huddle_client::ConnectionError;
use huddle_proto::EncodeError;
use thiserror::Error;

/// An intent or event the app could not apply.
///
/// Never fatal: the runtime logs it, shows it as status, and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    /// The intent needs an active workspace.
    #[error("no workspace selected")]
    NoActiveWorkspace,

    /// The intent needs an active channel.
    #[error("no channel selected")]
    NoActiveChannel,

    /// Named workspace is not known.
    #[error("unknown workspace '{0}'")]
    UnknownWorkspace(String),

    /// Named channel is not known in the workspace.
    #[error("unknown channel '{channel}' in workspace '{workspace}'")]
    UnknownChannel {
        /// Workspace searched
        workspace: String,
        /// Channel requested
        channel: String,
    },

    /// A workspace or channel with this name already exists.
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    /// Message body was empty after trimming.
    #[error("message must not be empty")]
    EmptyMessage,

    /// Name was empty after trimming.
    #[error("name must not be empty")]
    EmptyName,

    /// A snapshot named no workspace and none is active.
    #[error("{action} names no workspace and none is selected")]
    Unscoped {
        /// Action tag of the event
        action: String,
    },
}

/// Failure to hand a request to the connection.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The connection refused the request.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Fatal runtime failures.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// The front-end failed.
    #[error("driver error: {0}")]
    Driver(#[source] E),

    /// The connection worker exited while the runtime was still running.
    #[error("connection worker stopped unexpectedly")]
    ConnectionLost,
}
