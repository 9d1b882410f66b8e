//! Client connection layer
//!
//! Owns the persistent connection to a Huddle server. The connect/retry
//! policy lives in a pure state machine; async I/O lives in a worker task
//! that talks to the rest of the program only through channels.
//!
//! # Architecture
//!
//! [`ConnectionManager`] follows the Sans-IO, action-based pattern: callers
//! feed it transport notifications and the current time, and it returns
//! [`ConnectionAction`]s to execute. It never touches a socket.
//!
//! # Components
//!
//! - [`ConnectionManager`]: connect/retry state machine
//! - [`ConnectionConfig`]: endpoint and timer settings
//! - [`ConnectionHandle`] / [`ConnectionPort`]: the two ends of the
//!   command/event channels between the orchestration task and the worker
//! - [`ConnectionError`]: connection-level failures
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::spawn`]: start a WebSocket connection worker

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod channel;
mod config;
mod error;
mod manager;

#[cfg(feature = "transport")]
pub mod transport;

pub use channel::{ConnectionCommand, ConnectionHandle, ConnectionPort, ConnectionSender, channel};
pub use config::{
    ConnectionConfig, DEFAULT_RECONNECT_INTERVAL, DEFAULT_SERVER_URL, DEFAULT_TICK_INTERVAL,
};
pub use error::ConnectionError;
pub use manager::{ConnectionAction, ConnectionEvent, ConnectionManager, ConnectionState};
