//! Message-passing boundary between the orchestration task and the
//! connection worker.
//!
//! Two single-purpose channels: commands flow to the worker, events flow
//! back. Both are unbounded so neither side ever blocks the other; inbound
//! events keep transport order.

use tokio::sync::mpsc;

use crate::{ConnectionError, ConnectionEvent};

/// Commands accepted by a connection worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCommand {
    /// Connect (no-op if already connecting or connected).
    Start,
    /// Disconnect without scheduling a reconnection.
    Stop,
    /// Write one text frame.
    Send(String),
    /// Stop, disarm the reconnection timer, and exit the worker.
    Shutdown,
}

/// Cloneable command side of a connection.
#[derive(Debug, Clone)]
pub struct ConnectionSender {
    commands: mpsc::UnboundedSender<ConnectionCommand>,
}

impl ConnectionSender {
    /// Ask the worker to connect.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::WorkerStopped` if the worker has exited
    pub fn start(&self) -> Result<(), ConnectionError> {
        self.command(ConnectionCommand::Start)
    }

    /// Ask the worker to disconnect.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::WorkerStopped` if the worker has exited
    pub fn stop(&self) -> Result<(), ConnectionError> {
        self.command(ConnectionCommand::Stop)
    }

    /// Queue one text frame for the worker.
    ///
    /// Returns as soon as the frame is queued. If the connection dropped in
    /// the meantime the worker reports
    /// [`ConnectionEvent::SendRejected`].
    ///
    /// # Errors
    ///
    /// - `ConnectionError::WorkerStopped` if the worker has exited
    pub fn send(&self, text: String) -> Result<(), ConnectionError> {
        self.command(ConnectionCommand::Send(text))
    }

    /// Ask the worker to shut down.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::WorkerStopped` if the worker has already exited
    pub fn shutdown(&self) -> Result<(), ConnectionError> {
        self.command(ConnectionCommand::Shutdown)
    }

    fn command(&self, command: ConnectionCommand) -> Result<(), ConnectionError> {
        self.commands.send(command).map_err(|_| ConnectionError::WorkerStopped)
    }
}

/// Orchestration side of a connection: commands out, events in.
#[derive(Debug)]
pub struct ConnectionHandle {
    sender: ConnectionSender,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
}

impl ConnectionHandle {
    /// Ask the worker to connect.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::WorkerStopped` if the worker has exited
    pub fn start(&self) -> Result<(), ConnectionError> {
        self.sender.start()
    }

    /// Ask the worker to disconnect.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::WorkerStopped` if the worker has exited
    pub fn stop(&self) -> Result<(), ConnectionError> {
        self.sender.stop()
    }

    /// Queue one text frame.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::WorkerStopped` if the worker has exited
    pub fn send(&self, text: String) -> Result<(), ConnectionError> {
        self.sender.send(text)
    }

    /// Ask the worker to shut down.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::WorkerStopped` if the worker has already exited
    pub fn shutdown(&self) -> Result<(), ConnectionError> {
        self.sender.shutdown()
    }

    /// Next event from the worker. `None` once the worker has exited and
    /// every queued event has been read.
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        self.events.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_next_event(&mut self) -> Option<ConnectionEvent> {
        self.events.try_recv().ok()
    }

    /// A cloneable command sender for this connection.
    pub fn sender(&self) -> ConnectionSender {
        self.sender.clone()
    }

    /// Split into the command sender and the event receiver.
    pub fn into_parts(self) -> (ConnectionSender, mpsc::UnboundedReceiver<ConnectionEvent>) {
        (self.sender, self.events)
    }
}

/// Worker side of a connection: commands in, events out.
#[derive(Debug)]
pub struct ConnectionPort {
    /// Commands from the orchestration side
    pub commands: mpsc::UnboundedReceiver<ConnectionCommand>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl ConnectionPort {
    /// Forward an event. Returns false once the orchestration side is gone.
    pub fn emit(&self, event: ConnectionEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Whether the orchestration side has dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

/// Create a connected handle/port pair.
pub fn channel() -> (ConnectionHandle, ConnectionPort) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let handle =
        ConnectionHandle { sender: ConnectionSender { commands: command_tx }, events: event_rx };
    let port = ConnectionPort { commands: command_rx, events: event_tx };
    (handle, port)
}
