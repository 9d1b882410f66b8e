//! WebSocket connection worker.
//!
//! [`spawn`] starts a task that exclusively owns the socket and the
//! [`ConnectionManager`]. It is a thin driver: it turns socket activity,
//! timer ticks and commands into manager calls, and executes the actions
//! the manager returns. Connection policy stays in the manager.

mod ws;

use std::collections::VecDeque;

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
pub use ws::{TransportError, WsMessage, WsReader, WsWriter, connect};

use crate::{
    ConnectionAction, ConnectionCommand, ConnectionConfig, ConnectionEvent, ConnectionHandle,
    ConnectionManager, ConnectionPort, channel,
};

type PendingOpen = JoinHandle<Result<(WsWriter, WsReader), TransportError>>;

/// Spawn a connection worker on the current tokio runtime.
///
/// The worker starts disconnected; call [`ConnectionHandle::start`] to
/// connect. It exits after [`ConnectionHandle::shutdown`] or once the handle
/// is dropped.
pub fn spawn(config: ConnectionConfig) -> ConnectionHandle {
    let (handle, port) = channel();
    tokio::spawn(run(config, port));
    handle
}

/// Run a connection worker until shutdown.
pub async fn run(config: ConnectionConfig, port: ConnectionPort) {
    let mut ticker = tokio::time::interval(config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut worker = Worker {
        manager: ConnectionManager::new(config),
        port,
        writer: None,
        reader: None,
        pending: None,
    };

    loop {
        tokio::select! {
            command = worker.port.commands.recv() => {
                let Some(command) = command else {
                    tracing::debug!("connection handle dropped");
                    worker.shutdown().await;
                    break;
                };
                if !worker.handle_command(command).await {
                    break;
                }
            },

            opened = finish_open(&mut worker.pending) => {
                worker.pending = None;
                let actions = match opened {
                    Ok((writer, reader)) => {
                        worker.writer = Some(writer);
                        worker.reader = Some(reader);
                        worker.manager.handle_open()
                    },
                    Err(e) => worker.manager.handle_error(Instant::now(), &e.to_string()),
                };
                worker.execute(actions).await;
            },

            message = next_message(&mut worker.reader) => {
                worker.handle_message(message).await;
            },

            _ = ticker.tick() => {
                let actions = worker.manager.tick(Instant::now());
                worker.execute(actions).await;
            },
        }
    }

    tracing::debug!("connection worker exited");
}

struct Worker {
    manager: ConnectionManager<Instant>,
    port: ConnectionPort,
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    pending: Option<PendingOpen>,
}

impl Worker {
    /// Returns false when the worker should exit.
    async fn handle_command(&mut self, command: ConnectionCommand) -> bool {
        match command {
            ConnectionCommand::Start => {
                let actions = self.manager.start();
                self.execute(actions).await;
            },
            ConnectionCommand::Stop => {
                let actions = self.manager.stop();
                self.execute(actions).await;
            },
            ConnectionCommand::Send(text) => match self.manager.send(&text) {
                Ok(actions) => self.execute(actions).await,
                Err(error) => {
                    tracing::warn!(%error, "send rejected");
                    self.port.emit(ConnectionEvent::SendRejected { text, error });
                },
            },
            ConnectionCommand::Shutdown => {
                self.shutdown().await;
                return false;
            },
        }
        true
    }

    async fn handle_message(&mut self, message: Option<Result<WsMessage, TransportError>>) {
        let actions = match message {
            Some(Ok(WsMessage::Text(text))) => {
                tracing::trace!(len = text.len(), "frame received");
                self.manager.handle_text(text)
            },
            Some(Ok(WsMessage::Ping(data))) => {
                let result = match self.writer.as_mut() {
                    Some(writer) => writer.send_pong(data).await,
                    None => Ok(()),
                };
                match result {
                    Ok(()) => Vec::new(),
                    Err(e) => self.manager.handle_error(Instant::now(), &e.to_string()),
                }
            },
            Some(Ok(WsMessage::Binary(data))) => {
                tracing::debug!(len = data.len(), "ignoring binary frame");
                Vec::new()
            },
            Some(Ok(WsMessage::Close { code, reason })) => {
                tracing::debug!(code, %reason, "close frame received");
                self.release();
                self.manager.handle_closed(Instant::now(), &reason)
            },
            None => {
                self.release();
                self.manager.handle_closed(Instant::now(), "stream ended")
            },
            Some(Err(e)) => {
                self.release();
                self.manager.handle_error(Instant::now(), &e.to_string())
            },
        };
        self.execute(actions).await;
    }

    async fn shutdown(&mut self) {
        let actions = self.manager.stop();
        self.execute(actions).await;
        self.release();
    }

    /// Execute actions in order. Write failures feed back into the manager
    /// and their actions run in the same pass.
    async fn execute(&mut self, actions: Vec<ConnectionAction>) {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                ConnectionAction::Open { url } => {
                    if let Some(pending) = self.pending.take() {
                        pending.abort();
                    }
                    self.pending = Some(tokio::spawn(async move { connect(&url).await }));
                },
                ConnectionAction::Write(text) => {
                    let Some(writer) = self.writer.as_mut() else {
                        tracing::warn!("write with no open transport");
                        continue;
                    };
                    if let Err(e) = writer.send_text(text).await {
                        self.release();
                        queue.extend(self.manager.handle_error(Instant::now(), &e.to_string()));
                    }
                },
                ConnectionAction::Close => {
                    let closed = match self.writer.take() {
                        Some(mut writer) => writer.close().await,
                        None => Ok(()),
                    };
                    if let Err(e) = closed {
                        tracing::debug!(error = %e, "close handshake failed");
                    }
                    self.release();
                },
                ConnectionAction::Emit(event) => {
                    if !self.port.emit(event) {
                        tracing::debug!("event receiver dropped");
                    }
                },
            }
        }
    }

    /// Drop the socket halves and any pending open.
    fn release(&mut self) {
        self.writer = None;
        self.reader = None;
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

async fn finish_open(
    pending: &mut Option<PendingOpen>,
) -> Result<(WsWriter, WsReader), TransportError> {
    let Some(task) = pending.as_mut() else {
        return std::future::pending().await;
    };
    match task.await {
        Ok(result) => result,
        Err(e) => Err(TransportError::Connection(format!("connect task failed: {e}"))),
    }
}

async fn next_message(
    reader: &mut Option<WsReader>,
) -> Option<Result<WsMessage, TransportError>> {
    match reader.as_mut() {
        Some(reader) => reader.recv().await,
        None => std::future::pending().await,
    }
}
