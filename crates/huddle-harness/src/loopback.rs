//! In-process connection worker.
//!
//! [`spawn_loopback`] runs the same [`ConnectionManager`] policy as the
//! WebSocket worker, but "opens" connections by attaching to a [`SimHub`].
//! Timers use `tokio::time`, so tests with a paused clock control when
//! reconnection attempts happen.

use std::collections::VecDeque;

use huddle_client::{
    ConnectionAction, ConnectionCommand, ConnectionConfig, ConnectionEvent, ConnectionHandle,
    ConnectionManager, ConnectionPort, channel,
};
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior},
};

use crate::{ClientId, SimHub};

/// Spawn a loopback connection worker on the current tokio runtime.
///
/// Like the WebSocket worker it starts disconnected and exits after
/// shutdown or once the handle is dropped.
pub fn spawn_loopback(hub: SimHub, config: ConnectionConfig) -> ConnectionHandle {
    let (handle, port) = channel();
    tokio::spawn(run_loopback(hub, config, port));
    handle
}

/// Run a loopback worker until shutdown.
pub async fn run_loopback(hub: SimHub, config: ConnectionConfig, port: ConnectionPort) {
    let mut ticker = tokio::time::interval(config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut worker =
        Loopback { manager: ConnectionManager::new(config), hub, port, link: None };

    loop {
        tokio::select! {
            command = worker.port.commands.recv() => {
                let Some(command) = command else {
                    worker.shutdown();
                    break;
                };
                if !worker.handle_command(command) {
                    break;
                }
            },

            frame = next_frame(&mut worker.link) => {
                let actions = match frame {
                    Some(text) => worker.manager.handle_text(text),
                    None => {
                        worker.release();
                        worker.manager.handle_closed(Instant::now(), "server closed the connection")
                    },
                };
                worker.execute(actions);
            },

            _ = ticker.tick() => {
                let actions = worker.manager.tick(Instant::now());
                worker.execute(actions);
            },
        }
    }

    tracing::debug!("loopback worker exited");
}

struct Link {
    id: ClientId,
    frames: mpsc::UnboundedReceiver<String>,
}

struct Loopback {
    manager: ConnectionManager<Instant>,
    hub: SimHub,
    port: ConnectionPort,
    link: Option<Link>,
}

impl Loopback {
    /// Returns false when the worker should exit.
    fn handle_command(&mut self, command: ConnectionCommand) -> bool {
        match command {
            ConnectionCommand::Start => {
                let actions = self.manager.start();
                self.execute(actions);
            },
            ConnectionCommand::Stop => {
                let actions = self.manager.stop();
                self.execute(actions);
            },
            ConnectionCommand::Send(text) => match self.manager.send(&text) {
                Ok(actions) => self.execute(actions),
                Err(error) => {
                    self.port.emit(ConnectionEvent::SendRejected { text, error });
                },
            },
            ConnectionCommand::Shutdown => {
                self.shutdown();
                return false;
            },
        }
        true
    }

    fn shutdown(&mut self) {
        let actions = self.manager.stop();
        self.execute(actions);
        self.release();
    }

    /// Opens complete synchronously, so their follow-up actions run in the
    /// same pass.
    fn execute(&mut self, actions: Vec<ConnectionAction>) {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                ConnectionAction::Open { url } => {
                    self.release();
                    match self.hub.connect() {
                        Ok((id, frames)) => {
                            tracing::debug!(%url, client = id, "loopback opened");
                            self.link = Some(Link { id, frames });
                            queue.extend(self.manager.handle_open());
                        },
                        Err(error) => {
                            queue.extend(self.manager.handle_error(Instant::now(), &error.to_string()));
                        },
                    }
                },
                ConnectionAction::Write(text) => {
                    let Some(link) = self.link.as_ref() else {
                        tracing::warn!("write with no open link");
                        continue;
                    };
                    if let Err(error) = self.hub.submit(link.id, &text) {
                        self.release();
                        queue.extend(self.manager.handle_error(Instant::now(), &error.to_string()));
                    }
                },
                ConnectionAction::Close => self.release(),
                ConnectionAction::Emit(event) => {
                    if !self.port.emit(event) {
                        tracing::debug!("event receiver dropped");
                    }
                },
            }
        }
    }

    fn release(&mut self) {
        if let Some(link) = self.link.take() {
            self.hub.disconnect(link.id);
        }
    }
}

async fn next_frame(link: &mut Option<Link>) -> Option<String> {
    match link.as_mut() {
        Some(link) => link.frames.recv().await,
        None => std::future::pending().await,
    }
}
