//! Shared server endpoint for simulated connections.
//!
//! A [`SimHub`] wraps one [`SimServer`] and fans its deliveries out to every
//! connected client. Loopback workers and the WebSocket test server both
//! attach clients to a hub; tests reach in to push frames or take the
//! server offline.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use huddle_proto::Event;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{Delivery, SimServer};

/// Identifies one client connection on a hub.
pub type ClientId = u64;

/// Hub errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The server is offline and refuses connections.
    #[error("server offline")]
    Offline,

    /// The client is not (or no longer) connected.
    #[error("client {0} not connected")]
    UnknownClient(ClientId),
}

struct HubState {
    server: SimServer,
    clients: Vec<(ClientId, mpsc::UnboundedSender<String>)>,
    next_id: ClientId,
    online: bool,
}

impl HubState {
    fn deliver(&mut self, from: Option<ClientId>, delivery: Delivery) {
        match delivery {
            Delivery::Reply(text) => {
                let target = self.clients.iter().find(|(id, _)| Some(*id) == from);
                if let Some((id, tx)) = target
                    && tx.send(text).is_err()
                {
                    tracing::debug!(client = id, "reply to closed client");
                }
            },
            Delivery::Broadcast(text) => {
                self.clients.retain(|(_, tx)| tx.send(text.clone()).is_ok());
            },
        }
    }
}

/// Cloneable handle to a shared [`SimServer`].
#[derive(Clone)]
pub struct SimHub {
    state: Arc<Mutex<HubState>>,
}

impl SimHub {
    /// Hub serving `server`, online.
    pub fn new(server: SimServer) -> Self {
        let state = HubState { server, clients: Vec::new(), next_id: 0, online: true };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Hub with one workspace `acme` holding `general` and `random`.
    pub fn acme(now: NaiveDateTime) -> Self {
        Self::new(SimServer::new(now).with_workspace("acme", &["general", "random"]))
    }

    /// Attach a client. Frames for it arrive on the returned receiver,
    /// which closes when the hub drops the client.
    ///
    /// # Errors
    ///
    /// - `HubError::Offline` while the server is offline
    pub fn connect(&self) -> Result<(ClientId, mpsc::UnboundedReceiver<String>), HubError> {
        let mut state = self.lock();
        if !state.online {
            return Err(HubError::Offline);
        }
        let id = state.next_id;
        state.next_id += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        state.clients.push((id, tx));
        tracing::debug!(client = id, "sim client connected");
        Ok((id, rx))
    }

    /// Detach a client. Unknown ids are ignored.
    pub fn disconnect(&self, id: ClientId) {
        self.lock().clients.retain(|(client, _)| *client != id);
    }

    /// Feed one request frame from a client into the server.
    ///
    /// # Errors
    ///
    /// - `HubError::UnknownClient` if the client is not connected
    pub fn submit(&self, id: ClientId, text: &str) -> Result<(), HubError> {
        let mut state = self.lock();
        if !state.clients.iter().any(|(client, _)| *client == id) {
            return Err(HubError::UnknownClient(id));
        }
        for delivery in state.server.handle(text) {
            state.deliver(Some(id), delivery);
        }
        Ok(())
    }

    /// Take the server offline (dropping every client) or back online.
    pub fn set_online(&self, online: bool) {
        let mut state = self.lock();
        state.online = online;
        if !online {
            state.clients.clear();
        }
        tracing::debug!(online, "sim server availability changed");
    }

    /// Number of attached clients.
    pub fn client_count(&self) -> usize {
        self.lock().clients.len()
    }

    /// Inspect or modify the server.
    pub fn with_server<R>(&self, f: impl FnOnce(&mut SimServer) -> R) -> R {
        f(&mut self.lock().server)
    }

    /// Broadcast an event to every client.
    pub fn push(&self, event: &Event) {
        match event.encode() {
            Ok(text) => self.push_raw(text),
            Err(error) => tracing::warn!(%error, "sim hub failed to encode event"),
        }
    }

    /// Broadcast raw text, which need not be valid protocol.
    pub fn push_raw(&self, text: impl Into<String>) {
        self.lock().deliver(None, Delivery::Broadcast(text.into()));
    }

    /// A message posted by someone who is not a hub client.
    pub fn push_chat(&self, sender: &str, workspace: &str, channel: &str, body: &str) {
        let mut state = self.lock();
        if let Some(delivery) = state.server.push_chat(sender, workspace, channel, body) {
            state.deliver(None, delivery);
        }
    }

    /// A workspace deleted by someone who is not a hub client.
    pub fn push_workspace_removal(&self, name: &str) {
        let mut state = self.lock();
        let delivery = state.server.push_workspace_removal(name);
        state.deliver(None, delivery);
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
