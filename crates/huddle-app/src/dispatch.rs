//! Outbound request dispatch.
//!
//! The [`Dispatcher`] stamps each request with the local identity and the
//! current local date/time, encodes it, and hands the text to the connection
//! worker. It is fire-and-forget: success means the frame was queued, and
//! the effect of a request is observed later through an inbound event.
//!
//! [`crate::Runtime`] sends the requests [`crate::App`] resolves through
//! [`Dispatcher::dispatch`]. The per-operation methods (`send_message`,
//! `create_channel`, `search`, ...) are convenience wrappers over it for
//! callers that build requests from plain arguments.

use huddle_client::{ConnectionError, ConnectionSender, ConnectionState};
use huddle_proto::{Header, Outbound, Request, SearchQuery};

use crate::{DispatchError, Environment, Settings, settings};

/// Stamps, encodes and sends requests.
///
/// Sends fail fast with [`ConnectionError::NotConnected`] unless the last
/// observed connection state is `Connected`; nothing is queued for later.
pub struct Dispatcher<S, E> {
    settings: S,
    env: E,
    connection: ConnectionSender,
    state: ConnectionState,
}

impl<S, E> Dispatcher<S, E>
where
    S: Settings,
    E: Environment,
{
    /// Create a dispatcher over a connection sender.
    pub fn new(settings: S, env: E, connection: ConnectionSender) -> Self {
        Self { settings, env, connection, state: ConnectionState::Disconnected }
    }

    /// Record a connection state change reported by the worker.
    pub fn observe(&mut self, state: ConnectionState) {
        self.state = state;
    }

    /// Last observed connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Identity stamped into the `sender` field.
    pub fn identity(&self) -> String {
        settings::username(&self.settings)
    }

    /// Settings provider.
    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Mutable settings provider.
    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    /// Connection command sender.
    pub fn connection(&self) -> &ConnectionSender {
        &self.connection
    }

    /// Stamp, encode and send one request.
    ///
    /// # Errors
    ///
    /// - `DispatchError::Connection(NotConnected)` if not connected
    /// - `DispatchError::Connection(WorkerStopped)` if the worker has exited
    /// - `DispatchError::Encode` if the request cannot be encoded
    pub fn dispatch(&self, request: Request) -> Result<(), DispatchError> {
        if self.state != ConnectionState::Connected {
            return Err(ConnectionError::NotConnected.into());
        }
        let action = request.action();
        let header = Header::new(self.identity(), self.env.local_now());
        let text = Outbound::new(header, request).encode()?;
        tracing::debug!(action, bytes = text.len(), "dispatching request");
        self.connection.send(text)?;
        Ok(())
    }

    /// Post a message to a channel.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn send_message(&self, workspace: &str, channel: &str, body: &str) -> Result<(), DispatchError> {
        self.dispatch(Request::SendMessage {
            workspace: workspace.to_owned(),
            channel: channel.to_owned(),
            body: body.to_owned(),
        })
    }

    /// Request the full transcript of a channel.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn request_channel_data(&self, workspace: &str, channel: &str) -> Result<(), DispatchError> {
        self.dispatch(Request::GetChannelData {
            workspace: workspace.to_owned(),
            channel: channel.to_owned(),
        })
    }

    /// Request the workspace → channel mapping.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn request_workspace_list(&self) -> Result<(), DispatchError> {
        self.dispatch(Request::GetWorkspaceList)
    }

    /// Request the channel set of a workspace.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn request_channel_list(&self, workspace: &str) -> Result<(), DispatchError> {
        self.dispatch(Request::GetChannelList { workspace: workspace.to_owned() })
    }

    /// Announce the configured identity.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn register_identity(&self) -> Result<(), DispatchError> {
        self.dispatch(Request::RegisterUser { username: self.identity() })
    }

    /// Request creation of a workspace.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn create_workspace(&self, name: &str) -> Result<(), DispatchError> {
        self.dispatch(Request::CreateWorkspace { workspace_name: name.to_owned() })
    }

    /// Request deletion of a workspace.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn delete_workspace(&self, workspace: &str) -> Result<(), DispatchError> {
        self.dispatch(Request::DeleteWorkspace { workspace: workspace.to_owned() })
    }

    /// Request creation of a channel.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn create_channel(
        &self,
        workspace: &str,
        name: &str,
        description: &str,
    ) -> Result<(), DispatchError> {
        self.dispatch(Request::CreateChannel {
            workspace: workspace.to_owned(),
            channel_name: name.to_owned(),
            description: description.to_owned(),
        })
    }

    /// Request deletion of a channel.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn delete_channel(&self, workspace: &str, channel: &str) -> Result<(), DispatchError> {
        self.dispatch(Request::DeleteChannel {
            workspace: workspace.to_owned(),
            channel: channel.to_owned(),
        })
    }

    /// Search message history.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn search(&self, query: SearchQuery) -> Result<(), DispatchError> {
        self.dispatch(Request::Search(query))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use huddle_client::{ConnectionCommand, ConnectionPort};

    use super::*;
    use crate::MemorySettings;

    #[derive(Clone)]
    struct FixedClock(NaiveDateTime);

    impl Environment for FixedClock {
        fn local_now(&self) -> NaiveDateTime {
            self.0
        }
    }

    fn clock() -> FixedClock {
        FixedClock(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(14, 3, 9).unwrap())
    }

    fn dispatcher() -> (Dispatcher<MemorySettings, FixedClock>, ConnectionPort) {
        let (handle, port) = huddle_client::channel();
        let (sender, _events) = handle.into_parts();
        let dispatcher = Dispatcher::new(MemorySettings::with_username("ana"), clock(), sender);
        (dispatcher, port)
    }

    fn sent(port: &mut ConnectionPort) -> Vec<Outbound> {
        let mut frames = Vec::new();
        while let Ok(command) = port.commands.try_recv() {
            if let ConnectionCommand::Send(text) = command {
                frames.push(Outbound::decode(&text).unwrap());
            }
        }
        frames
    }

    #[test]
    fn disconnected_dispatch_fails_without_sending() {
        let (dispatcher, mut port) = dispatcher();

        let result = dispatcher.request_workspace_list();

        assert!(matches!(result, Err(DispatchError::Connection(ConnectionError::NotConnected))));
        assert!(sent(&mut port).is_empty());
    }

    #[test]
    fn connected_dispatch_stamps_identity_and_clock() {
        let (mut dispatcher, mut port) = dispatcher();
        dispatcher.observe(ConnectionState::Connected);

        dispatcher.send_message("acme", "general", "hello").unwrap();

        let frames = sent(&mut port);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header.sender, "ana");
        assert_eq!(frames[0].header.timestamp(), clock().0);
        assert_eq!(frames[0].request, Request::SendMessage {
            workspace: "acme".into(),
            channel: "general".into(),
            body: "hello".into(),
        });
    }

    #[test]
    fn identity_follows_settings() {
        let (mut dispatcher, mut port) = dispatcher();
        dispatcher.observe(ConnectionState::Connected);
        dispatcher.settings_mut().set(settings::USERNAME, "bea").unwrap();

        dispatcher.register_identity().unwrap();

        let frames = sent(&mut port);
        assert_eq!(frames[0].header.sender, "bea");
        assert_eq!(frames[0].request, Request::RegisterUser { username: "bea".into() });
    }

    #[test]
    fn every_operation_sends_its_action() {
        let (mut dispatcher, mut port) = dispatcher();
        dispatcher.observe(ConnectionState::Connected);

        dispatcher.request_channel_data("acme", "general").unwrap();
        dispatcher.request_workspace_list().unwrap();
        dispatcher.request_channel_list("acme").unwrap();
        dispatcher.create_workspace("lab").unwrap();
        dispatcher.delete_workspace("lab").unwrap();
        dispatcher.create_channel("acme", "dev", "builds").unwrap();
        dispatcher.delete_channel("acme", "dev").unwrap();
        dispatcher.search(SearchQuery { query: Some("deploy".into()), ..SearchQuery::default() }).unwrap();

        let actions: Vec<_> = sent(&mut port).iter().map(|f| f.request.action()).collect();
        assert_eq!(actions, [
            "get_channel_data",
            "get_workspace_list",
            "get_channel_list",
            "create_workspace",
            "delete_workspace",
            "create_channel",
            "delete_channel",
            "search",
        ]);
    }

    #[test]
    fn stopped_worker_is_reported() {
        let (mut dispatcher, port) = dispatcher();
        dispatcher.observe(ConnectionState::Connected);
        drop(port);

        let result = dispatcher.request_workspace_list();

        assert!(matches!(result, Err(DispatchError::Connection(ConnectionError::WorkerStopped))));
    }
}
