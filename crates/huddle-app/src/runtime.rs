//! Generic runtime for application orchestration.
//!
//! The Runtime drives the orchestration side of the client, coordinating
//! between:
//! - [`App`]: event router and state store
//! - [`Dispatcher`]: outbound requests to the connection worker
//! - [`Driver`]: platform-specific front-end
//!
//! It owns no socket. The connection worker runs as a separate task and is
//! reached only through the command/event channels of a
//! [`ConnectionHandle`].

use std::collections::VecDeque;

use huddle_client::{ConnectionEvent, ConnectionHandle};
use huddle_proto::{Event, Outbound};
use tokio::sync::mpsc;

use crate::{
    App, AppAction, AppEvent, DispatchError, Dispatcher, Driver, Environment, RuntimeError,
    Settings, ViewUpdate, settings,
};

/// Generic runtime that orchestrates App, Dispatcher, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific front-end
/// - `S`: Settings provider
/// - `E`: Clock used to stamp outbound requests
pub struct Runtime<D, S, E>
where
    D: Driver,
    S: Settings,
    E: Environment,
{
    driver: D,
    app: App,
    dispatcher: Dispatcher<S, E>,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
}

impl<D, S, E> Runtime<D, S, E>
where
    D: Driver,
    S: Settings,
    E: Environment,
{
    /// Create a runtime over a connection worker's handle.
    ///
    /// Identity and the offline workspace list are read from `settings`.
    pub fn new(driver: D, settings: S, env: E, connection: ConnectionHandle) -> Self {
        let app = App::new(settings::username(&settings), settings::saved_workspaces(&settings));
        let (sender, events) = connection.into_parts();
        let dispatcher = Dispatcher::new(settings, env, sender);
        Self { driver, app, dispatcher, events }
    }

    /// Application state, for inspection.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Front-end, for inspection.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run until the user quits.
    ///
    /// Starts the connection, presents the initial view, then processes
    /// user intents and connection events as they arrive. On exit the
    /// connection worker is shut down and the driver stopped.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Driver` if the front-end fails
    /// - `RuntimeError::ConnectionLost` if the connection worker exits
    pub async fn run(mut self) -> Result<(), RuntimeError<D::Error>> {
        let result = self.run_loop().await;

        if let Err(error) = self.dispatcher.connection().shutdown() {
            tracing::debug!(%error, "connection worker already gone");
        }
        self.driver.stop();
        result
    }

    async fn run_loop(&mut self) -> Result<(), RuntimeError<D::Error>> {
        self.dispatcher.connection().start().map_err(|_| RuntimeError::ConnectionLost)?;
        for update in self.app.initial_view() {
            self.driver.present(update);
        }

        loop {
            let event = tokio::select! {
                intent = self.driver.poll_intent() => {
                    match intent.map_err(RuntimeError::Driver)? {
                        Some(intent) => AppEvent::Intent(intent),
                        None => continue,
                    }
                },
                event = self.events.recv() => {
                    let Some(event) = event else {
                        return Err(RuntimeError::ConnectionLost);
                    };
                    match self.translate(event) {
                        Some(event) => event,
                        None => continue,
                    }
                },
            };

            if self.process(event) {
                return Ok(());
            }
        }
    }

    /// Turn a connection event into an app event. Undecodable frames are
    /// logged and discarded.
    fn translate(&mut self, event: ConnectionEvent) -> Option<AppEvent> {
        match event {
            ConnectionEvent::StateChanged(state) => {
                tracing::info!(?state, "connection state changed");
                self.dispatcher.observe(state);
                Some(AppEvent::ConnectionChanged(state))
            },
            ConnectionEvent::Received(text) => match Event::decode(&text) {
                Ok(event) => Some(AppEvent::Server(event)),
                Err(error) => {
                    tracing::warn!(%error, len = text.len(), "discarding undecodable frame");
                    None
                },
            },
            ConnectionEvent::TransportError(reason) => {
                tracing::warn!(%reason, "transport error");
                Some(AppEvent::TransportError(reason))
            },
            ConnectionEvent::SendRejected { text, error } => match Outbound::decode(&text) {
                Ok(outbound) => {
                    Some(AppEvent::SendRejected { request: outbound.request, reason: error.to_string() })
                },
                Err(decode) => {
                    tracing::warn!(%error, %decode, "rejected frame is not a request");
                    None
                },
            },
        }
    }

    /// Feed one event through the app and execute the resulting actions,
    /// including any follow-up events they produce.
    ///
    /// Returns `true` if the app asked to quit.
    fn process(&mut self, event: AppEvent) -> bool {
        let mut queue = VecDeque::from([event]);
        let mut quit = false;

        while let Some(event) = queue.pop_front() {
            let actions = match self.app.handle(event) {
                Ok(actions) => actions,
                Err(error) => {
                    tracing::warn!(%error, "event not applied");
                    self.driver.present(ViewUpdate::Status(error.to_string()));
                    continue;
                },
            };

            for action in actions {
                match action {
                    AppAction::Send(request) => {
                        let action = request.action();
                        match self.dispatcher.dispatch(request.clone()) {
                            Ok(()) => {},
                            Err(DispatchError::Connection(error)) => {
                                tracing::warn!(action, %error, "request not sent");
                                queue.push_back(AppEvent::SendRejected {
                                    request,
                                    reason: error.to_string(),
                                });
                            },
                            Err(DispatchError::Encode(error)) => {
                                tracing::warn!(action, %error, "request not encodable");
                            },
                        }
                    },
                    AppAction::Notify { title, body } => self.driver.notify(&title, &body),
                    AppAction::Present(update) => self.driver.present(update),
                    AppAction::Persist { key, value } => {
                        if let Err(error) = self.dispatcher.settings_mut().set(key, &value) {
                            tracing::warn!(key, %error, "failed to persist setting");
                        }
                    },
                    AppAction::Quit => quit = true,
                }
            }
        }
        quit
    }
}
