//! Application state machine.
//!
//! [`App`] is the event router and intent resolver. It consumes
//! [`AppEvent`]s and produces [`AppAction`]s for the runtime to execute; it
//! never touches the connection, the clock or the settings file directly.
//!
//! # Responsibilities
//!
//! - Routes decoded server events by action tag to [`Store`] mutations.
//! - Resolves user intents into requests scoped by the active selection.
//! - Re-announces identity and resynchronises after every connect.
//! - Correlates `*_response` events with outstanding create/delete requests.
//!   The protocol carries no request ids, so the oldest outstanding request
//!   of the matching action wins.

use std::collections::VecDeque;

use huddle_client::ConnectionState;
use huddle_proto::{
    ChannelData, ChannelEntry, ChannelList, ChannelUpdate, ChatMessage, Event, Request, Response,
    SearchResponse, Status, WorkspaceList, WorkspaceUpdate, action,
};

use crate::{
    AppAction, AppError, AppEvent, Intent, Message, Store, ViewUpdate, settings,
    store::{Fallback, Placement},
};

/// Application state machine.
#[derive(Debug, Clone)]
pub struct App {
    store: Store,
    identity: String,
    connection: ConnectionState,
    /// Create/delete requests awaiting their `*_response`, oldest first.
    pending: VecDeque<Request>,
}

impl App {
    /// Create an app for `identity`, seeded with workspace names persisted by
    /// a previous session.
    pub fn new(identity: impl Into<String>, saved_workspaces: Vec<String>) -> Self {
        Self {
            store: Store::seeded(saved_workspaces),
            identity: identity.into(),
            connection: ConnectionState::Disconnected,
            pending: VecDeque::new(),
        }
    }

    /// Local view of server state.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Local display identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Last observed connection state.
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Create/delete requests still awaiting a response.
    pub fn pending_requests(&self) -> impl Iterator<Item = &Request> {
        self.pending.iter()
    }

    /// Updates that bring an empty presentation up to date.
    pub fn initial_view(&self) -> Vec<ViewUpdate> {
        vec![
            ViewUpdate::ConnectionChanged(self.connection),
            ViewUpdate::WorkspacesChanged(self.store.workspaces().to_vec()),
            ViewUpdate::SelectionChanged(self.store.selection().clone()),
            ViewUpdate::TranscriptReplaced(self.store.transcript().entries()),
        ]
    }

    /// Process an event and return actions.
    ///
    /// # Errors
    ///
    /// Returns `AppError` when an intent cannot be resolved or a server event
    /// cannot be applied. State is unchanged in either case and subsequent
    /// events are unaffected.
    pub fn handle(&mut self, event: AppEvent) -> Result<Vec<AppAction>, AppError> {
        match event {
            AppEvent::Intent(intent) => self.handle_intent(intent),
            AppEvent::ConnectionChanged(state) => Ok(self.connection_changed(state)),
            AppEvent::TransportError(reason) => Ok(vec![notify("Connection error", reason)]),
            AppEvent::SendRejected { request, reason } => Ok(self.send_rejected(&request, &reason)),
            AppEvent::Server(event) => self.route(event),
        }
    }

    fn connection_changed(&mut self, state: ConnectionState) -> Vec<AppAction> {
        self.connection = state;
        let mut actions = vec![AppAction::Present(ViewUpdate::ConnectionChanged(state))];
        match state {
            ConnectionState::Connected => {
                actions.push(AppAction::Send(Request::RegisterUser {
                    username: self.identity.clone(),
                }));
                actions.push(AppAction::Send(Request::GetWorkspaceList));
                actions.extend(self.scope_request().map(AppAction::Send));
            },
            ConnectionState::Disconnected if !self.pending.is_empty() => {
                // outstanding responses will never arrive on this connection
                self.pending.clear();
                let fallback = self.store.discard_pending();
                actions.push(self.workspaces_view());
                actions.extend(self.fallback_actions(fallback));
            },
            ConnectionState::Disconnected | ConnectionState::Connecting => {},
        }
        actions
    }

    fn send_rejected(&mut self, request: &Request, reason: &str) -> Vec<AppAction> {
        let mut actions = Vec::new();
        if let Some(index) = self.pending.iter().rposition(|r| r == request) {
            self.pending.remove(index);
            actions.extend(self.resolve(request, false));
        }
        match request {
            Request::GetChannelData { .. }
            | Request::GetWorkspaceList
            | Request::GetChannelList { .. } => {
                tracing::debug!(action = request.action(), reason, "background request dropped");
            },
            _ => actions.push(notify("Not sent", format!("{}: {reason}", request.action()))),
        }
        actions
    }

    fn route(&mut self, event: Event) -> Result<Vec<AppAction>, AppError> {
        tracing::trace!(action = event.action(), "routing server event");
        match event {
            Event::ChannelData(data) => self.channel_data(data),
            Event::WorkspaceList(list) => Ok(self.workspace_list(&list)),
            Event::ChannelList(list) => self.channel_list(&list),
            Event::WorkspaceUpdate(update) => Ok(self.workspace_update(&update)),
            Event::ChannelUpdate(update) => Ok(self.channel_update(&update)),
            Event::SearchResponse(response) => Ok(self.search_response(response)),
            Event::Response(response) => Ok(self.response(&response)),
            Event::Chat(chat) => Ok(self.chat(chat)),
        }
    }

    fn channel_data(&mut self, data: ChannelData) -> Result<Vec<AppAction>, AppError> {
        let workspace = match data.workspace {
            Some(workspace) => workspace,
            None => self.store.selection().workspace.clone().ok_or_else(|| {
                AppError::Unscoped { action: action::CHANNEL_DATA.to_owned() }
            })?,
        };
        let messages = data
            .messages
            .into_iter()
            .map(|entry| Message::from_history(&workspace, &data.channel, entry))
            .collect();

        if self.store.replace_snapshot(&workspace, &data.channel, messages) {
            Ok(vec![self.transcript_view()])
        } else {
            tracing::debug!(%workspace, channel = %data.channel, "cached snapshot for inactive channel");
            Ok(vec![])
        }
    }

    fn workspace_list(&mut self, list: &WorkspaceList) -> Vec<AppAction> {
        let fallback = self.store.replace_workspaces(&list.workspaces);
        let mut actions = vec![
            AppAction::Persist {
                key: settings::WORKSPACES,
                value: settings::encode_workspaces(&self.store.confirmed_workspace_names()),
            },
            self.workspaces_view(),
        ];
        actions.extend(self.fallback_actions(fallback));
        actions
    }

    fn channel_list(&mut self, list: &ChannelList) -> Result<Vec<AppAction>, AppError> {
        let Some(active) = self.store.selection().workspace.clone() else {
            return Err(AppError::Unscoped { action: action::CHANNEL_LIST.to_owned() });
        };
        if list.workspace.as_ref().is_some_and(|named| *named != active) {
            tracing::debug!(workspace = ?list.workspace, %active, "ignoring channel list for inactive workspace");
            return Ok(vec![]);
        }
        Ok(self.replace_channels(&active, &list.channels))
    }

    fn workspace_update(&mut self, update: &WorkspaceUpdate) -> Vec<AppAction> {
        let fallback = self.store.apply_workspace_update(&update.workspaces);
        let mut actions = vec![self.workspaces_view()];
        actions.extend(self.fallback_actions(fallback));
        actions
    }

    fn channel_update(&mut self, update: &ChannelUpdate) -> Vec<AppAction> {
        if self.store.selection().workspace.as_deref() != Some(update.workspace.as_str()) {
            tracing::debug!(workspace = %update.workspace, "ignoring channel update for inactive workspace");
            return vec![];
        }
        self.replace_channels(&update.workspace, &update.channels)
    }

    fn replace_channels(&mut self, workspace: &str, channels: &[ChannelEntry]) -> Vec<AppAction> {
        let fallback = self.store.replace_channels(workspace, channels);
        let mut actions = vec![self.workspaces_view()];
        actions.extend(self.fallback_actions(fallback));
        actions
    }

    fn search_response(&mut self, response: SearchResponse) -> Vec<AppAction> {
        if !response.status.is_success() {
            let body = response.message.unwrap_or_else(|| failure_text(&response.status));
            return vec![notify("Search failed", body)];
        }
        let count = response.results.len();
        self.store.set_search_results(response.results.clone());
        vec![
            AppAction::Present(ViewUpdate::SearchResults(response.results)),
            AppAction::Present(ViewUpdate::Status(format!("{count} search results"))),
        ]
    }

    fn response(&mut self, response: &Response) -> Vec<AppAction> {
        let success = response.status.is_success();
        let mut actions = Vec::new();

        let position = self
            .pending
            .iter()
            .position(|r| r.response_action() == Some(response.action.as_str()));
        if let Some(request) = position.and_then(|index| self.pending.remove(index)) {
            actions.extend(self.resolve(&request, success));
        }

        let title = response_title(&response.action);
        if success {
            let status = if response.message.is_empty() {
                format!("{title}: ok")
            } else {
                format!("{title}: {}", response.message)
            };
            actions.push(AppAction::Present(ViewUpdate::Status(status)));
        } else {
            let body = if response.message.is_empty() {
                failure_text(&response.status)
            } else {
                response.message.clone()
            };
            actions.push(notify(title, body));
        }
        actions
    }

    /// Apply the outcome of a create/delete request.
    fn resolve(&mut self, request: &Request, success: bool) -> Vec<AppAction> {
        let fallback = match (request, success) {
            (Request::CreateWorkspace { workspace_name }, true) => {
                self.store.confirm_workspace(workspace_name);
                None
            },
            (Request::CreateWorkspace { workspace_name }, false) => {
                self.store.remove_pending_workspace(workspace_name)
            },
            (Request::CreateChannel { workspace, channel_name, .. }, true) => {
                self.store.confirm_channel(workspace, channel_name);
                None
            },
            (Request::CreateChannel { workspace, channel_name, .. }, false) => {
                self.store.remove_pending_channel(workspace, channel_name)
            },
            (Request::DeleteWorkspace { workspace }, true) => self.store.remove_workspace(workspace),
            (Request::DeleteChannel { workspace, channel }, true) => {
                self.store.remove_channel(workspace, channel)
            },
            _ => return vec![],
        };
        let mut actions = vec![self.workspaces_view()];
        actions.extend(self.fallback_actions(fallback));
        actions
    }

    fn chat(&mut self, chat: ChatMessage) -> Vec<AppAction> {
        if let Some(tag) = chat.action.as_deref() {
            tracing::debug!(action = tag, "unrecognised action treated as chat");
        }
        let message = Message::from_chat(chat);
        let mut actions = Vec::new();

        let foreign = message.sender != self.identity;
        let notification = foreign.then(|| notify(chat_title(&message), message.body.clone()));

        if let Placement::Appended { marker } = self.store.append_message(message.clone()) {
            actions.push(AppAction::Present(ViewUpdate::MessageAppended { marker, message }));
        }
        actions.extend(notification);
        actions
    }

    fn handle_intent(&mut self, intent: Intent) -> Result<Vec<AppAction>, AppError> {
        match intent {
            Intent::SendMessage { body } => {
                if body.trim().is_empty() {
                    return Err(AppError::EmptyMessage);
                }
                let (workspace, channel) = self.active_channel()?;
                Ok(vec![AppAction::Send(Request::SendMessage { workspace, channel, body })])
            },
            Intent::SelectWorkspace(name) => {
                if !self.store.select_workspace(&name)? {
                    return Ok(vec![]);
                }
                let mut actions = self.selection_view();
                actions.push(AppAction::Send(Request::GetChannelList { workspace: name }));
                Ok(actions)
            },
            Intent::SelectChannel(name) => {
                if !self.store.select_channel(&name)? {
                    return Ok(vec![]);
                }
                let workspace = self.active_workspace()?;
                let mut actions = self.selection_view();
                actions.push(AppAction::Send(Request::GetChannelData { workspace, channel: name }));
                Ok(actions)
            },
            Intent::CreateWorkspace { name } => {
                let name = valid_name(&name)?;
                self.store.insert_pending_workspace(&name)?;
                let mut actions = vec![self.workspaces_view()];
                actions.push(self.track(Request::CreateWorkspace { workspace_name: name }));
                Ok(actions)
            },
            Intent::DeleteWorkspace { name } => {
                if self.store.workspace(&name).is_none() {
                    return Err(AppError::UnknownWorkspace(name));
                }
                Ok(vec![self.track(Request::DeleteWorkspace { workspace: name })])
            },
            Intent::CreateChannel { name, description } => {
                let name = valid_name(&name)?;
                let workspace = self.active_workspace()?;
                self.store.insert_pending_channel(&workspace, &name, description.clone())?;
                let mut actions = vec![self.workspaces_view()];
                actions.push(self.track(Request::CreateChannel {
                    workspace,
                    channel_name: name,
                    description: description.unwrap_or_default(),
                }));
                Ok(actions)
            },
            Intent::DeleteChannel { name } => {
                let workspace = self.active_workspace()?;
                let known = self.store.workspace(&workspace).and_then(|w| w.channel(&name));
                if known.is_none() {
                    return Err(AppError::UnknownChannel { workspace, channel: name });
                }
                Ok(vec![self.track(Request::DeleteChannel { workspace, channel: name })])
            },
            Intent::Search(query) => Ok(vec![AppAction::Send(Request::Search(query))]),
            Intent::RegisterIdentity(name) => {
                let name = valid_name(&name)?;
                self.identity.clone_from(&name);
                Ok(vec![
                    AppAction::Persist { key: settings::USERNAME, value: name.clone() },
                    AppAction::Send(Request::RegisterUser { username: name }),
                ])
            },
            Intent::Refresh => {
                let mut actions = vec![AppAction::Send(Request::GetWorkspaceList)];
                actions.extend(self.scope_request().map(AppAction::Send));
                Ok(actions)
            },
            Intent::Quit => Ok(vec![AppAction::Quit]),
        }
    }

    fn track(&mut self, request: Request) -> AppAction {
        self.pending.push_back(request.clone());
        AppAction::Send(request)
    }

    fn active_workspace(&self) -> Result<String, AppError> {
        self.store.selection().workspace.clone().ok_or(AppError::NoActiveWorkspace)
    }

    fn active_channel(&self) -> Result<(String, String), AppError> {
        let workspace = self.active_workspace()?;
        let channel = self.store.selection().channel.clone().ok_or(AppError::NoActiveChannel)?;
        Ok((workspace, channel))
    }

    /// Request for the data of the active scope.
    fn scope_request(&self) -> Option<Request> {
        let selection = self.store.selection();
        match (&selection.workspace, &selection.channel) {
            (Some(workspace), Some(channel)) => Some(Request::GetChannelData {
                workspace: workspace.clone(),
                channel: channel.clone(),
            }),
            (Some(workspace), None) => Some(Request::GetChannelList { workspace: workspace.clone() }),
            (None, _) => None,
        }
    }

    /// View updates for a forced selection change, followed by a request
    /// for the new scope's data while connected.
    fn fallback_actions(&self, fallback: Option<Fallback>) -> Vec<AppAction> {
        let Some(fallback) = fallback else {
            return vec![];
        };
        let mut actions = self.selection_view();
        let request = match fallback {
            Fallback::Workspace(Some(workspace)) => Some(Request::GetChannelList { workspace }),
            Fallback::Channel(Some(channel)) => self
                .store
                .selection()
                .workspace
                .clone()
                .map(|workspace| Request::GetChannelData { workspace, channel }),
            Fallback::Workspace(None) | Fallback::Channel(None) => None,
        };
        if self.connection == ConnectionState::Connected {
            actions.extend(request.map(AppAction::Send));
        }
        actions
    }

    fn selection_view(&self) -> Vec<AppAction> {
        vec![
            AppAction::Present(ViewUpdate::SelectionChanged(self.store.selection().clone())),
            self.transcript_view(),
        ]
    }

    fn workspaces_view(&self) -> AppAction {
        AppAction::Present(ViewUpdate::WorkspacesChanged(self.store.workspaces().to_vec()))
    }

    fn transcript_view(&self) -> AppAction {
        AppAction::Present(ViewUpdate::TranscriptReplaced(self.store.transcript().entries()))
    }
}

fn notify(title: impl Into<String>, body: impl Into<String>) -> AppAction {
    AppAction::Notify { title: title.into(), body: body.into() }
}

fn valid_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() { Err(AppError::EmptyName) } else { Ok(name.to_owned()) }
}

fn failure_text(status: &Status) -> String {
    match status {
        Status::Success => "success".to_owned(),
        Status::Failure(raw) => raw.clone(),
    }
}

/// `create_channel_response` → `Create channel`.
fn response_title(tag: &str) -> String {
    let stem = tag.strip_suffix(action::RESPONSE_SUFFIX).unwrap_or(tag);
    let mut title = stem.replace('_', " ");
    if let Some(first) = title.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    title
}

fn chat_title(message: &Message) -> String {
    let sender = if message.sender.is_empty() { "Message" } else { &message.sender };
    match (message.workspace.is_empty(), message.channel.is_empty()) {
        (false, false) => format!("{sender} in {}/{}", message.workspace, message.channel),
        (true, false) => format!("{sender} in {}", message.channel),
        _ => sender.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use huddle_proto::{Header, HistoryEntry, OrderedMap, SearchHit};

    use super::*;

    fn header(sender: &str) -> Header {
        Header {
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            sender: sender.into(),
        }
    }

    fn workspace_list(entries: &[(&str, &[&str])]) -> AppEvent {
        let workspaces: OrderedMap<Vec<ChannelEntry>> = entries
            .iter()
            .map(|(ws, chans)| (*ws, chans.iter().map(|c| ChannelEntry::from(*c)).collect()))
            .collect();
        AppEvent::Server(Event::WorkspaceList(WorkspaceList { header: header("server"), workspaces }))
    }

    fn response(action: &str, status: &str, message: &str) -> AppEvent {
        AppEvent::Server(Event::Response(Response {
            header: header("server"),
            action: action.into(),
            status: Status::from(status.to_owned()),
            message: message.into(),
        }))
    }

    fn chat(sender: &str, workspace: &str, channel: &str, body: &str) -> AppEvent {
        AppEvent::Server(Event::Chat(ChatMessage {
            header: header(sender),
            action: None,
            workspace: Some(workspace.into()),
            channel: Some(channel.into()),
            body: body.into(),
        }))
    }

    fn sends(actions: &[AppAction]) -> Vec<&Request> {
        actions
            .iter()
            .filter_map(|a| match a {
                AppAction::Send(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn notifications(actions: &[AppAction]) -> usize {
        actions.iter().filter(|a| matches!(a, AppAction::Notify { .. })).count()
    }

    /// Connected app viewing `acme/general`, with `acme/random` and `home/lobby` known.
    fn connected_app() -> App {
        let mut app = App::new("alice", vec![]);
        app.handle(AppEvent::ConnectionChanged(ConnectionState::Connected)).unwrap();
        app.handle(workspace_list(&[("acme", &["general", "random"]), ("home", &["lobby"])]))
            .unwrap();
        app.handle(AppEvent::Intent(Intent::SelectChannel("general".into()))).unwrap();
        app
    }

    #[test]
    fn new_app_selects_first_saved_workspace() {
        let app = App::new("alice", vec!["acme".into(), "home".into()]);

        assert_eq!(app.store().selection().workspace.as_deref(), Some("acme"));
        assert_eq!(app.connection(), ConnectionState::Disconnected);
        assert_eq!(app.initial_view().len(), 4);
    }

    #[test]
    fn connect_registers_then_resynchronises() {
        let mut app = App::new("alice", vec!["acme".into()]);

        let actions = app.handle(AppEvent::ConnectionChanged(ConnectionState::Connected)).unwrap();

        assert_eq!(sends(&actions), [
            &Request::RegisterUser { username: "alice".into() },
            &Request::GetWorkspaceList,
            &Request::GetChannelList { workspace: "acme".into() },
        ]);
    }

    #[test]
    fn reconnect_requests_active_channel() {
        let mut app = connected_app();
        app.handle(AppEvent::ConnectionChanged(ConnectionState::Disconnected)).unwrap();

        let actions = app.handle(AppEvent::ConnectionChanged(ConnectionState::Connected)).unwrap();

        assert_eq!(
            sends(&actions).last(),
            Some(&&Request::GetChannelData { workspace: "acme".into(), channel: "general".into() })
        );
    }

    #[test]
    fn first_workspace_list_selects_first_and_requests_channels() {
        let mut app = App::new("alice", vec![]);
        app.handle(AppEvent::ConnectionChanged(ConnectionState::Connected)).unwrap();

        let actions = app.handle(workspace_list(&[("zeta", &["a"]), ("acme", &["b"])])).unwrap();

        assert_eq!(app.store().selection().workspace.as_deref(), Some("zeta"));
        assert_eq!(sends(&actions), [&Request::GetChannelList { workspace: "zeta".into() }]);
        assert!(matches!(
            actions.first(),
            Some(AppAction::Persist { key: settings::WORKSPACES, value }) if value == r#"["zeta","acme"]"#
        ));
    }

    #[test]
    fn workspace_list_without_current_falls_back() {
        let mut app = connected_app();

        let actions = app.handle(workspace_list(&[("home", &["lobby"])])).unwrap();

        assert_eq!(app.store().selection().workspace.as_deref(), Some("home"));
        assert_eq!(app.store().selection().channel, None);
        assert_eq!(sends(&actions), [&Request::GetChannelList { workspace: "home".into() }]);
    }

    #[test]
    fn channel_data_replaces_visible_transcript_in_date_order() {
        let mut app = connected_app();
        let entry = |date: &str, body: &str| HistoryEntry {
            date: date.parse().unwrap(),
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            sender: "bo".into(),
            body: body.into(),
        };

        let actions = app
            .handle(AppEvent::Server(Event::ChannelData(ChannelData {
                header: header("server"),
                workspace: Some("acme".into()),
                channel: "general".into(),
                messages: vec![entry("2024-01-02", "later"), entry("2024-01-01", "earlier")],
            })))
            .unwrap();

        assert!(matches!(actions.as_slice(), [AppAction::Present(ViewUpdate::TranscriptReplaced(_))]));
        let days = app.store().transcript().days();
        assert_eq!(days[0].date.to_string(), "2024-01-01");
        assert_eq!(days[1].date.to_string(), "2024-01-02");
    }

    #[test]
    fn channel_data_without_scope_is_an_error() {
        let mut app = App::new("alice", vec![]);

        let result = app.handle(AppEvent::Server(Event::ChannelData(ChannelData {
            header: header("server"),
            workspace: None,
            channel: "general".into(),
            messages: vec![],
        })));

        assert!(matches!(result, Err(AppError::Unscoped { .. })));
    }

    #[test]
    fn channel_list_for_other_workspace_is_ignored() {
        let mut app = connected_app();

        let actions = app
            .handle(AppEvent::Server(Event::ChannelList(ChannelList {
                header: header("server"),
                workspace: Some("home".into()),
                channels: vec![ChannelEntry::from("elsewhere")],
            })))
            .unwrap();

        assert!(actions.is_empty());
        assert!(app.store().workspace("home").unwrap().channel("elsewhere").is_none());
    }

    #[test]
    fn channel_update_dropping_active_channel_selects_first() {
        let mut app = connected_app();

        let actions = app
            .handle(AppEvent::Server(Event::ChannelUpdate(ChannelUpdate {
                header: header("server"),
                workspace: "acme".into(),
                channels: vec![ChannelEntry::from("random")],
            })))
            .unwrap();

        assert!(app.store().selection().matches("acme", "random"));
        assert_eq!(sends(&actions), [&Request::GetChannelData {
            workspace: "acme".into(),
            channel: "random".into()
        }]);
    }

    #[test]
    fn foreign_chat_outside_selection_only_notifies() {
        let mut app = connected_app();

        let actions = app.handle(chat("bob", "home", "lobby", "hi")).unwrap();

        assert!(app.store().transcript().is_empty());
        assert_eq!(notifications(&actions), 1);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn own_chat_in_selection_appends_without_notifying() {
        let mut app = connected_app();

        let actions = app.handle(chat("alice", "acme", "general", "hello")).unwrap();

        assert!(matches!(actions.as_slice(), [AppAction::Present(ViewUpdate::MessageAppended {
            marker: Some(_),
            ..
        })]));
        assert_eq!(app.store().transcript().len(), 1);
    }

    #[test]
    fn foreign_chat_in_selection_appends_and_notifies() {
        let mut app = connected_app();

        let actions = app.handle(chat("bob", "acme", "general", "yo")).unwrap();

        assert_eq!(actions.len(), 2);
        assert_eq!(notifications(&actions), 1);
    }

    #[test]
    fn success_response_does_not_notify() {
        let mut app = connected_app();

        let actions = app.handle(response("register_user_response", "success", "welcome")).unwrap();

        assert_eq!(notifications(&actions), 0);
        assert!(matches!(
            actions.as_slice(),
            [AppAction::Present(ViewUpdate::Status(text))] if text == "Register user: welcome"
        ));
    }

    #[test]
    fn failure_response_notifies() {
        let mut app = connected_app();

        let actions = app.handle(response("update_user_response", "error", "")).unwrap();

        assert!(matches!(
            actions.as_slice(),
            [AppAction::Notify { title, body }] if title == "Update user" && body == "error"
        ));
    }

    #[test]
    fn create_channel_is_optimistic_until_rejected() {
        let mut app = connected_app();

        let actions = app
            .handle(AppEvent::Intent(Intent::CreateChannel {
                name: " dev ".into(),
                description: Some("builds".into()),
            }))
            .unwrap();
        assert_eq!(sends(&actions), [&Request::CreateChannel {
            workspace: "acme".into(),
            channel_name: "dev".into(),
            description: "builds".into(),
        }]);
        assert!(app.store().workspace("acme").unwrap().channel("dev").unwrap().pending);

        app.handle(response("create_channel_response", "error", "taken")).unwrap();

        assert!(app.store().workspace("acme").unwrap().channel("dev").is_none());
        assert_eq!(app.pending_requests().count(), 0);
    }

    #[test]
    fn create_channel_confirmed_after_interleaved_workspace_list() {
        let mut app = connected_app();
        app.handle(AppEvent::Intent(Intent::CreateChannel { name: "ops".into(), description: None }))
            .unwrap();

        app.handle(workspace_list(&[("acme", &["general", "random"]), ("home", &["lobby"])]))
            .unwrap();
        assert!(app.store().workspace("acme").unwrap().channel("ops").unwrap().pending);

        app.handle(response("create_channel_response", "success", "created")).unwrap();

        let acme = app.store().workspace("acme").unwrap();
        assert!(!acme.channel("ops").unwrap().pending);
        assert_eq!(app.pending_requests().count(), 0);
    }

    #[test]
    fn create_workspace_confirmed_by_response() {
        let mut app = connected_app();
        app.handle(AppEvent::Intent(Intent::CreateWorkspace { name: "lab".into() })).unwrap();

        app.handle(response("create_workspace_response", "success", "created")).unwrap();

        assert!(!app.store().workspace("lab").unwrap().pending);
    }

    #[test]
    fn responses_resolve_oldest_request_first() {
        let mut app = connected_app();
        app.handle(AppEvent::Intent(Intent::CreateWorkspace { name: "one".into() })).unwrap();
        app.handle(AppEvent::Intent(Intent::CreateWorkspace { name: "two".into() })).unwrap();

        app.handle(response("create_workspace_response", "error", "no")).unwrap();

        assert!(app.store().workspace("one").is_none());
        assert!(app.store().workspace("two").is_some_and(|w| w.pending));
    }

    #[test]
    fn deleting_active_workspace_falls_back_on_success() {
        let mut app = connected_app();
        app.handle(AppEvent::Intent(Intent::DeleteWorkspace { name: "acme".into() })).unwrap();
        assert!(app.store().workspace("acme").is_some());

        let actions = app.handle(response("delete_workspace_response", "success", "")).unwrap();

        assert!(app.store().workspace("acme").is_none());
        assert_eq!(app.store().selection().workspace.as_deref(), Some("home"));
        assert_eq!(sends(&actions), [&Request::GetChannelList { workspace: "home".into() }]);
    }

    #[test]
    fn rejected_create_is_rolled_back() {
        let mut app = connected_app();
        app.handle(AppEvent::Intent(Intent::CreateWorkspace { name: "lab".into() })).unwrap();

        let actions = app
            .handle(AppEvent::SendRejected {
                request: Request::CreateWorkspace { workspace_name: "lab".into() },
                reason: "not connected".into(),
            })
            .unwrap();

        assert!(app.store().workspace("lab").is_none());
        assert_eq!(notifications(&actions), 1);
    }

    #[test]
    fn rejected_background_request_is_silent() {
        let mut app = connected_app();

        let actions = app
            .handle(AppEvent::SendRejected {
                request: Request::GetWorkspaceList,
                reason: "not connected".into(),
            })
            .unwrap();

        assert!(actions.is_empty());
    }

    #[test]
    fn disconnect_discards_unconfirmed_entities() {
        let mut app = connected_app();
        app.handle(AppEvent::Intent(Intent::CreateWorkspace { name: "lab".into() })).unwrap();

        app.handle(AppEvent::ConnectionChanged(ConnectionState::Disconnected)).unwrap();

        assert!(app.store().workspace("lab").is_none());
        assert_eq!(app.pending_requests().count(), 0);
    }

    #[test]
    fn send_message_needs_a_channel() {
        let mut app = App::new("alice", vec!["acme".into()]);

        let result = app.handle(AppEvent::Intent(Intent::SendMessage { body: "hi".into() }));
        assert_eq!(result, Err(AppError::NoActiveChannel));

        let result = app.handle(AppEvent::Intent(Intent::SendMessage { body: "  ".into() }));
        assert_eq!(result, Err(AppError::EmptyMessage));
    }

    #[test]
    fn register_identity_persists_then_sends() {
        let mut app = connected_app();

        let actions = app.handle(AppEvent::Intent(Intent::RegisterIdentity("al".into()))).unwrap();

        assert_eq!(app.identity(), "al");
        assert!(matches!(actions.as_slice(), [
            AppAction::Persist { key: settings::USERNAME, .. },
            AppAction::Send(Request::RegisterUser { .. }),
        ]));
    }

    #[test]
    fn search_results_are_presented() {
        let mut app = connected_app();
        let hit = SearchHit {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            sender: "bo".into(),
            body: "found".into(),
            workspace: "acme".into(),
            channel: "general".into(),
        };

        let actions = app
            .handle(AppEvent::Server(Event::SearchResponse(SearchResponse {
                header: header("server"),
                status: Status::Success,
                results: vec![hit],
                message: None,
            })))
            .unwrap();

        assert!(matches!(actions.first(), Some(AppAction::Present(ViewUpdate::SearchResults(r))) if r.len() == 1));
        assert_eq!(app.store().search_results().len(), 1);
    }

    #[test]
    fn failed_search_notifies() {
        let mut app = connected_app();

        let actions = app
            .handle(AppEvent::Server(Event::SearchResponse(SearchResponse {
                header: header("server"),
                status: Status::Failure("error".into()),
                results: vec![],
                message: Some("index offline".into()),
            })))
            .unwrap();

        assert!(matches!(
            actions.as_slice(),
            [AppAction::Notify { body, .. }] if body == "index offline"
        ));
    }

    #[test]
    fn response_titles_are_readable() {
        assert_eq!(response_title("create_channel_response"), "Create channel");
        assert_eq!(response_title("odd"), "Odd");
        assert_eq!(response_title(""), "");
    }
}
