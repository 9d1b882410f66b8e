//! In-memory protocol server.
//!
//! `SimServer` answers the client's requests the way a real Huddle server
//! would: it keeps workspaces, channels and message history, replies to the
//! requesting client and broadcasts changes to everyone. It is pure: text
//! in, [`Delivery`]s out. Networking lives in [`crate::SimHub`] and
//! [`crate::WsTestServer`].

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDateTime;
use huddle_proto::{
    ChannelData, ChannelEntry, ChannelList, ChannelUpdate, ChatMessage, Event, Header,
    HistoryEntry, OrderedMap, Outbound, Request, Response, SearchHit, SearchQuery,
    SearchResponse, Status, WorkspaceList, WorkspaceUpdate,
};

/// Name the server signs its own frames with.
pub const SERVER_NAME: &str = "server";

/// Action tag of broadcast chat messages.
pub const CHAT_ACTION: &str = "send_message";

/// Where a server frame goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Only to the client that sent the request
    Reply(String),
    /// To every connected client
    Broadcast(String),
}

impl Delivery {
    /// Frame text.
    pub fn text(&self) -> &str {
        match self {
            Self::Reply(text) | Self::Broadcast(text) => text,
        }
    }
}

#[derive(Debug, Clone)]
struct SimWorkspace {
    name: String,
    channels: Vec<ChannelEntry>,
}

/// In-memory protocol server.
#[derive(Debug, Clone)]
pub struct SimServer {
    workspaces: Vec<SimWorkspace>,
    history: HashMap<(String, String), Vec<HistoryEntry>>,
    users: Vec<String>,
    received: Vec<Outbound>,
    /// Forced failures, consumed in order per action.
    failures: VecDeque<(String, String)>,
    now: NaiveDateTime,
}

impl SimServer {
    /// Empty server whose own frames carry `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            workspaces: Vec::new(),
            history: HashMap::new(),
            users: Vec::new(),
            received: Vec::new(),
            failures: VecDeque::new(),
            now,
        }
    }

    /// Add a workspace with the given channels.
    #[must_use]
    pub fn with_workspace(mut self, name: &str, channels: &[&str]) -> Self {
        self.workspaces.push(SimWorkspace {
            name: name.to_owned(),
            channels: channels.iter().map(|c| ChannelEntry::from(*c)).collect(),
        });
        self
    }

    /// Add a history message to a channel.
    #[must_use]
    pub fn with_message(mut self, workspace: &str, channel: &str, entry: HistoryEntry) -> Self {
        self.history.entry((workspace.to_owned(), channel.to_owned())).or_default().push(entry);
        self
    }

    /// Make the next request with this action fail with `reason`.
    pub fn fail_next(&mut self, action: &str, reason: &str) {
        self.failures.push_back((action.to_owned(), reason.to_owned()));
    }

    /// Requests received so far, in order.
    pub fn received(&self) -> &[Outbound] {
        &self.received
    }

    /// Action tags of the requests received so far.
    pub fn received_actions(&self) -> Vec<&'static str> {
        self.received.iter().map(|o| o.request.action()).collect()
    }

    /// Identities announced with `register_user`.
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Workspace names in order.
    pub fn workspace_names(&self) -> Vec<&str> {
        self.workspaces.iter().map(|w| w.name.as_str()).collect()
    }

    /// History of one channel.
    pub fn history(&self, workspace: &str, channel: &str) -> &[HistoryEntry] {
        self.history
            .get(&(workspace.to_owned(), channel.to_owned()))
            .map_or(&[], Vec::as_slice)
    }

    /// Handle one request frame. Undecodable frames are ignored.
    pub fn handle(&mut self, text: &str) -> Vec<Delivery> {
        let outbound = match Outbound::decode(text) {
            Ok(outbound) => outbound,
            Err(error) => {
                tracing::debug!(%error, "sim server ignoring frame");
                return Vec::new();
            },
        };
        self.received.push(outbound.clone());

        if let Some(reason) = self.take_failure(outbound.request.action()) {
            return self.failure(&outbound.request, reason);
        }

        let Outbound { header, request } = outbound;
        match request {
            Request::RegisterUser { username } => {
                let message = format!("welcome, {username}");
                if !self.users.contains(&username) {
                    self.users.push(username);
                }
                vec![self.response("register_user_response", Status::Success, &message)]
            },
            Request::GetWorkspaceList => vec![self.reply(Event::WorkspaceList(WorkspaceList {
                header: self.header(),
                workspaces: self.workspace_map(),
            }))],
            Request::GetChannelList { workspace } => match self.channels(&workspace) {
                Some(channels) => vec![self.reply(Event::ChannelList(ChannelList {
                    header: self.header(),
                    workspace: Some(workspace),
                    channels,
                }))],
                None => vec![self.response(
                    "get_channel_list_response",
                    Status::Failure("error".into()),
                    &format!("unknown workspace {workspace}"),
                )],
            },
            Request::GetChannelData { workspace, channel } => {
                let messages = self.history(&workspace, &channel).to_vec();
                vec![self.reply(Event::ChannelData(ChannelData {
                    header: self.header(),
                    workspace: Some(workspace),
                    channel,
                    messages,
                }))]
            },
            Request::SendMessage { workspace, channel, body } => {
                self.post(header, workspace, channel, body).into_iter().collect()
            },
            Request::CreateWorkspace { workspace_name } => self.create_workspace(workspace_name),
            Request::DeleteWorkspace { workspace } => self.delete_workspace(&workspace),
            Request::CreateChannel { workspace, channel_name, description } => {
                self.create_channel(&workspace, channel_name, description)
            },
            Request::DeleteChannel { workspace, channel } => {
                self.delete_channel(&workspace, &channel)
            },
            Request::Search(query) => vec![self.search(&query)],
        }
    }

    /// Record a chat message from another client and return its broadcast.
    pub fn push_chat(
        &mut self,
        sender: &str,
        workspace: &str,
        channel: &str,
        body: &str,
    ) -> Option<Delivery> {
        let header = Header::new(sender, self.now);
        self.post(header, workspace.to_owned(), channel.to_owned(), body.to_owned())
    }

    /// Remove a workspace as if another client deleted it.
    pub fn push_workspace_removal(&mut self, name: &str) -> Delivery {
        self.workspaces.retain(|w| w.name != name);
        let mut workspaces = OrderedMap::new();
        workspaces.insert(name, None);
        self.broadcast(Event::WorkspaceUpdate(WorkspaceUpdate { header: self.header(), workspaces }))
    }

    fn post(
        &mut self,
        header: Header,
        workspace: String,
        channel: String,
        body: String,
    ) -> Option<Delivery> {
        let entry = HistoryEntry {
            date: header.date,
            time: header.time,
            sender: header.sender.clone(),
            body: body.clone(),
        };
        self.history.entry((workspace.clone(), channel.clone())).or_default().push(entry);

        let chat = Event::Chat(ChatMessage {
            header,
            action: Some(CHAT_ACTION.to_owned()),
            workspace: Some(workspace),
            channel: Some(channel),
            body,
        });
        match chat.encode() {
            Ok(text) => Some(Delivery::Broadcast(text)),
            Err(error) => {
                tracing::warn!(%error, "sim server failed to encode chat");
                None
            },
        }
    }

    fn create_workspace(&mut self, name: String) -> Vec<Delivery> {
        if self.workspaces.iter().any(|w| w.name == name) {
            return vec![self.response(
                "create_workspace_response",
                Status::Failure("error".into()),
                &format!("workspace {name} already exists"),
            )];
        }
        self.workspaces.push(SimWorkspace { name: name.clone(), channels: Vec::new() });

        let mut workspaces = OrderedMap::new();
        workspaces.insert(name.as_str(), Some(Vec::new()));
        vec![
            self.response("create_workspace_response", Status::Success, &format!("created {name}")),
            self.broadcast(Event::WorkspaceUpdate(WorkspaceUpdate {
                header: self.header(),
                workspaces,
            })),
        ]
    }

    fn delete_workspace(&mut self, name: &str) -> Vec<Delivery> {
        if !self.workspaces.iter().any(|w| w.name == name) {
            return vec![self.response(
                "delete_workspace_response",
                Status::Failure("error".into()),
                &format!("unknown workspace {name}"),
            )];
        }
        self.workspaces.retain(|w| w.name != name);
        self.history.retain(|(workspace, _), _| workspace != name);

        let mut workspaces = OrderedMap::new();
        workspaces.insert(name, None);
        vec![
            self.response("delete_workspace_response", Status::Success, &format!("deleted {name}")),
            self.broadcast(Event::WorkspaceUpdate(WorkspaceUpdate {
                header: self.header(),
                workspaces,
            })),
        ]
    }

    fn create_channel(&mut self, workspace: &str, name: String, description: String) -> Vec<Delivery> {
        let Some(index) = self.workspaces.iter().position(|w| w.name == workspace) else {
            return vec![self.response(
                "create_channel_response",
                Status::Failure("error".into()),
                &format!("unknown workspace {workspace}"),
            )];
        };
        if self.workspaces[index].channels.iter().any(|c| c.name() == name) {
            return vec![self.response(
                "create_channel_response",
                Status::Failure("error".into()),
                &format!("channel {name} already exists"),
            )];
        }

        let entry = if description.is_empty() {
            ChannelEntry::Name(name.clone())
        } else {
            ChannelEntry::Detailed { name: name.clone(), description: Some(description) }
        };
        self.workspaces[index].channels.push(entry);
        let channels = self.workspaces[index].channels.clone();

        vec![
            self.response("create_channel_response", Status::Success, &format!("created {name}")),
            self.broadcast(Event::ChannelUpdate(ChannelUpdate {
                header: self.header(),
                workspace: workspace.to_owned(),
                channels,
            })),
        ]
    }

    fn delete_channel(&mut self, workspace: &str, name: &str) -> Vec<Delivery> {
        let index = self
            .workspaces
            .iter()
            .position(|w| w.name == workspace && w.channels.iter().any(|c| c.name() == name));
        let Some(index) = index else {
            return vec![self.response(
                "delete_channel_response",
                Status::Failure("error".into()),
                &format!("unknown channel {workspace}/{name}"),
            )];
        };
        self.workspaces[index].channels.retain(|c| c.name() != name);
        let channels = self.workspaces[index].channels.clone();
        self.history.remove(&(workspace.to_owned(), name.to_owned()));

        vec![
            self.response("delete_channel_response", Status::Success, &format!("deleted {name}")),
            self.broadcast(Event::ChannelUpdate(ChannelUpdate {
                header: self.header(),
                workspace: workspace.to_owned(),
                channels,
            })),
        ]
    }

    fn search(&self, query: &SearchQuery) -> Delivery {
        let needle = query.query.as_deref().map(str::to_lowercase);
        let mut results = Vec::new();
        for workspace in &self.workspaces {
            if query.workspace.as_ref().is_some_and(|w| *w != workspace.name) {
                continue;
            }
            for channel in &workspace.channels {
                if query.channel.as_deref().is_some_and(|c| c != channel.name()) {
                    continue;
                }
                let hits = self
                    .history(&workspace.name, channel.name())
                    .iter()
                    .filter(|e| query.sender.as_ref().is_none_or(|s| *s == e.sender))
                    .filter(|e| query.date_from.is_none_or(|d| e.date >= d))
                    .filter(|e| query.date_to.is_none_or(|d| e.date <= d))
                    .filter(|e| {
                        needle.as_ref().is_none_or(|n| e.body.to_lowercase().contains(n.as_str()))
                    })
                    .map(|e| SearchHit {
                        date: e.date,
                        time: e.time,
                        sender: e.sender.clone(),
                        body: e.body.clone(),
                        workspace: workspace.name.clone(),
                        channel: channel.name().to_owned(),
                    });
                results.extend(hits);
            }
        }
        self.reply(Event::SearchResponse(SearchResponse {
            header: self.header(),
            status: Status::Success,
            results,
            message: None,
        }))
    }

    fn take_failure(&mut self, action: &str) -> Option<String> {
        let index = self.failures.iter().position(|(a, _)| a == action)?;
        self.failures.remove(index).map(|(_, reason)| reason)
    }

    fn failure(&self, request: &Request, reason: String) -> Vec<Delivery> {
        match request {
            Request::Search(_) => vec![self.reply(Event::SearchResponse(SearchResponse {
                header: self.header(),
                status: Status::Failure("error".into()),
                results: Vec::new(),
                message: Some(reason),
            }))],
            _ => {
                let action = format!("{}_response", request.action());
                vec![self.response(&action, Status::Failure("error".into()), &reason)]
            },
        }
    }

    fn channels(&self, workspace: &str) -> Option<Vec<ChannelEntry>> {
        self.workspaces.iter().find(|w| w.name == workspace).map(|w| w.channels.clone())
    }

    fn workspace_map(&self) -> OrderedMap<Vec<ChannelEntry>> {
        self.workspaces.iter().map(|w| (w.name.as_str(), w.channels.clone())).collect()
    }

    fn header(&self) -> Header {
        Header::new(SERVER_NAME, self.now)
    }

    fn response(&self, action: &str, status: Status, message: &str) -> Delivery {
        self.reply(Event::Response(Response {
            header: self.header(),
            action: action.to_owned(),
            status,
            message: message.to_owned(),
        }))
    }

    fn reply(&self, event: Event) -> Delivery {
        Delivery::Reply(encode(&event))
    }

    fn broadcast(&self, event: Event) -> Delivery {
        Delivery::Broadcast(encode(&event))
    }
}

fn encode(event: &Event) -> String {
    event.encode().unwrap_or_else(|error| {
        tracing::warn!(%error, "sim server failed to encode event");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn request(request: Request) -> String {
        Outbound::new(Header::new("ana", now()), request).encode().unwrap()
    }

    fn events(deliveries: &[Delivery]) -> Vec<Event> {
        deliveries.iter().map(|d| Event::decode(d.text()).unwrap()).collect()
    }

    fn server() -> SimServer {
        SimServer::new(now()).with_workspace("acme", &["general", "random"]).with_message(
            "acme",
            "general",
            HistoryEntry {
                date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                sender: "bo".into(),
                body: "deploy done".into(),
            },
        )
    }

    #[test]
    fn workspace_list_reflects_state() {
        let mut server = server();

        let replies = events(&server.handle(&request(Request::GetWorkspaceList)));

        let [Event::WorkspaceList(list)] = replies.as_slice() else {
            panic!("expected workspace list, got {replies:?}");
        };
        assert_eq!(list.workspaces.keys().collect::<Vec<_>>(), ["acme"]);
        assert_eq!(server.received_actions(), ["get_workspace_list"]);
    }

    #[test]
    fn send_message_is_stored_and_broadcast() {
        let mut server = server();

        let deliveries = server.handle(&request(Request::SendMessage {
            workspace: "acme".into(),
            channel: "random".into(),
            body: "hi".into(),
        }));

        assert!(matches!(deliveries.as_slice(), [Delivery::Broadcast(_)]));
        assert_eq!(server.history("acme", "random").len(), 1);
        let events = events(&deliveries);
        let [Event::Chat(chat)] = events.as_slice() else {
            panic!("expected chat");
        };
        assert_eq!(chat.header.sender, "ana");
        assert_eq!(chat.action.as_deref(), Some(CHAT_ACTION));
    }

    #[test]
    fn create_channel_replies_then_broadcasts() {
        let mut server = server();

        let deliveries = server.handle(&request(Request::CreateChannel {
            workspace: "acme".into(),
            channel_name: "dev".into(),
            description: "builds".into(),
        }));

        assert!(matches!(deliveries.as_slice(), [Delivery::Reply(_), Delivery::Broadcast(_)]));
        let events = events(&deliveries);
        assert!(matches!(&events[0], Event::Response(r) if r.status.is_success()));
        assert!(matches!(&events[1], Event::ChannelUpdate(u) if u.channels.len() == 3));
    }

    #[test]
    fn duplicate_workspace_is_refused() {
        let mut server = server();

        let replies = events(
            &server.handle(&request(Request::CreateWorkspace { workspace_name: "acme".into() })),
        );

        let [Event::Response(response)] = replies.as_slice() else {
            panic!("expected response");
        };
        assert!(!response.status.is_success());
        assert_eq!(response.action, "create_workspace_response");
    }

    #[test]
    fn forced_failure_applies_once() {
        let mut server = server();
        server.fail_next("register_user", "banned");

        let first = events(&server.handle(&request(Request::RegisterUser { username: "x".into() })));
        let second = events(&server.handle(&request(Request::RegisterUser { username: "x".into() })));

        assert!(matches!(&first[0], Event::Response(r) if r.message == "banned"));
        assert!(matches!(&second[0], Event::Response(r) if r.status.is_success()));
        assert_eq!(server.users(), ["x"]);
    }

    #[test]
    fn search_applies_every_filter() {
        let mut server = server();

        let query = |query: SearchQuery| {
            let deliveries = server.clone().handle(&request(Request::Search(query)));
            match events(&deliveries).pop() {
                Some(Event::SearchResponse(response)) => response.results.len(),
                other => panic!("expected search response, got {other:?}"),
            }
        };

        assert_eq!(query(SearchQuery::default()), 1);
        assert_eq!(query(SearchQuery { query: Some("DEPLOY".into()), ..SearchQuery::default() }), 1);
        assert_eq!(query(SearchQuery { sender: Some("ana".into()), ..SearchQuery::default() }), 0);
        assert_eq!(
            query(SearchQuery {
                date_from: NaiveDate::from_ymd_opt(2024, 2, 1),
                ..SearchQuery::default()
            }),
            0
        );
        assert_eq!(query(SearchQuery { channel: Some("random".into()), ..SearchQuery::default() }), 0);
        server.fail_next("search", "index offline");
        let deliveries = server.handle(&request(Request::Search(SearchQuery::default())));
        assert!(matches!(
            events(&deliveries).as_slice(),
            [Event::SearchResponse(r)] if r.message.as_deref() == Some("index offline")
        ));
    }

    #[test]
    fn garbage_is_ignored() {
        let mut server = server();

        assert!(server.handle("not json").is_empty());
        assert!(server.received().is_empty());
    }
}
