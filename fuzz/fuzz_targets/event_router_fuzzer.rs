//! Fuzz target for the event router and state store
//!
//! # Strategy
//!
//! - Server pushes (lists, partial updates, snapshots, chat, responses)
//!   over a small name pool so they collide with local state
//! - User intents interleaved with connection drops and send rejections
//!
//! # Invariants
//!
//! - Workspace names stay unique
//! - The active workspace, when set, exists
//! - The active channel, when set, exists in the active workspace

#![no_main]

use arbitrary::Arbitrary;
use chrono::NaiveDate;
use huddle_app::{App, AppEvent, ConnectionState, Intent};
use huddle_proto::{
    ChannelData, ChannelEntry, ChannelList, ChannelUpdate, ChatMessage, Event, Header,
    HistoryEntry, OrderedMap, Request, Response, Status, WorkspaceList, WorkspaceUpdate,
};
use libfuzzer_sys::fuzz_target;

const WORKSPACES: &[&str] = &["acme", "home", "lab"];
const CHANNELS: &[&str] = &["general", "dev", "ops"];
const ACTIONS: &[&str] = &[
    "create_workspace_response",
    "delete_workspace_response",
    "create_channel_response",
    "delete_channel_response",
    "register_user_response",
    "send_message_response",
];

#[derive(Debug, Clone, Arbitrary)]
enum Step {
    Connection(u8),
    SelectWorkspace(u8),
    SelectChannel(u8),
    CreateWorkspace(u8),
    DeleteWorkspace(u8),
    CreateChannel(u8),
    DeleteChannel(u8),
    Send,
    Rejected(u8),
    WorkspaceList(Vec<(u8, Vec<u8>)>),
    WorkspaceUpdate(Vec<(u8, Option<Vec<u8>>)>),
    ChannelList { workspace: Option<u8>, channels: Vec<u8> },
    ChannelUpdate { workspace: u8, channels: Vec<u8> },
    ChannelData { workspace: Option<u8>, channel: u8, days: Vec<u8> },
    Chat { own: bool, workspace: u8, channel: u8, day: u8 },
    Response { action: u8, ok: bool },
}

fn pick(pool: &'static [&'static str], index: u8) -> &'static str {
    pool[usize::from(index) % pool.len()]
}

fn channels(indexes: &[u8]) -> Vec<ChannelEntry> {
    indexes.iter().map(|&i| ChannelEntry::from(pick(CHANNELS, i))).collect()
}

fn day(offset: u8) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(offset % 8))
}

fn header(sender: &str, offset: u8) -> Header {
    Header::new(sender, day(offset).and_hms_opt(12, 0, 0).unwrap())
}

fn event(step: Step) -> AppEvent {
    let server = AppEvent::Server;
    match step {
        Step::Connection(n) => AppEvent::ConnectionChanged(match n % 3 {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            _ => ConnectionState::Connected,
        }),
        Step::SelectWorkspace(i) => {
            AppEvent::Intent(Intent::SelectWorkspace(pick(WORKSPACES, i).into()))
        },
        Step::SelectChannel(i) => AppEvent::Intent(Intent::SelectChannel(pick(CHANNELS, i).into())),
        Step::CreateWorkspace(i) => {
            AppEvent::Intent(Intent::CreateWorkspace { name: pick(WORKSPACES, i).into() })
        },
        Step::DeleteWorkspace(i) => {
            AppEvent::Intent(Intent::DeleteWorkspace { name: pick(WORKSPACES, i).into() })
        },
        Step::CreateChannel(i) => AppEvent::Intent(Intent::CreateChannel {
            name: pick(CHANNELS, i).into(),
            description: None,
        }),
        Step::DeleteChannel(i) => {
            AppEvent::Intent(Intent::DeleteChannel { name: pick(CHANNELS, i).into() })
        },
        Step::Send => AppEvent::Intent(Intent::SendMessage { body: "hi".into() }),
        Step::Rejected(i) => AppEvent::SendRejected {
            request: Request::CreateWorkspace { workspace_name: pick(WORKSPACES, i).into() },
            reason: "not connected".into(),
        },
        Step::WorkspaceList(entries) => server(Event::WorkspaceList(WorkspaceList {
            header: header("server", 0),
            workspaces: entries
                .iter()
                .map(|(w, c)| (pick(WORKSPACES, *w), channels(c)))
                .collect::<OrderedMap<_>>(),
        })),
        Step::WorkspaceUpdate(entries) => server(Event::WorkspaceUpdate(WorkspaceUpdate {
            header: header("server", 0),
            workspaces: entries
                .iter()
                .map(|(w, c)| (pick(WORKSPACES, *w), c.as_deref().map(channels)))
                .collect::<OrderedMap<_>>(),
        })),
        Step::ChannelList { workspace, channels: c } => server(Event::ChannelList(ChannelList {
            header: header("server", 0),
            workspace: workspace.map(|w| pick(WORKSPACES, w).to_owned()),
            channels: channels(&c),
        })),
        Step::ChannelUpdate { workspace, channels: c } => {
            server(Event::ChannelUpdate(ChannelUpdate {
                header: header("server", 0),
                workspace: pick(WORKSPACES, workspace).to_owned(),
                channels: channels(&c),
            }))
        },
        Step::ChannelData { workspace, channel, days } => {
            server(Event::ChannelData(ChannelData {
                header: header("server", 0),
                workspace: workspace.map(|w| pick(WORKSPACES, w).to_owned()),
                channel: pick(CHANNELS, channel).to_owned(),
                messages: days
                    .iter()
                    .map(|&d| HistoryEntry {
                        date: day(d),
                        time: chrono::NaiveTime::MIN,
                        sender: "bo".into(),
                        body: "old".into(),
                    })
                    .collect(),
            }))
        },
        Step::Chat { own, workspace, channel, day: d } => server(Event::Chat(ChatMessage {
            header: header(if own { "ana" } else { "bo" }, d),
            action: Some("send_message".into()),
            workspace: Some(pick(WORKSPACES, workspace).to_owned()),
            channel: Some(pick(CHANNELS, channel).to_owned()),
            body: "live".into(),
        })),
        Step::Response { action, ok } => server(Event::Response(Response {
            header: header("server", 0),
            action: pick(ACTIONS, action).to_owned(),
            status: if ok { Status::Success } else { Status::Failure("error".into()) },
            message: "done".into(),
        })),
    }
}

fuzz_target!(|steps: Vec<Step>| {
    let mut app = App::new("ana", vec!["acme".into()]);

    for step in steps {
        let _ = app.handle(event(step));

        let store = app.store();
        let mut names: Vec<&str> = store.workspaces().iter().map(|w| w.name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total, "duplicate workspace");

        let selection = store.selection();
        if let Some(workspace) = selection.workspace.as_deref() {
            let active = store.workspace(workspace).expect("active workspace must exist");
            if let Some(channel) = selection.channel.as_deref() {
                assert!(active.channel(channel).is_some(), "active channel must exist");
            }
        } else {
            assert!(selection.channel.is_none());
        }
    }
});
