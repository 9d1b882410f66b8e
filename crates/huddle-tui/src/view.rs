//! Terminal view model.
//!
//! Rebuilt from the runtime's [`ViewUpdate`]s and read by the renderer.

use std::collections::VecDeque;

use huddle_app::{ActiveSelection, ConnectionState, TranscriptEntry, ViewUpdate, Workspace};
use huddle_proto::SearchHit;

/// Notifications kept for display.
const MAX_NOTICES: usize = 3;

/// A notification shown in the status area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Short title
    pub title: String,
    /// Detail
    pub body: String,
}

/// Everything the renderer draws.
#[derive(Debug, Clone)]
pub struct View {
    /// Local identity
    pub identity: String,
    /// Connection state
    pub connection: ConnectionState,
    /// Workspace/channel tree
    pub workspaces: Vec<Workspace>,
    /// Active workspace and channel
    pub selection: ActiveSelection,
    /// Visible transcript
    pub transcript: Vec<TranscriptEntry>,
    /// Latest search results
    pub search_results: Vec<SearchHit>,
    /// Whether the search pane is open
    pub show_search: bool,
    /// Latest status text
    pub status: Option<String>,
    notices: VecDeque<Notice>,
}

impl View {
    /// Empty view for `identity`.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            connection: ConnectionState::Disconnected,
            workspaces: Vec::new(),
            selection: ActiveSelection::default(),
            transcript: Vec::new(),
            search_results: Vec::new(),
            show_search: false,
            status: None,
            notices: VecDeque::new(),
        }
    }

    /// Apply one runtime update.
    pub fn apply(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::ConnectionChanged(state) => self.connection = state,
            ViewUpdate::WorkspacesChanged(workspaces) => self.workspaces = workspaces,
            ViewUpdate::SelectionChanged(selection) => self.selection = selection,
            ViewUpdate::TranscriptReplaced(entries) => self.transcript = entries,
            ViewUpdate::MessageAppended { marker, message } => {
                if let Some(date) = marker {
                    self.transcript.push(TranscriptEntry::DayMarker(date));
                }
                self.transcript.push(TranscriptEntry::Message(message));
            },
            ViewUpdate::SearchResults(results) => {
                self.search_results = results;
                self.show_search = true;
            },
            ViewUpdate::Status(text) => self.status = Some(text),
        }
    }

    /// Record a notification, dropping the oldest beyond the limit.
    pub fn notify(&mut self, title: &str, body: &str) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice { title: title.to_owned(), body: body.to_owned() });
    }

    /// Most recent notification.
    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.back()
    }

    /// Close the search pane.
    pub fn close_search(&mut self) {
        self.show_search = false;
    }

    /// Set a local status message.
    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(text.into());
    }

    /// The active workspace.
    pub fn active_workspace(&self) -> Option<&Workspace> {
        let name = self.selection.workspace.as_deref()?;
        self.workspaces.iter().find(|w| w.name == name)
    }

    /// Channel after (or before) the active one, wrapping around.
    pub fn cycle_channel(&self, forward: bool) -> Option<String> {
        let workspace = self.active_workspace()?;
        let names: Vec<&str> = workspace.channels.iter().map(|c| c.name.as_str()).collect();
        cycle(&names, self.selection.channel.as_deref(), forward)
    }

    /// Workspace after (or before) the active one, wrapping around.
    pub fn cycle_workspace(&self, forward: bool) -> Option<String> {
        let names: Vec<&str> = self.workspaces.iter().map(|w| w.name.as_str()).collect();
        cycle(&names, self.selection.workspace.as_deref(), forward)
    }
}

fn cycle(names: &[&str], current: Option<&str>, forward: bool) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    let len = names.len();
    let next = match current.and_then(|c| names.iter().position(|n| *n == c)) {
        Some(index) if forward => (index + 1) % len,
        Some(index) => (index + len - 1) % len,
        None => 0,
    };
    let name = names[next];
    (Some(name) != current).then(|| name.to_owned())
}
