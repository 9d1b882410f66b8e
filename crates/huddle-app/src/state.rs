//! Value types held by the store.

use chrono::{NaiveDate, NaiveTime};
use huddle_proto::{ChannelEntry, ChatMessage, HistoryEntry};

/// One chat message. Never mutated after receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Calendar day
    pub date: NaiveDate,
    /// Time of day
    pub time: NaiveTime,
    /// Sender name
    pub sender: String,
    /// Workspace the message was posted in
    pub workspace: String,
    /// Channel the message was posted in
    pub channel: String,
    /// Body text
    pub body: String,
}

impl Message {
    /// Message from a channel snapshot's history.
    pub fn from_history(workspace: &str, channel: &str, entry: HistoryEntry) -> Self {
        Self {
            date: entry.date,
            time: entry.time,
            sender: entry.sender,
            workspace: workspace.to_owned(),
            channel: channel.to_owned(),
            body: entry.body,
        }
    }

    /// Message from a live push. Missing scope fields become empty.
    pub fn from_chat(chat: ChatMessage) -> Self {
        Self {
            date: chat.header.date,
            time: chat.header.time,
            sender: chat.header.sender,
            workspace: chat.workspace.unwrap_or_default(),
            channel: chat.channel.unwrap_or_default(),
            body: chat.body,
        }
    }
}

/// A channel within a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Channel name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Created locally, not yet confirmed by the server
    pub pending: bool,
}

impl Channel {
    /// Confirmed channel.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None, pending: false }
    }
}

impl From<&ChannelEntry> for Channel {
    fn from(entry: &ChannelEntry) -> Self {
        Self {
            name: entry.name().to_owned(),
            description: entry.description().map(str::to_owned),
            pending: false,
        }
    }
}

/// A workspace and its ordered channel set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Workspace name
    pub name: String,
    /// Channels in server order
    pub channels: Vec<Channel>,
    /// Created locally, not yet confirmed by the server
    pub pending: bool,
}

impl Workspace {
    /// Confirmed workspace with no known channels.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), channels: Vec::new(), pending: false }
    }

    /// Channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Replace the confirmed channels, keeping unconfirmed local ones that
    /// the new set does not mention.
    pub(crate) fn replace_channels(&mut self, entries: &[ChannelEntry]) {
        let mut channels: Vec<Channel> = entries.iter().map(Channel::from).collect();
        for local in self.channels.drain(..).filter(|c| c.pending) {
            if !channels.iter().any(|c| c.name == local.name) {
                channels.push(local);
            }
        }
        self.channels = channels;
    }
}

/// The (workspace, channel) pair currently shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSelection {
    /// Active workspace
    pub workspace: Option<String>,
    /// Active channel within the workspace
    pub channel: Option<String>,
}

impl ActiveSelection {
    /// Whether `(workspace, channel)` is the active pair.
    pub fn matches(&self, workspace: &str, channel: &str) -> bool {
        self.workspace.as_deref() == Some(workspace) && self.channel.as_deref() == Some(channel)
    }

    /// Both halves, if a channel is active.
    pub fn complete(&self) -> Option<(&str, &str)> {
        Some((self.workspace.as_deref()?, self.channel.as_deref()?))
    }
}

/// Messages of one calendar day, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    /// The day
    pub date: NaiveDate,
    /// Messages of that day
    pub messages: Vec<Message>,
}

/// Flattened transcript line for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    /// Date boundary preceding that day's messages
    DayMarker(NaiveDate),
    /// One message
    Message(Message),
}

/// A channel transcript grouped by day.
///
/// A snapshot is ordered by date ascending with arrival order kept within a
/// day. Live messages are appended in arrival order; one dated differently
/// from the last group opens a new group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    days: Vec<DayGroup>,
}

impl Transcript {
    /// Empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Group a snapshot's messages by day.
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let mut messages: Vec<Message> = messages.into_iter().collect();
        // stable: equal dates keep arrival order
        messages.sort_by_key(|m| m.date);

        let mut days: Vec<DayGroup> = Vec::new();
        for message in messages {
            match days.last_mut() {
                Some(day) if day.date == message.date => day.messages.push(message),
                _ => days.push(DayGroup { date: message.date, messages: vec![message] }),
            }
        }
        Self { days }
    }

    /// Append a live message. Returns the date marker to show before it, if
    /// it opened a new day.
    pub fn append(&mut self, message: Message) -> Option<NaiveDate> {
        match self.days.last_mut() {
            Some(day) if day.date == message.date => {
                day.messages.push(message);
                None
            },
            _ => {
                let date = message.date;
                self.days.push(DayGroup { date, messages: vec![message] });
                Some(date)
            },
        }
    }

    /// Day groups in display order.
    pub fn days(&self) -> &[DayGroup] {
        &self.days
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.days.iter().map(|d| d.messages.len()).sum()
    }

    /// Whether there are no messages.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Date markers and messages, flattened for presentation.
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        let mut entries = Vec::with_capacity(self.len() + self.days.len());
        for day in &self.days {
            entries.push(TranscriptEntry::DayMarker(day.date));
            entries.extend(day.messages.iter().cloned().map(TranscriptEntry::Message));
        }
        entries
    }
}
