//! Server-to-client events.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{DecodeError, EncodeError, Header, OrderedMap, action, wire};

/// One recorded message inside a `channel_data` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Day the message was posted.
    #[serde(with = "crate::wire::date")]
    pub date: NaiveDate,
    /// Time the message was posted.
    #[serde(with = "crate::wire::time")]
    pub time: NaiveTime,
    /// Author identity.
    #[serde(default)]
    pub sender: String,
    /// Message text.
    #[serde(rename = "message", default, deserialize_with = "wire::lenient_text")]
    pub body: String,
}

/// A channel as listed by the server: a bare name or a name with a
/// description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelEntry {
    /// Bare channel name.
    Name(String),
    /// Channel with metadata.
    Detailed {
        /// Channel name.
        name: String,
        /// Optional description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl ChannelEntry {
    /// Channel name.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }

    /// Channel description, if the server sent one.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Name(_) => None,
            Self::Detailed { description, .. } => description.as_deref(),
        }
    }
}

impl From<&str> for ChannelEntry {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

/// Outcome of a request that has a `*_response`.
///
/// The literal `"success"` is success; any other value is failure and keeps
/// the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    /// Request succeeded.
    Success,
    /// Request failed; holds the raw status text.
    Failure(String),
}

impl Status {
    /// Whether the request succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        if raw == "success" { Self::Success } else { Self::Failure(raw) }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => "success".to_owned(),
            Status::Failure(raw) => raw,
        }
    }
}

/// `channel_data`: full transcript of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelData {
    /// Envelope.
    #[serde(flatten)]
    pub header: Header,
    /// Workspace the snapshot belongs to, when the server names it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Channel the snapshot belongs to.
    #[serde(default)]
    pub channel: String,
    /// Messages in server order.
    #[serde(rename = "message", default)]
    pub messages: Vec<HistoryEntry>,
}

/// `workspace_list`: the full workspace → channels mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceList {
    /// Envelope.
    #[serde(flatten)]
    pub header: Header,
    /// Workspaces in server order.
    #[serde(rename = "message", default)]
    pub workspaces: OrderedMap<Vec<ChannelEntry>>,
}

/// `channel_list`: the channel set of the current workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelList {
    /// Envelope.
    #[serde(flatten)]
    pub header: Header,
    /// Workspace the list belongs to, when the server names it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Channels in server order.
    #[serde(rename = "message", default)]
    pub channels: Vec<ChannelEntry>,
}

/// `workspace_update`: replace the channel sets of the listed workspaces.
///
/// A `null` channel set removes the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceUpdate {
    /// Envelope.
    #[serde(flatten)]
    pub header: Header,
    /// Changed workspaces in server order.
    #[serde(rename = "message", default)]
    pub workspaces: OrderedMap<Option<Vec<ChannelEntry>>>,
}

/// `channel_update`: replace one workspace's channel set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelUpdate {
    /// Envelope.
    #[serde(flatten)]
    pub header: Header,
    /// Workspace whose channels changed.
    pub workspace: String,
    /// New channel set in server order.
    #[serde(rename = "message", default)]
    pub channels: Vec<ChannelEntry>,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Day the message was posted.
    #[serde(with = "crate::wire::date")]
    pub date: NaiveDate,
    /// Time the message was posted.
    #[serde(with = "crate::wire::time")]
    pub time: NaiveTime,
    /// Author identity.
    #[serde(default)]
    pub sender: String,
    /// Message text.
    #[serde(rename = "message", default, deserialize_with = "wire::lenient_text")]
    pub body: String,
    /// Workspace the message lives in.
    #[serde(default)]
    pub workspace: String,
    /// Channel the message lives in.
    #[serde(default)]
    pub channel: String,
}

/// `search_response`: results of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Envelope.
    #[serde(flatten)]
    pub header: Header,
    /// Outcome.
    pub status: Status,
    /// Matches, empty on failure.
    #[serde(default)]
    pub results: Vec<SearchHit>,
    /// Failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Any `*_response` other than `search_response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Envelope.
    #[serde(flatten)]
    pub header: Header,
    /// Full action tag, e.g. `create_workspace_response`.
    #[serde(skip)]
    pub action: String,
    /// Outcome.
    pub status: Status,
    /// Human-readable detail.
    #[serde(default, deserialize_with = "wire::lenient_text")]
    pub message: String,
}

impl Response {
    /// Action tag with the `_response` suffix removed.
    pub fn request_action(&self) -> &str {
        self.action.strip_suffix(action::RESPONSE_SUFFIX).unwrap_or(&self.action)
    }
}

/// Live chat message, or any unrecognised action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Envelope.
    #[serde(flatten)]
    pub header: Header,
    /// Original action tag; `None` when the message carried none.
    #[serde(skip)]
    pub action: Option<String>,
    /// Workspace the message was posted to, when named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Channel the message was posted to, when named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Message text.
    #[serde(rename = "message", default, deserialize_with = "wire::lenient_text")]
    pub body: String,
}

/// A decoded server push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Transcript snapshot.
    ChannelData(ChannelData),
    /// Full workspace mapping.
    WorkspaceList(WorkspaceList),
    /// Channels of the current workspace.
    ChannelList(ChannelList),
    /// Partial workspace mapping.
    WorkspaceUpdate(WorkspaceUpdate),
    /// One workspace's channels.
    ChannelUpdate(ChannelUpdate),
    /// Search results.
    SearchResponse(SearchResponse),
    /// Status response to a mutation.
    Response(Response),
    /// Live chat or unknown action.
    Chat(ChatMessage),
}

impl Event {
    /// Decode one wire message.
    ///
    /// Unknown or missing `action` tags decode as [`Event::Chat`]; only
    /// malformed JSON, non-object JSON, or a recognised action with a
    /// mismatched payload is an error.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` as described above.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let fields = match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => fields,
            other => return Err(DecodeError::NotAnObject { found: wire::kind(&other) }),
        };
        let tag = fields.get(action::KEY).and_then(Value::as_str).map(str::to_owned);
        let value = Value::Object(fields);

        let event = match tag.as_deref() {
            Some(action::CHANNEL_DATA) => Self::ChannelData(payload(action::CHANNEL_DATA, value)?),
            Some(action::WORKSPACE_LIST) => {
                Self::WorkspaceList(payload(action::WORKSPACE_LIST, value)?)
            },
            Some(action::CHANNEL_LIST) => Self::ChannelList(payload(action::CHANNEL_LIST, value)?),
            Some(action::WORKSPACE_UPDATE) => {
                Self::WorkspaceUpdate(payload(action::WORKSPACE_UPDATE, value)?)
            },
            Some(action::CHANNEL_UPDATE) => {
                Self::ChannelUpdate(payload(action::CHANNEL_UPDATE, value)?)
            },
            Some(action::SEARCH_RESPONSE) => {
                Self::SearchResponse(payload(action::SEARCH_RESPONSE, value)?)
            },
            Some(name) if name.ends_with(action::RESPONSE_SUFFIX) => {
                let mut response: Response = payload(name, value)?;
                response.action = name.to_owned();
                Self::Response(response)
            },
            _ => {
                let mut chat: ChatMessage = payload(tag.as_deref().unwrap_or("chat"), value)?;
                chat.action = tag;
                Self::Chat(chat)
            },
        };
        Ok(event)
    }

    /// Encode as one flat JSON object. Used by servers and test doubles.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError` if serialization fails.
    pub fn encode(&self) -> Result<String, EncodeError> {
        let label = self.action().unwrap_or("chat").to_owned();
        let value = match self {
            Self::ChannelData(p) => serde_json::to_value(p),
            Self::WorkspaceList(p) => serde_json::to_value(p),
            Self::ChannelList(p) => serde_json::to_value(p),
            Self::WorkspaceUpdate(p) => serde_json::to_value(p),
            Self::ChannelUpdate(p) => serde_json::to_value(p),
            Self::SearchResponse(p) => serde_json::to_value(p),
            Self::Response(p) => serde_json::to_value(p),
            Self::Chat(p) => serde_json::to_value(p),
        }
        .map_err(|source| EncodeError::Json { action: label.clone(), source })?;

        let Value::Object(mut fields) = value else {
            return Err(EncodeError::NotAnObject { action: label });
        };
        if let Some(tag) = self.action() {
            fields.insert(action::KEY.to_owned(), Value::String(tag.to_owned()));
        }
        serde_json::to_string(&Value::Object(fields))
            .map_err(|source| EncodeError::Json { action: label, source })
    }

    /// Wire `action` tag. `None` only for a chat message that carried none.
    pub fn action(&self) -> Option<&str> {
        match self {
            Self::ChannelData(_) => Some(action::CHANNEL_DATA),
            Self::WorkspaceList(_) => Some(action::WORKSPACE_LIST),
            Self::ChannelList(_) => Some(action::CHANNEL_LIST),
            Self::WorkspaceUpdate(_) => Some(action::WORKSPACE_UPDATE),
            Self::ChannelUpdate(_) => Some(action::CHANNEL_UPDATE),
            Self::SearchResponse(_) => Some(action::SEARCH_RESPONSE),
            Self::Response(r) => Some(&r.action),
            Self::Chat(c) => c.action.as_deref(),
        }
    }

    /// Envelope of the event.
    pub fn header(&self) -> &Header {
        match self {
            Self::ChannelData(p) => &p.header,
            Self::WorkspaceList(p) => &p.header,
            Self::ChannelList(p) => &p.header,
            Self::WorkspaceUpdate(p) => &p.header,
            Self::ChannelUpdate(p) => &p.header,
            Self::SearchResponse(p) => &p.header,
            Self::Response(p) => &p.header,
            Self::Chat(p) => &p.header,
        }
    }
}

fn payload<T: DeserializeOwned>(action: &str, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value)
        .map_err(|source| DecodeError::Payload { action: action.to_owned(), source })
}
