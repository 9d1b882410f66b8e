//! Client-to-server requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{DecodeError, EncodeError, Header};

/// A request the client can send.
///
/// The variant name, in snake case, is the `action` tag on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Ask for the full transcript of one channel.
    GetChannelData {
        /// Workspace name.
        workspace: String,
        /// Channel name.
        channel: String,
    },

    /// Ask for the workspace → channel mapping.
    GetWorkspaceList,

    /// Ask for the channel set of one workspace.
    GetChannelList {
        /// Workspace name.
        workspace: String,
    },

    /// Post a chat message.
    SendMessage {
        /// Target workspace.
        workspace: String,
        /// Target channel.
        channel: String,
        /// Message text.
        #[serde(rename = "message")]
        body: String,
    },

    /// Announce the local identity.
    RegisterUser {
        /// Display identity.
        username: String,
    },

    /// Create a workspace.
    CreateWorkspace {
        /// Name of the new workspace.
        workspace_name: String,
    },

    /// Delete a workspace.
    DeleteWorkspace {
        /// Workspace to delete.
        workspace: String,
    },

    /// Create a channel inside a workspace.
    CreateChannel {
        /// Owning workspace.
        workspace: String,
        /// Name of the new channel.
        channel_name: String,
        /// Free-form description; empty when not given.
        #[serde(default)]
        description: String,
    },

    /// Delete a channel.
    DeleteChannel {
        /// Owning workspace.
        workspace: String,
        /// Channel to delete.
        channel: String,
    },

    /// Search message history.
    Search(SearchQuery),
}

impl Request {
    /// Wire `action` tag for this request.
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetChannelData { .. } => "get_channel_data",
            Self::GetWorkspaceList => "get_workspace_list",
            Self::GetChannelList { .. } => "get_channel_list",
            Self::SendMessage { .. } => "send_message",
            Self::RegisterUser { .. } => "register_user",
            Self::CreateWorkspace { .. } => "create_workspace",
            Self::DeleteWorkspace { .. } => "delete_workspace",
            Self::CreateChannel { .. } => "create_channel",
            Self::DeleteChannel { .. } => "delete_channel",
            Self::Search(_) => "search",
        }
    }

    /// Tag of the `*_response` the server answers this request with, if any.
    pub fn response_action(&self) -> Option<&'static str> {
        match self {
            Self::CreateWorkspace { .. } => Some("create_workspace_response"),
            Self::DeleteWorkspace { .. } => Some("delete_workspace_response"),
            Self::CreateChannel { .. } => Some("create_channel_response"),
            Self::DeleteChannel { .. } => Some("delete_channel_response"),
            Self::Search(_) => Some("search_response"),
            _ => None,
        }
    }
}

/// Search criteria. Every field is optional; absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text match against the message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Restrict to one workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Restrict to one channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Restrict to one sender. Sent as `sender_filter` so it cannot collide
    /// with the header's `sender`.
    #[serde(
        rename = "sender_filter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sender: Option<String>,
    /// Earliest day, inclusive.
    #[serde(
        with = "crate::wire::opt_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_from: Option<NaiveDate>,
    /// Latest day, inclusive.
    #[serde(
        with = "crate::wire::opt_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_to: Option<NaiveDate>,
}

/// A request together with its header, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    /// Stamp and sender.
    #[serde(flatten)]
    pub header: Header,
    /// Action and action-specific fields.
    #[serde(flatten)]
    pub request: Request,
}

impl Outbound {
    /// Pair a header with a request.
    pub fn new(header: Header, request: Request) -> Self {
        Self { header, request }
    }

    /// Encode as one flat JSON object.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError` if serialization fails.
    pub fn encode(&self) -> Result<String, EncodeError> {
        serde_json::to_string(self).map_err(|source| EncodeError::Json {
            action: self.request.action().to_owned(),
            source,
        })
    }

    /// Decode wire text produced by [`Outbound::encode`].
    ///
    /// Servers and test doubles use this side; the client itself never
    /// decodes requests.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the text is not a well-formed request.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }
}
