//! User intents.

use huddle_proto::SearchQuery;

/// A user-originated operation.
///
/// Scope (workspace, channel) is implicit: the [`crate::App`] resolves it
/// against the active selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Post a message to the active channel.
    SendMessage {
        /// Message text
        body: String,
    },

    /// Switch to a workspace.
    SelectWorkspace(String),

    /// Switch to a channel of the active workspace.
    SelectChannel(String),

    /// Create a workspace.
    CreateWorkspace {
        /// Name of the new workspace
        name: String,
    },

    /// Delete a workspace.
    DeleteWorkspace {
        /// Workspace to delete
        name: String,
    },

    /// Create a channel in the active workspace.
    CreateChannel {
        /// Name of the new channel
        name: String,
        /// Optional description
        description: Option<String>,
    },

    /// Delete a channel of the active workspace.
    DeleteChannel {
        /// Channel to delete
        name: String,
    },

    /// Search message history. Absent filters do not restrict.
    Search(SearchQuery),

    /// Change and announce the local identity.
    RegisterIdentity(String),

    /// Re-request the workspace list and the active scope.
    Refresh,

    /// Exit the application.
    Quit,
}
