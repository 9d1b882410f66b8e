//! Action tags recognised on inbound messages.
//!
//! Outbound tags are derived from [`crate::Request`] variant names.

/// Full transcript snapshot for one channel.
pub const CHANNEL_DATA: &str = "channel_data";

/// Full workspace → channel-list mapping.
pub const WORKSPACE_LIST: &str = "workspace_list";

/// Channel set of the current workspace.
pub const CHANNEL_LIST: &str = "channel_list";

/// Replacement of the listed workspaces' channel sets.
pub const WORKSPACE_UPDATE: &str = "workspace_update";

/// Replacement of one workspace's channel set.
pub const CHANNEL_UPDATE: &str = "channel_update";

/// Results of a search request.
pub const SEARCH_RESPONSE: &str = "search_response";

/// Suffix shared by every status/message response.
pub const RESPONSE_SUFFIX: &str = "_response";

/// Key holding the action tag.
pub const KEY: &str = "action";
