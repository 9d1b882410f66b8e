//! Application output actions.
//!
//! [`AppAction`]s are produced by the [`crate::App`] state machine and
//! executed by the runtime in order.

use chrono::NaiveDate;
use huddle_client::ConnectionState;
use huddle_proto::{Request, SearchHit};

use crate::{ActiveSelection, Message, TranscriptEntry, Workspace};

/// Actions returned by [`crate::App::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Stamp, encode and send a request.
    Send(Request),

    /// Show a transient notification.
    Notify {
        /// Notification title
        title: String,
        /// Notification body
        body: String,
    },

    /// Forward a view update to the presentation sink.
    Present(ViewUpdate),

    /// Store a settings value.
    Persist {
        /// Settings key
        key: &'static str,
        /// Value to store
        value: String,
    },

    /// Exit the application.
    Quit,
}

/// Structured updates for the presentation layer.
///
/// Applying every update in order reproduces the store's visible state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    /// Connection state changed.
    ConnectionChanged(ConnectionState),

    /// The workspace/channel tree changed.
    WorkspacesChanged(Vec<Workspace>),

    /// The active selection changed.
    SelectionChanged(ActiveSelection),

    /// The visible transcript was replaced.
    TranscriptReplaced(Vec<TranscriptEntry>),

    /// A live message was appended to the visible transcript.
    MessageAppended {
        /// Date boundary to show before the message
        marker: Option<NaiveDate>,
        /// The message
        message: Message,
    },

    /// New search results.
    SearchResults(Vec<SearchHit>),

    /// Short status line, e.g. an operation result.
    Status(String),
}
