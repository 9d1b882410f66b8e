//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` stands in for the terminal front-end. Tests script intents
//! through a [`SimDriverHandle`] and observe every notification and view
//! update the [`huddle_app::Runtime`] produced. A [`SimView`] replays the
//! updates the way a real front-end would, giving tests a rendered-state
//! oracle to assert against.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use huddle_app::{
    ActiveSelection, ConnectionState, Driver, Intent, Message, NotificationSink,
    PresentationSink, TranscriptEntry, ViewUpdate, Workspace,
};
use huddle_proto::SearchHit;
use thiserror::Error;
use tokio::sync::mpsc;

/// Error type for the simulation driver.
#[derive(Debug, Error)]
pub enum SimDriverError {
    /// A wait ran out of time.
    #[error("condition not reached within {0:?}")]
    Timeout(Duration),
}

/// Front-end state rebuilt from view updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimView {
    /// Last reported connection state
    pub connection: ConnectionState,
    /// Workspace/channel tree
    pub workspaces: Vec<Workspace>,
    /// Highlighted workspace and channel
    pub selection: ActiveSelection,
    /// Transcript lines in display order
    pub transcript: Vec<TranscriptEntry>,
    /// Latest search results
    pub search_results: Vec<SearchHit>,
    /// Latest status line
    pub status: Option<String>,
}

impl Default for SimView {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            workspaces: Vec::new(),
            selection: ActiveSelection::default(),
            transcript: Vec::new(),
            search_results: Vec::new(),
            status: None,
        }
    }
}

impl SimView {
    /// Apply one update.
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
            ViewUpdate::SearchResults(results) => self.search_results = results,
            ViewUpdate::Status(text) => self.status = Some(text),
        }
    }

    /// Messages shown, without day markers.
    pub fn messages(&self) -> Vec<&Message> {
        self.transcript
            .iter()
            .filter_map(|entry| match entry {
                TranscriptEntry::Message(message) => Some(message),
                TranscriptEntry::DayMarker(_) => None,
            })
            .collect()
    }

    /// Bodies of the messages shown.
    pub fn bodies(&self) -> Vec<&str> {
        self.messages().into_iter().map(|m| m.body.as_str()).collect()
    }

    /// Workspace names in the tree.
    pub fn workspace_names(&self) -> Vec<&str> {
        self.workspaces.iter().map(|w| w.name.as_str()).collect()
    }

    /// Channel names of one workspace.
    pub fn channel_names(&self, workspace: &str) -> Vec<&str> {
        self.workspaces
            .iter()
            .find(|w| w.name == workspace)
            .map(|w| w.channels.iter().map(|c| c.name.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Everything the driver has been told.
#[derive(Debug, Default)]
pub struct Record {
    /// View updates in arrival order
    pub updates: Vec<ViewUpdate>,
    /// `(title, body)` notifications in arrival order
    pub notifications: Vec<(String, String)>,
    /// State after applying every update
    pub view: SimView,
    /// Whether the runtime stopped the driver
    pub stopped: bool,
}

/// Simulation front-end.
pub struct SimDriver {
    intents: mpsc::UnboundedReceiver<Intent>,
    record: Arc<Mutex<Record>>,
}

/// Test-side handle to a [`SimDriver`].
#[derive(Clone)]
pub struct SimDriverHandle {
    intents: mpsc::UnboundedSender<Intent>,
    record: Arc<Mutex<Record>>,
}

impl SimDriver {
    /// A driver and the handle that scripts it.
    pub fn new() -> (Self, SimDriverHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let record = Arc::new(Mutex::new(Record::default()));
        let handle = SimDriverHandle { intents: tx, record: Arc::clone(&record) };
        (Self { intents: rx, record }, handle)
    }

    fn record(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for SimDriver {
    fn notify(&mut self, title: &str, body: &str) {
        tracing::debug!(title, body, "sim notification");
        self.record().notifications.push((title.to_owned(), body.to_owned()));
    }
}

impl PresentationSink for SimDriver {
    fn present(&mut self, update: ViewUpdate) {
        let mut record = self.record();
        record.view.apply(update.clone());
        record.updates.push(update);
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    /// A dropped handle reads as the user quitting.
    async fn poll_intent(&mut self) -> Result<Option<Intent>, Self::Error> {
        Ok(Some(self.intents.recv().await.unwrap_or(Intent::Quit)))
    }

    fn stop(&mut self) {
        self.record().stopped = true;
    }
}

impl SimDriverHandle {
    /// Queue an intent. Ignored once the runtime has exited.
    pub fn send(&self, intent: Intent) {
        if self.intents.send(intent).is_err() {
            tracing::debug!("runtime gone, intent dropped");
        }
    }

    /// Current view.
    pub fn view(&self) -> SimView {
        self.record().view.clone()
    }

    /// Notifications so far.
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.record().notifications.clone()
    }

    /// View updates so far.
    pub fn updates(&self) -> Vec<ViewUpdate> {
        self.record().updates.clone()
    }

    /// Whether the driver was stopped.
    pub fn stopped(&self) -> bool {
        self.record().stopped
    }

    /// Wait until `condition` holds for the record.
    ///
    /// # Errors
    ///
    /// - `SimDriverError::Timeout` if it does not hold within `timeout`
    pub async fn wait_until(
        &self,
        timeout: Duration,
        condition: impl Fn(&Record) -> bool,
    ) -> Result<(), SimDriverError> {
        let poll = async {
            loop {
                if condition(&self.record()) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.map_err(|_| SimDriverError::Timeout(timeout))
    }

    /// Wait until the view satisfies `condition`.
    ///
    /// # Errors
    ///
    /// - `SimDriverError::Timeout` if it does not hold within `timeout`
    pub async fn wait_for_view(
        &self,
        timeout: Duration,
        condition: impl Fn(&SimView) -> bool,
    ) -> Result<(), SimDriverError> {
        self.wait_until(timeout, |record| condition(&record.view)).await
    }

    fn record(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn message(body: &str) -> Message {
        Message {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            sender: "ana".into(),
            workspace: "acme".into(),
            channel: "general".into(),
            body: body.into(),
        }
    }

    #[test]
    fn view_replays_appends_with_markers() {
        let mut view = SimView::default();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        view.apply(ViewUpdate::TranscriptReplaced(vec![]));
        view.apply(ViewUpdate::MessageAppended { marker: Some(date), message: message("a") });
        view.apply(ViewUpdate::MessageAppended { marker: None, message: message("b") });

        assert_eq!(view.transcript.len(), 3);
        assert_eq!(view.transcript[0], TranscriptEntry::DayMarker(date));
        assert_eq!(view.bodies(), ["a", "b"]);
    }

    #[tokio::test]
    async fn dropped_handle_reads_as_quit() {
        let (mut driver, handle) = SimDriver::new();
        handle.send(Intent::Refresh);
        drop(handle);

        assert_eq!(driver.poll_intent().await.unwrap(), Some(Intent::Refresh));
        assert_eq!(driver.poll_intent().await.unwrap(), Some(Intent::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_until_times_out() {
        let (_driver, handle) = SimDriver::new();

        let result = handle.wait_until(Duration::from_secs(1), |r| r.stopped).await;

        assert!(matches!(result, Err(SimDriverError::Timeout(_))));
    }
}
