//! Local view of server state.
//!
//! List and snapshot events are authoritative replacements for the scope they
//! cover; `*_update` events replace their scope too. Whenever a replacement
//! removes the active workspace or channel, the store falls back to the first
//! remaining entry and reports it as a [`Fallback`] so the caller can request
//! the new scope's data.

use std::collections::HashMap;

use chrono::NaiveDate;
use huddle_proto::{ChannelEntry, OrderedMap, SearchHit};

use crate::{
    AppError,
    state::{ActiveSelection, Channel, Message, Transcript, Workspace},
};

/// Selection change forced by a replacement or removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// The active workspace is gone. The named one (if any) is now active
    /// with no channel selected.
    Workspace(Option<String>),
    /// The active channel is gone. The named one (if any) is now active.
    Channel(Option<String>),
}

/// Where a live message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Outside the active selection; not shown
    Hidden,
    /// Appended to the visible transcript
    Appended {
        /// Date marker opened by the message
        marker: Option<NaiveDate>,
    },
}

/// Workspaces, channels, active selection and transcripts.
#[derive(Debug, Clone, Default)]
pub struct Store {
    workspaces: Vec<Workspace>,
    selection: ActiveSelection,
    visible: Transcript,
    snapshots: HashMap<(String, String), Transcript>,
    search_results: Vec<SearchHit>,
}

impl Store {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with workspace names from a previous session. The first
    /// one becomes active.
    pub fn seeded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::new();
        for name in names {
            let name = name.into();
            if store.workspace(&name).is_none() {
                store.workspaces.push(Workspace::new(name));
            }
        }
        store.selection.workspace = store.workspaces.first().map(|w| w.name.clone());
        store
    }

    /// Known workspaces in server order.
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    /// Workspace by name.
    pub fn workspace(&self, name: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.name == name)
    }

    /// Names of server-confirmed workspaces.
    pub fn confirmed_workspace_names(&self) -> Vec<String> {
        self.workspaces.iter().filter(|w| !w.pending).map(|w| w.name.clone()).collect()
    }

    /// Active selection.
    pub fn selection(&self) -> &ActiveSelection {
        &self.selection
    }

    /// Active workspace, if any.
    pub fn active_workspace(&self) -> Option<&Workspace> {
        self.selection.workspace.as_deref().and_then(|name| self.workspace(name))
    }

    /// Transcript of the active channel.
    pub fn transcript(&self) -> &Transcript {
        &self.visible
    }

    /// Latest snapshot received for a channel.
    pub fn cached(&self, workspace: &str, channel: &str) -> Option<&Transcript> {
        self.snapshots.get(&(workspace.to_owned(), channel.to_owned()))
    }

    /// Results of the last successful search.
    pub fn search_results(&self) -> &[SearchHit] {
        &self.search_results
    }

    /// Replace the whole workspace → channel mapping.
    ///
    /// Unconfirmed local workspaces the new set does not mention are kept,
    /// and so are unconfirmed channels of workspaces it does mention.
    pub fn replace_workspaces(
        &mut self,
        list: &OrderedMap<Vec<ChannelEntry>>,
    ) -> Option<Fallback> {
        let mut previous = std::mem::take(&mut self.workspaces);
        let mut workspaces: Vec<Workspace> = list
            .iter()
            .map(|(name, entries)| {
                let mut workspace = match previous.iter().position(|w| w.name == name) {
                    Some(index) => previous.remove(index),
                    None => Workspace::new(name),
                };
                workspace.pending = false;
                workspace.replace_channels(entries);
                workspace
            })
            .collect();
        workspaces.extend(previous.into_iter().filter(|w| w.pending));
        self.workspaces = workspaces;
        self.prune_snapshots();
        self.reconcile()
    }

    /// Replace the channel set of one workspace, creating it if unknown.
    pub fn replace_channels(
        &mut self,
        workspace: &str,
        entries: &[ChannelEntry],
    ) -> Option<Fallback> {
        match self.workspaces.iter_mut().find(|w| w.name == workspace) {
            Some(existing) => existing.replace_channels(entries),
            None => {
                let mut created = Workspace::new(workspace);
                created.replace_channels(entries);
                self.workspaces.push(created);
            },
        }
        self.prune_snapshots();
        self.reconcile()
    }

    /// Apply an incremental update: each listed workspace's channel set is
    /// replaced, and a `None` entry removes the workspace.
    pub fn apply_workspace_update(
        &mut self,
        update: &OrderedMap<Option<Vec<ChannelEntry>>>,
    ) -> Option<Fallback> {
        for (name, entries) in update.iter() {
            match entries {
                Some(entries) => match self.workspaces.iter_mut().find(|w| w.name == name) {
                    Some(existing) => {
                        existing.pending = false;
                        existing.replace_channels(entries);
                    },
                    None => {
                        let mut created = Workspace::new(name);
                        created.replace_channels(entries);
                        self.workspaces.push(created);
                    },
                },
                None => self.workspaces.retain(|w| w.name != name),
            }
        }
        self.prune_snapshots();
        self.reconcile()
    }

    /// Store the latest snapshot of a channel. Returns whether it is the
    /// active channel, in which case it replaced the visible transcript.
    pub fn replace_snapshot(
        &mut self,
        workspace: &str,
        channel: &str,
        messages: Vec<Message>,
    ) -> bool {
        let transcript = Transcript::from_messages(messages);
        let visible = self.selection.matches(workspace, channel);
        if visible {
            self.visible = transcript.clone();
        }
        self.snapshots.insert((workspace.to_owned(), channel.to_owned()), transcript);
        visible
    }

    /// Append a live message if it belongs to the active channel.
    pub fn append_message(&mut self, message: Message) -> Placement {
        if !self.selection.matches(&message.workspace, &message.channel) {
            return Placement::Hidden;
        }
        let key = (message.workspace.clone(), message.channel.clone());
        self.snapshots
            .entry(key)
            .or_insert_with(|| self.visible.clone())
            .append(message.clone());
        let marker = self.visible.append(message);
        Placement::Appended { marker }
    }

    /// Make `name` the active workspace. Clears the active channel and the
    /// visible transcript. Returns whether the selection changed.
    ///
    /// # Errors
    ///
    /// - `AppError::UnknownWorkspace` if `name` is not known
    pub fn select_workspace(&mut self, name: &str) -> Result<bool, AppError> {
        if self.workspace(name).is_none() {
            return Err(AppError::UnknownWorkspace(name.to_owned()));
        }
        if self.selection.workspace.as_deref() == Some(name) {
            return Ok(false);
        }
        self.set_workspace(Some(name.to_owned()));
        Ok(true)
    }

    /// Make `name` the active channel of the active workspace, showing its
    /// cached snapshot if one exists. Returns whether the selection changed.
    ///
    /// # Errors
    ///
    /// - `AppError::NoActiveWorkspace` if no workspace is active
    /// - `AppError::UnknownChannel` if the workspace has no such channel
    pub fn select_channel(&mut self, name: &str) -> Result<bool, AppError> {
        let workspace = self.active_workspace().ok_or(AppError::NoActiveWorkspace)?;
        if workspace.channel(name).is_none() {
            return Err(AppError::UnknownChannel {
                workspace: workspace.name.clone(),
                channel: name.to_owned(),
            });
        }
        if self.selection.channel.as_deref() == Some(name) {
            return Ok(false);
        }
        self.set_channel(Some(name.to_owned()));
        Ok(true)
    }

    /// Add a locally created, unconfirmed workspace.
    ///
    /// # Errors
    ///
    /// - `AppError::AlreadyExists` if the name is taken
    pub fn insert_pending_workspace(&mut self, name: &str) -> Result<(), AppError> {
        if self.workspace(name).is_some() {
            return Err(AppError::AlreadyExists(name.to_owned()));
        }
        self.workspaces.push(Workspace { pending: true, ..Workspace::new(name) });
        Ok(())
    }

    /// Add a locally created, unconfirmed channel to a workspace.
    ///
    /// # Errors
    ///
    /// - `AppError::UnknownWorkspace` if the workspace is not known
    /// - `AppError::AlreadyExists` if the channel name is taken
    pub fn insert_pending_channel(
        &mut self,
        workspace: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<(), AppError> {
        let owner = self
            .workspaces
            .iter_mut()
            .find(|w| w.name == workspace)
            .ok_or_else(|| AppError::UnknownWorkspace(workspace.to_owned()))?;
        if owner.channel(name).is_some() {
            return Err(AppError::AlreadyExists(name.to_owned()));
        }
        owner.channels.push(Channel { name: name.to_owned(), description, pending: true });
        Ok(())
    }

    /// Mark a workspace as confirmed by the server.
    pub fn confirm_workspace(&mut self, name: &str) {
        if let Some(workspace) = self.workspaces.iter_mut().find(|w| w.name == name) {
            workspace.pending = false;
        }
    }

    /// Mark a channel as confirmed by the server.
    pub fn confirm_channel(&mut self, workspace: &str, name: &str) {
        let channel = self
            .workspaces
            .iter_mut()
            .find(|w| w.name == workspace)
            .and_then(|w| w.channels.iter_mut().find(|c| c.name == name));
        if let Some(channel) = channel {
            channel.pending = false;
        }
    }

    /// Remove a workspace and its cached snapshots.
    pub fn remove_workspace(&mut self, name: &str) -> Option<Fallback> {
        self.workspaces.retain(|w| w.name != name);
        self.prune_snapshots();
        self.reconcile()
    }

    /// Remove a channel and its cached snapshot.
    pub fn remove_channel(&mut self, workspace: &str, name: &str) -> Option<Fallback> {
        if let Some(owner) = self.workspaces.iter_mut().find(|w| w.name == workspace) {
            owner.channels.retain(|c| c.name != name);
        }
        self.prune_snapshots();
        self.reconcile()
    }

    /// Remove a workspace if it is still unconfirmed.
    pub fn remove_pending_workspace(&mut self, name: &str) -> Option<Fallback> {
        self.workspaces.retain(|w| !(w.pending && w.name == name));
        self.reconcile()
    }

    /// Remove a channel if it is still unconfirmed.
    pub fn remove_pending_channel(&mut self, workspace: &str, name: &str) -> Option<Fallback> {
        if let Some(owner) = self.workspaces.iter_mut().find(|w| w.name == workspace) {
            owner.channels.retain(|c| !(c.pending && c.name == name));
        }
        self.reconcile()
    }

    /// Drop every unconfirmed workspace and channel.
    pub fn discard_pending(&mut self) -> Option<Fallback> {
        self.workspaces.retain(|w| !w.pending);
        for workspace in &mut self.workspaces {
            workspace.channels.retain(|c| !c.pending);
        }
        self.reconcile()
    }

    /// Replace the search results.
    pub fn set_search_results(&mut self, results: Vec<SearchHit>) {
        self.search_results = results;
    }

    fn set_workspace(&mut self, workspace: Option<String>) {
        self.selection = ActiveSelection { workspace, channel: None };
        self.visible = Transcript::new();
    }

    fn set_channel(&mut self, channel: Option<String>) {
        self.visible = match (&self.selection.workspace, &channel) {
            (Some(workspace), Some(channel)) => self
                .snapshots
                .get(&(workspace.clone(), channel.clone()))
                .cloned()
                .unwrap_or_default(),
            _ => Transcript::new(),
        };
        self.selection.channel = channel;
    }

    /// Fall back to the first workspace (or channel) if the active one is
    /// missing.
    fn reconcile(&mut self) -> Option<Fallback> {
        let Some(workspace) = self.active_workspace() else {
            let first = self.workspaces.first().map(|w| w.name.clone());
            if first == self.selection.workspace {
                return None;
            }
            self.set_workspace(first.clone());
            return Some(Fallback::Workspace(first));
        };

        let current = self.selection.channel.as_deref();
        if current.is_some_and(|c| workspace.channel(c).is_some()) {
            return None;
        }
        let first = workspace.channels.first().map(|c| c.name.clone());
        if first.as_deref() == current {
            return None;
        }
        self.set_channel(first.clone());
        Some(Fallback::Channel(first))
    }

    fn prune_snapshots(&mut self) {
        let workspaces = &self.workspaces;
        self.snapshots.retain(|(workspace, channel), _| {
            workspaces
                .iter()
                .any(|w| w.name == *workspace && w.channel(channel).is_some())
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn list(entries: &[(&str, &[&str])]) -> OrderedMap<Vec<ChannelEntry>> {
        entries
            .iter()
            .map(|(ws, chans)| (*ws, chans.iter().map(|c| ChannelEntry::from(*c)).collect()))
            .collect()
    }

    fn message(workspace: &str, channel: &str, date: &str, body: &str) -> Message {
        Message {
            date: date.parse().unwrap(),
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            sender: "bo".into(),
            workspace: workspace.into(),
            channel: channel.into(),
            body: body.into(),
        }
    }

    fn store_at(workspace: &str, channel: &str) -> Store {
        let mut store = Store::new();
        store.replace_workspaces(&list(&[(workspace, &[channel]), ("other", &["misc"])]));
        store.select_workspace(workspace).unwrap();
        store.select_channel(channel).unwrap();
        store
    }

    #[test]
    fn seeded_store_selects_first_workspace() {
        let store = Store::seeded(["acme", "home", "acme"]);

        assert_eq!(store.workspaces().len(), 2);
        assert_eq!(store.selection().workspace.as_deref(), Some("acme"));
        assert_eq!(store.selection().channel, None);
    }

    #[test]
    fn workspace_list_falls_back_to_first_key() {
        let mut store = store_at("acme", "general");

        let fallback = store.replace_workspaces(&list(&[("zeta", &["a"]), ("beta", &["b"])]));

        assert_eq!(fallback, Some(Fallback::Workspace(Some("zeta".into()))));
        assert_eq!(store.selection().workspace.as_deref(), Some("zeta"));
        assert_eq!(store.selection().channel, None);
        assert!(store.transcript().is_empty());
    }

    #[test]
    fn workspace_list_keeping_selection_is_silent() {
        let mut store = store_at("acme", "general");

        let fallback =
            store.replace_workspaces(&list(&[("new", &[]), ("acme", &["general", "random"])]));

        assert_eq!(fallback, None);
        assert!(store.selection().matches("acme", "general"));
        let names: Vec<_> = store.workspaces().iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["new", "acme"]);
    }

    #[test]
    fn empty_workspace_list_clears_selection() {
        let mut store = store_at("acme", "general");

        let fallback = store.replace_workspaces(&OrderedMap::new());

        assert_eq!(fallback, Some(Fallback::Workspace(None)));
        assert_eq!(store.selection(), &ActiveSelection::default());
    }

    #[test]
    fn channel_list_falls_back_to_first_channel() {
        let mut store = store_at("acme", "general");

        let fallback =
            store.replace_channels("acme", &[ChannelEntry::from("dev"), ChannelEntry::from("ops")]);

        assert_eq!(fallback, Some(Fallback::Channel(Some("dev".into()))));
        assert!(store.selection().matches("acme", "dev"));
    }

    #[test]
    fn channel_list_for_other_workspace_leaves_selection() {
        let mut store = store_at("acme", "general");

        let fallback = store.replace_channels("other", &[ChannelEntry::from("x")]);

        assert_eq!(fallback, None);
        assert_eq!(store.workspace("other").unwrap().channels[0].name, "x");
    }

    #[test]
    fn workspace_update_removes_null_entries() {
        let mut store = store_at("acme", "general");
        let mut update = OrderedMap::new();
        update.insert("acme", None);
        update.insert("fresh", Some(vec![ChannelEntry::from("lobby")]));

        let fallback = store.apply_workspace_update(&update);

        assert_eq!(fallback, Some(Fallback::Workspace(Some("other".into()))));
        assert!(store.workspace("acme").is_none());
        assert!(store.workspace("fresh").is_some());
    }

    #[test]
    fn snapshot_for_active_channel_replaces_transcript() {
        let mut store = store_at("acme", "general");

        let visible = store.replace_snapshot("acme", "general", vec![
            message("acme", "general", "2024-01-02", "late"),
            message("acme", "general", "2024-01-01", "early"),
        ]);

        assert!(visible);
        assert_eq!(store.transcript().days()[0].date.to_string(), "2024-01-01");
    }

    #[test]
    fn snapshot_for_other_channel_is_cached_only() {
        let mut store = store_at("acme", "general");

        let visible =
            store.replace_snapshot("other", "misc", vec![message("other", "misc", "2024-01-01", "x")]);

        assert!(!visible);
        assert!(store.transcript().is_empty());
        assert_eq!(store.cached("other", "misc").unwrap().len(), 1);
    }

    #[test]
    fn switching_back_shows_cached_snapshot() {
        let mut store = store_at("acme", "general");
        store.replace_snapshot("acme", "general", vec![message("acme", "general", "2024-01-01", "hi")]);

        store.select_workspace("other").unwrap();
        assert!(store.transcript().is_empty());
        store.select_workspace("acme").unwrap();
        store.select_channel("general").unwrap();

        assert_eq!(store.transcript().len(), 1);
    }

    #[test]
    fn live_message_outside_selection_is_hidden() {
        let mut store = store_at("acme", "general");

        let placement = store.append_message(message("other", "misc", "2024-01-01", "psst"));

        assert_eq!(placement, Placement::Hidden);
        assert!(store.transcript().is_empty());
    }

    #[test]
    fn live_message_updates_view_and_cache() {
        let mut store = store_at("acme", "general");

        let placement = store.append_message(message("acme", "general", "2024-01-01", "hey"));

        assert!(matches!(placement, Placement::Appended { marker: Some(_) }));
        assert_eq!(store.transcript().len(), 1);
        assert_eq!(store.cached("acme", "general").unwrap().len(), 1);
    }

    #[test]
    fn selecting_unknown_entities_fails() {
        let mut store = store_at("acme", "general");

        assert_eq!(store.select_workspace("nope"), Err(AppError::UnknownWorkspace("nope".into())));
        assert!(matches!(store.select_channel("nope"), Err(AppError::UnknownChannel { .. })));
        assert_eq!(Store::new().select_channel("x"), Err(AppError::NoActiveWorkspace));
    }

    #[test]
    fn pending_workspace_survives_list_until_discarded() {
        let mut store = store_at("acme", "general");
        store.insert_pending_workspace("draft").unwrap();

        store.replace_workspaces(&list(&[("acme", &["general"])]));
        assert!(store.workspace("draft").is_some_and(|w| w.pending));
        assert_eq!(store.confirmed_workspace_names(), ["acme"]);

        store.discard_pending();
        assert!(store.workspace("draft").is_none());
    }

    #[test]
    fn pending_channel_survives_list_of_its_workspace() {
        let mut store = store_at("acme", "general");
        store.insert_pending_channel("acme", "ops", Some("on call".into())).unwrap();

        let fallback = store.replace_workspaces(&list(&[("acme", &["general"])]));

        assert_eq!(fallback, None);
        let ops = store.workspace("acme").and_then(|w| w.channel("ops")).unwrap();
        assert!(ops.pending);
        assert_eq!(ops.description.as_deref(), Some("on call"));

        store.confirm_channel("acme", "ops");
        let names: Vec<(&str, bool)> = store
            .workspace("acme")
            .unwrap()
            .channels
            .iter()
            .map(|c| (c.name.as_str(), c.pending))
            .collect();
        assert_eq!(names, [("general", false), ("ops", false)]);
    }

    #[test]
    fn duplicate_pending_entities_are_rejected() {
        let mut store = store_at("acme", "general");

        assert_eq!(
            store.insert_pending_workspace("acme"),
            Err(AppError::AlreadyExists("acme".into()))
        );
        assert_eq!(
            store.insert_pending_channel("acme", "general", None),
            Err(AppError::AlreadyExists("general".into()))
        );
    }

    #[test]
    fn removing_active_channel_falls_back() {
        let mut store = store_at("acme", "general");
        store.replace_channels("acme", &[ChannelEntry::from("general"), ChannelEntry::from("dev")]);
        store.replace_snapshot("acme", "general", vec![message(
            "acme",
            "general",
            "2024-01-01",
            "bye",
        )]);

        let fallback = store.remove_channel("acme", "general");

        assert_eq!(fallback, Some(Fallback::Channel(Some("dev".into()))));
        assert!(store.cached("acme", "general").is_none());
    }
}
