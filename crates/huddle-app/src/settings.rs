//! Settings provider interface.
//!
//! The client reads its identity, endpoint override and last known
//! workspace list through [`Settings`]. Storage is the front-end's concern.

use std::{collections::HashMap, convert::Infallible};

/// Display identity.
pub const USERNAME: &str = "username";

/// Endpoint override.
pub const SERVER_URL: &str = "server_url";

/// JSON array of workspace names from the last authoritative list.
pub const WORKSPACES: &str = "workspaces";

/// Identity used when none is configured.
pub const DEFAULT_USERNAME: &str = "anonymous";

/// Key/value settings store.
pub trait Settings: Send {
    /// Error raised when a value cannot be stored.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Value for `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// Configured identity, or [`DEFAULT_USERNAME`].
pub fn username<S: Settings + ?Sized>(settings: &S) -> String {
    settings
        .get(USERNAME)
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_USERNAME.to_owned())
}

/// Workspace names persisted by a previous session. Unreadable values are
/// ignored.
pub fn saved_workspaces<S: Settings + ?Sized>(settings: &S) -> Vec<String> {
    let Some(raw) = settings.get(WORKSPACES) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(names) => names,
        Err(error) => {
            tracing::warn!(%error, "ignoring unreadable saved workspace list");
            Vec::new()
        },
    }
}

/// Encode workspace names for [`WORKSPACES`].
pub fn encode_workspaces(names: &[String]) -> String {
    serde_json::Value::from(names.to_vec()).to_string()
}

/// In-memory settings for tests and simulations.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    /// Empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with a preset identity.
    pub fn with_username(name: &str) -> Self {
        let mut settings = Self::new();
        settings.values.insert(USERNAME.to_owned(), name.to_owned());
        settings
    }
}

impl Settings for MemorySettings {
    type Error = Infallible;

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
