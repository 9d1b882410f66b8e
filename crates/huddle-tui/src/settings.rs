//! File-backed settings.
//!
//! Settings live in a flat JSON object of string values. A missing file
//! reads as empty; every write rewrites the whole file.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use huddle_app::Settings;
use thiserror::Error;

const CONFIG_DIR: &str = "huddle";
const CONFIG_FILE: &str = "settings.json";

/// Settings file errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the file failed.
    #[error("settings file {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// The file is not a JSON object of strings.
    #[error("settings file {path} is not valid: {source}")]
    Json {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// The platform has no per-user configuration directory.
    #[error("no configuration directory on this platform")]
    NoConfigDir,
}

/// Settings persisted as JSON on disk.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSettings {
    /// `<config dir>/huddle/settings.json`.
    ///
    /// # Errors
    ///
    /// - `SettingsError::NoConfigDir` if the platform has no config directory
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Load settings from `path`. A missing file yields empty settings.
    ///
    /// # Errors
    ///
    /// - `SettingsError::Io` if the file exists but cannot be read
    /// - `SettingsError::Json` if its contents are not a string map
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|source| SettingsError::Json { path: path.clone(), source })?,
            Err(error) if error.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "settings loaded");
        Ok(Self { path, values })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), SettingsError> {
        let io_error = |source| SettingsError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|source| SettingsError::Json { path: self.path.clone(), source })?;
        fs::write(&self.path, text).map_err(io_error)
    }
}

impl Settings for FileSettings {
    type Error = SettingsError;

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        if self.values.get(key).is_some_and(|current| current == value) {
            return Ok(());
        }
        self.values.insert(key.to_owned(), value.to_owned());
        self.save()
    }
}
