//! Deterministic clock and shared settings for simulations.

use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use huddle_app::{Environment, Settings, settings};

/// Manually advanced local clock.
///
/// Clones share the same time, so a test keeps one copy and hands another
/// to the runtime.
#[derive(Debug, Clone)]
pub struct SimEnv {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl SimEnv {
    /// Clock fixed at `now`.
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now: Arc::new(Mutex::new(now)) }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for SimEnv {
    /// 2024-01-01 09:00:00.
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap_or_default();
        Self::at(start)
    }
}

impl Environment for SimEnv {
    fn local_now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Settings whose clones share storage, so tests can observe what the
/// runtime persisted.
#[derive(Debug, Clone, Default)]
pub struct SimSettings {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl SimSettings {
    /// Settings with a preset identity.
    pub fn with_username(name: &str) -> Self {
        let mut values = Self::default();
        let Ok(()) = values.set(settings::USERNAME, name);
        values
    }
}

impl Settings for SimSettings {
    type Error = Infallible;

    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
