//! Connection configuration.

use std::time::Duration;

/// Endpoint used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8081/ws";

/// Fixed period of the reconnection timer.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// How often the worker drives [`crate::ConnectionManager::tick`].
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// WebSocket endpoint
    pub url: String,
    /// Delay between reconnection attempts. No backoff is applied.
    pub reconnect_interval: Duration,
    /// Granularity of the worker's timer checks
    pub tick_interval: Duration,
}

impl ConnectionConfig {
    /// Default timers against `url`.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Self::default() }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_owned(),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}
