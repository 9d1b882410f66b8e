//! Front-end interfaces.
//!
//! The [`Driver`] trait decouples the orchestration loop from a specific
//! front-end. Each front-end supplies user intents and receives
//! notifications and structured view updates; the generic
//! [`crate::Runtime`] handles everything in between.

use std::future::Future;

use crate::{Intent, ViewUpdate};

/// Fire-and-forget user notifications.
pub trait NotificationSink {
    /// Show a transient notification.
    fn notify(&mut self, title: &str, body: &str);
}

/// Receiver of structured view updates, in order.
///
/// Implementations update their own view model; rendering happens on the
/// front-end's schedule.
pub trait PresentationSink {
    /// Apply one view update.
    fn present(&mut self, update: ViewUpdate);
}

/// Front-end driving a [`crate::Runtime`].
///
/// # Implementations
///
/// - **TUI**: crossterm key events in, ratatui rendering out
/// - **Simulation**: scripted intents in, recorded updates out
pub trait Driver: NotificationSink + PresentationSink + Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next user intent.
    ///
    /// Returns `None` when woken without an intent (for example a resize or
    /// a redraw tick). Must be cancel-safe: the runtime races it against
    /// inbound connection events.
    fn poll_intent(&mut self) -> impl Future<Output = Result<Option<Intent>, Self::Error>> + Send;

    /// Release front-end resources.
    fn stop(&mut self);
}
