//! Application layer for Huddle
//!
//! Pure state machines and a generic runtime for keeping a local view of
//! workspaces, channels and transcripts in sync with the server.
//!
//! # Components
//!
//! - [`Store`]: workspaces, channels, active selection, transcripts
//! - [`App`]: event router and intent resolution over the store
//! - [`Dispatcher`]: stamps, encodes and sends outbound requests
//! - [`Driver`]: trait for the front-end (intents in, notifications and view
//!   updates out)
//! - [`Runtime`]: generic orchestration loop tying the above to a
//!   connection worker

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod dispatch;
mod driver;
mod env;
mod error;
mod event;
mod intent;
mod runtime;
pub mod settings;
mod state;
mod store;

pub use action::{AppAction, ViewUpdate};
pub use app::App;
pub use dispatch::Dispatcher;
pub use driver::{Driver, NotificationSink, PresentationSink};
pub use env::{Environment, SystemEnv};
pub use error::{AppError, DispatchError, RuntimeError};
pub use event::AppEvent;
pub use huddle_client::ConnectionState;
pub use intent::Intent;
pub use runtime::Runtime;
pub use settings::{MemorySettings, Settings};
pub use state::{ActiveSelection, Channel, DayGroup, Message, Transcript, TranscriptEntry, Workspace};
pub use store::{Fallback, Placement, Store};
