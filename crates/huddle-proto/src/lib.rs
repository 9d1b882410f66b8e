//! Huddle wire protocol
//!
//! Every message in either direction is a single flat JSON object carrying
//! `date`, `time`, `sender` and `action`. The `action` tag selects the
//! semantic type; the remaining keys are action-specific.
//!
//! # Components
//!
//! - [`Header`]: the fields common to every message
//! - [`Request`] / [`Outbound`]: client-to-server intents and their envelope
//! - [`Event`]: server-to-client pushes, decoded by action tag
//! - [`DecodeError`] / [`EncodeError`]: codec failures
//!
//! Decoding is permissive about the `action` tag: anything not recognised
//! becomes [`Event::Chat`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod action;
mod errors;
mod event;
mod header;
mod map;
mod request;
mod wire;

pub use errors::{DecodeError, EncodeError};
pub use event::{
    ChannelData, ChannelEntry, ChannelList, ChannelUpdate, ChatMessage, Event, HistoryEntry,
    Response, SearchHit, SearchResponse, Status, WorkspaceList, WorkspaceUpdate,
};
pub use header::Header;
pub use map::OrderedMap;
pub use request::{Outbound, Request, SearchQuery};
pub use wire::{DATE_FORMAT, TIME_FORMAT};
