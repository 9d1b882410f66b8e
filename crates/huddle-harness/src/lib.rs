//! Simulation harness for Huddle
//!
//! Runs the production [`huddle_app::Runtime`] against an in-memory server
//! so connection, routing and store behaviour can be tested end to end
//! without a real Huddle deployment.
//!
//! # Components
//!
//! - [`SimServer`]: pure protocol server (requests in, deliveries out)
//! - [`SimHub`]: shares one server between many client connections
//! - [`spawn_loopback`]: connection worker that attaches to a hub in-process
//! - [`WsTestServer`]: serves a hub over a real local WebSocket
//! - [`SimDriver`]: scripted front-end recording what the runtime presents
//! - [`SimEnv`] / [`SimSettings`]: deterministic clock and shared settings

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod hub;
mod loopback;
mod sim_driver;
mod sim_env;
mod sim_server;
mod ws_server;

pub use hub::{ClientId, HubError, SimHub};
pub use loopback::{run_loopback, spawn_loopback};
pub use sim_driver::{Record, SimDriver, SimDriverError, SimDriverHandle, SimView};
pub use sim_env::{SimEnv, SimSettings};
pub use sim_server::{CHAT_ACTION, Delivery, SERVER_NAME, SimServer};
pub use ws_server::WsTestServer;
