//! Fuzz target for the ConnectionManager state machine
//!
//! # Strategy
//!
//! - Arbitrary interleavings of user commands, transport callbacks and
//!   timer ticks, including callbacks that arrive late or twice
//! - Virtual time advancing by arbitrary steps
//!
//! # Invariants
//!
//! - Sends succeed exactly when connected
//! - The last state change emitted by a call matches the new state
//! - `Open` is only requested when leaving Disconnected, or at once when a
//!   live connection drops
//! - Stop disarms the reconnect timer; only a drop while running arms it
//! - The timer never fires before its deadline

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use huddle_client::{
    ConnectionAction, ConnectionConfig, ConnectionEvent, ConnectionManager, ConnectionState,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Step {
    Start,
    Stop,
    Send,
    Opened,
    Closed,
    Failed,
    Text,
    Advance { millis: u16 },
}

fuzz_target!(|steps: Vec<Step>| {
    let mut manager = ConnectionManager::<Duration>::new(ConnectionConfig::default());
    let interval = manager.config().reconnect_interval;
    let mut now = Duration::ZERO;

    for step in steps {
        let before = manager.state();
        let deadline = manager.reconnect_deadline();

        let actions = match step {
            Step::Start => manager.start(),
            Step::Stop => {
                let actions = manager.stop();
                assert_eq!(manager.reconnect_deadline(), None);
                actions
            },
            Step::Send => match manager.send("{}") {
                Ok(actions) => {
                    assert_eq!(before, ConnectionState::Connected);
                    actions
                },
                Err(_) => {
                    assert_ne!(before, ConnectionState::Connected);
                    Vec::new()
                },
            },
            Step::Opened => manager.handle_open(),
            Step::Closed => manager.handle_closed(now, "peer closed"),
            Step::Failed => manager.handle_error(now, "reset"),
            Step::Text => manager.handle_text("{}".to_owned()),
            Step::Advance { millis } => {
                now += Duration::from_millis(u64::from(millis));
                let actions = manager.tick(now);
                if deadline.is_none_or(|d| now < d) {
                    assert!(actions.is_empty());
                }
                actions
            },
        };

        let after = manager.state();
        if let Some(state) = actions.iter().rev().find_map(|action| match action {
            ConnectionAction::Emit(ConnectionEvent::StateChanged(state)) => Some(*state),
            _ => None,
        }) {
            assert_eq!(state, after);
        }

        let dropped = matches!(step, Step::Closed | Step::Failed);
        if actions.iter().any(|a| matches!(a, ConnectionAction::Open { .. })) {
            let live_drop = dropped && before == ConnectionState::Connected;
            assert!(before == ConnectionState::Disconnected || live_drop);
            assert_eq!(after, ConnectionState::Connecting);
        }

        if dropped && before != ConnectionState::Disconnected {
            let expected = if before == ConnectionState::Connected {
                ConnectionState::Connecting
            } else {
                ConnectionState::Disconnected
            };
            assert_eq!(after, expected);
            assert_eq!(manager.reconnect_deadline(), Some(now + interval));
        }
    }
});
