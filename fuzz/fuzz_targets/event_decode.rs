//! Fuzz target for Event::decode
//!
//! Arbitrary text must never panic the inbound codec. Anything it accepts
//! must encode again, and the re-encoded frame must decode to the same
//! action.

#![no_main]

use huddle_proto::Event;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(event) = Event::decode(text) else {
        return;
    };

    let encoded = event.encode().expect("decoded event must re-encode");
    let again = Event::decode(&encoded).expect("re-encoded event must decode");
    assert_eq!(event.action(), again.action());
});
