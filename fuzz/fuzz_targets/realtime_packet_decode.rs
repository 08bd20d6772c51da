//! Fuzz target for Packet::decode
//!
//! Realtime frames come straight off the socket. Decoding arbitrary text
//! must never panic, and anything that decodes must encode again and map
//! to a signal (or none) without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rider_proto::{Packet, Signal};

fuzz_target!(|frame: &str| {
    let Ok(packet) = Packet::decode(frame) else {
        return;
    };
    assert!(packet.encode().is_ok(), "decoded packet failed to encode: {packet:?}");
    let _ = Signal::from_packet(&packet);
});
