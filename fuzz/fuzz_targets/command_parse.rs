//! Fuzz target for the console command parser
//!
//! Every line a rider types goes through `parse`. It must never panic, and
//! blank input is always reported as empty.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rider_app::{CommandError, input};

fuzz_target!(|line: &str| {
    let parsed = input::parse(line);
    if line.trim().is_empty() {
        assert_eq!(parsed.err(), Some(CommandError::Empty));
    }
});
