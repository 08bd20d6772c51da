//! Fuzz target for response classification
//!
//! # Invariants
//!
//! - 2xx hands the body back untouched, anything else is a failure
//! - 401 always means the session expired
//! - Failures always carry a message and their status
//! - Login rejection classification never panics and keeps the message

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rider_proto::{auth::LoginRejection, failure::check_response};

#[derive(Debug, Arbitrary)]
struct Exchange {
    status: u16,
    body: Vec<u8>,
}

fuzz_target!(|exchange: Exchange| {
    let Exchange { status, body } = exchange;
    match check_response(status, body.clone()) {
        Ok(returned) => {
            assert!((200..300).contains(&status));
            assert_eq!(returned, body);
        },
        Err(failure) => {
            assert!(!(200..300).contains(&status));
            assert_eq!(failure.status, Some(status));
            assert!(!failure.message.is_empty());
            if status == 401 {
                assert!(failure.is_session_expired());
            }
            let rejection = LoginRejection::from_failure(&failure);
            assert_eq!(rejection.message(), failure.message);
        },
    }
});
