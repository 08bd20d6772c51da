//! Server-assigned identifiers.
//!
//! The backend addresses every document by an opaque string `_id`. Wrapping
//! each kind in its own type keeps order, thread and payout ids from being
//! mixed up at call sites.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw server identifier.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Raw identifier as sent on the wire.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Database id of a delivery order (`_id`, not the human order number).
    OrderId
);

string_id!(
    /// Database id of a chat thread.
    ThreadId
);

string_id!(
    /// Database id of a payout record.
    PayoutId
);

string_id!(
    /// Database id of an account (rider, buyer, seller or admin).
    AccountId
);
