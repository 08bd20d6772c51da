//! Sans-IO building blocks of the rider client.
//!
//! Each module owns one collection of client state and the rules for
//! mutating it. Nothing here performs I/O or knows about request ids; the
//! `rider-client` state machine decides when to call these methods and turns
//! their results into actions.
//!
//! # Components
//!
//! - [`session::Session`]: token lifecycle gate (`Loading → Anonymous ⇄
//!   Authenticated`)
//! - [`orders::OrderBook`]: the rider's orders with staged evidence and
//!   snapshot rollback
//! - [`delivery`]: the three-stage delivery state machine and its guards
//! - [`inbox::Inbox`]: chat threads and the unread [`inbox::Badge`]
//! - [`chat::Conversation`]: messages of the open thread
//! - [`payouts::PayoutLedger`]: payout history
//! - [`password_reset::PasswordReset`]: code request, verification and
//!   password change flow
//! - [`sync::FetchGate`]: single-flight guard for collection refreshes

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod chat;
pub mod delivery;
pub mod env;
pub mod error;
pub mod inbox;
pub mod orders;
pub mod password_reset;
pub mod payouts;
pub mod session;
pub mod sync;

pub use env::Environment;
pub use error::{LookupError, SessionError, TransitionBlocked, ValidationError};
pub use orders::AdvanceError;
