//! Rider backend wire protocol.
//!
//! Everything that crosses the network boundary lives here: the JSON data
//! transfer objects returned by the REST backend, the catalogue of endpoints
//! the rider client calls, the classification of failed responses, and the
//! Socket.IO packet codec used by the realtime channel.
//!
//! The crate is pure data and parsing. It performs no I/O, which keeps it
//! usable from the Sans-IO state machines in `rider-core` and from the
//! production transport alike.
//!
//! # Modules
//!
//! - [`api`]: [`Endpoint`] catalogue, HTTP method, path and body encoding
//! - [`failure`]: [`ApiFailure`] and its structured [`FailureKind`]
//! - [`realtime`]: [`Signal`] names and the Engine.IO/Socket.IO [`Packet`] codec
//! - [`order`], [`inbox`], [`payout`], [`profile`], [`auth`]: payload types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod auth;
mod error;
pub mod failure;
mod ids;
pub mod inbox;
pub mod order;
pub mod payout;
pub mod profile;
pub mod realtime;

pub use api::{Attachment, Body, Endpoint, Method, Part};
pub use error::{ProtocolError, Result};
pub use failure::{ApiFailure, ErrorBody, FailureKind, TOKEN_EXPIRED_MESSAGE};
pub use ids::{AccountId, OrderId, PayoutId, ThreadId};
pub use realtime::{Packet, Signal, SocketPacket};
