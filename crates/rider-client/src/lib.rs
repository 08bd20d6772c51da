//! Client
//!
//! Action-based client state machine for the rider delivery app. Owns the
//! session, the order list with its delivery state machine, the chat inbox
//! and conversation, payouts, profile and the password reset flow.
//!
//! # Architecture
//!
//! The client follows the Sans-IO and Action-Based patterns of
//! [`rider_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`])
//! for the caller to execute. Requests carry a [`RequestId`] that the caller
//! echoes back with the response.
//!
//! # Components
//!
//! - [`Client`]: Top-level state machine
//! - [`ClientEvent`]: Events fed into the client
//! - [`ClientAction`]: Actions produced by the client
//! - [`TokenStore`]: Where the session token survives restarts
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::HttpExecutor`]: Executes requests with `reqwest`
//! - [`transport::spawn_realtime`]: Socket.IO bridge over WebSocket
//! - [`transport::RedbTokenStore`]: Durable token store
//! - [`transport::SystemEnv`]: Wall clock and tokio timers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
mod error;
mod event;
mod token_store;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::{Client, NEW_DELIVERY_NOTICE, RealtimeState, SESSION_EXPIRED_NOTICE};
pub use config::ClientConfig;
pub use error::ClientError;
pub use event::{
    ClientAction, ClientEvent, LogLevel, Notice, NoticeLevel, RequestId, Screen,
};
pub use rider_core::env::Environment;
pub use token_store::{MemoryTokenStore, TokenStore, TokenStoreError, UnavailableTokenStore};
