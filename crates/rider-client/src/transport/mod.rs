//! Native I/O for the client.
//!
//! Thin layers that move bytes; protocol decisions stay in the Sans-IO
//! [`Client`](crate::Client).

mod http;
mod realtime;
mod redb_store;
mod system_env;

pub use http::HttpExecutor;
pub use realtime::{RealtimeConnection, spawn_realtime};
pub use redb_store::RedbTokenStore;
pub use system_env::SystemEnv;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Http(String),

    /// Connection failed or dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Peer sent something we could not handle.
    #[error("protocol error: {0}")]
    Protocol(String),
}
