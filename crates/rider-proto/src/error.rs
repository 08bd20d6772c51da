//! Protocol error types.

use thiserror::Error;

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Packet contained no bytes.
    #[error("empty packet")]
    Empty,

    /// Leading packet type character is not part of the protocol.
    #[error("unknown packet type {0:?}")]
    UnknownPacketType(char),

    /// Packet type exists but is not supported by this client.
    #[error("unsupported packet: {0}")]
    Unsupported(&'static str),

    /// Packet framing is invalid.
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(String),

    /// Base URL cannot be turned into a realtime endpoint.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
