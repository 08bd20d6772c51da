//! Classification of failed backend calls.
//!
//! The backend reports errors as a non-2xx status with a JSON body of the
//! form `{ "message": ..., "from": ... }`. Session expiry is signalled either
//! by HTTP 401 or by the literal message [`TOKEN_EXPIRED_MESSAGE`]. Both are
//! folded into [`FailureKind::SessionExpired`] here so that no other layer
//! ever compares message strings.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Message the backend sends when the bearer token is no longer valid.
pub const TOKEN_EXPIRED_MESSAGE: &str = "Token Expired!";

/// Structured error body returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Form field the error refers to (login uses this).
    #[serde(default)]
    pub from: Option<String>,
    /// Account review state (login uses this).
    #[serde(default)]
    pub verification_status: Option<String>,
}

/// Coarse category of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Bearer token expired or revoked. The session must end.
    SessionExpired,
    /// Request refused by the backend (4xx other than 401).
    Rejected,
    /// Backend error (5xx or unexpected status).
    Server,
    /// Request never produced a response.
    Network,
    /// Response arrived but its body could not be decoded.
    Decode,
}

/// A failed backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiFailure {
    /// Category.
    pub kind: FailureKind,
    /// HTTP status, if a response was received.
    pub status: Option<u16>,
    /// Message suitable for display.
    pub message: String,
    /// Parsed error body, if the response carried one.
    pub body: Option<ErrorBody>,
}

impl ApiFailure {
    /// Classify a non-2xx response.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| b.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("request failed with status {status}"));

        let kind = if status == 401 || message == TOKEN_EXPIRED_MESSAGE {
            FailureKind::SessionExpired
        } else if (400..500).contains(&status) {
            FailureKind::Rejected
        } else {
            FailureKind::Server
        };

        Self { kind, status: Some(status), message, body: parsed }
    }

    /// The request could not be delivered.
    pub fn network(message: impl Into<String>) -> Self {
        Self { kind: FailureKind::Network, status: None, message: message.into(), body: None }
    }

    /// The response body did not have the expected shape.
    pub fn decode(message: impl Into<String>) -> Self {
        Self { kind: FailureKind::Decode, status: None, message: message.into(), body: None }
    }

    /// Whether the session must be terminated.
    pub fn is_session_expired(&self) -> bool {
        self.kind == FailureKind::SessionExpired
    }

    /// Whether trying again later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, FailureKind::Network | FailureKind::Server)
    }
}

/// Turn a raw HTTP exchange into the response body or a classified failure.
pub fn check_response(status: u16, body: Vec<u8>) -> Result<Vec<u8>, ApiFailure> {
    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(ApiFailure::from_response(status, &body))
    }
}

/// Decode a successful response body.
pub fn decode_reply<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiFailure> {
    serde_json::from_slice(body).map_err(|e| ApiFailure::decode(e.to_string()))
}
