//! Client error types.

use rider_core::{AdvanceError, LookupError, SessionError, TransitionBlocked, ValidationError};
use thiserror::Error;

/// An intent the client refused. No request was issued.
///
/// None of these are fatal; the runtime shows them to the rider as error
/// notices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Session gate.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Invalid input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Delivery transition guard.
    #[error(transparent)]
    Blocked(#[from] TransitionBlocked),

    /// Referenced order or thread is not loaded.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Conversation intent without an open conversation.
    #[error("no conversation is open")]
    NoConversation,
}

impl From<AdvanceError> for ClientError {
    fn from(err: AdvanceError) -> Self {
        match err {
            AdvanceError::Unknown(e) => Self::Lookup(e),
            AdvanceError::Blocked(e) => Self::Blocked(e),
        }
    }
}

impl ClientError {
    /// Whether the rider must log in before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Session(SessionError::NotAuthenticated))
    }
}
