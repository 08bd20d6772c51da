//! Error types for the client core.
//!
//! Every variant here is raised before any request is issued. Failures of
//! requests that did go out are [`rider_proto::ApiFailure`]s.

use rider_proto::{OrderId, ThreadId};
use thiserror::Error;

/// Why a delivery status transition cannot be attempted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionBlocked {
    /// Pickup needs a proof photo staged first.
    #[error("take a proof photo before starting the delivery")]
    ProofRequired,

    /// Unpaid order needs a payment receipt before it can be delivered.
    #[error("attach the payment receipt before completing an unpaid order")]
    ReceiptRequired,

    /// Terminal state, nothing to advance to.
    #[error("order is already delivered")]
    AlreadyDelivered,

    /// A status update for this order is still pending.
    #[error("a status update for this order is already in progress")]
    InFlight,
}

/// Client-side validation failure. The request is never sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email field left blank.
    #[error("email is required")]
    EmailRequired,

    /// Password field left blank.
    #[error("password is required")]
    PasswordRequired,

    /// Bulk action with nothing selected.
    #[error("select at least one item")]
    EmptySelection,

    /// Chat message with no text and no images.
    #[error("message is empty")]
    BlankMessage,

    /// Required form field left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Verification code left blank.
    #[error("verification code is required")]
    CodeRequired,

    /// New password shorter than the minimum.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum length.
        min: usize,
    },

    /// Confirmation field left blank.
    #[error("please confirm your password")]
    ConfirmationRequired,

    /// Confirmation differs from the new password.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Reset step attempted out of order.
    #[error("request a verification code first")]
    ResetNotStarted,

    /// A new reset code was requested before the server cooldown elapsed.
    #[error("please wait {remaining_secs}s before requesting another code")]
    ResendCooldown {
        /// Seconds until a new code may be requested.
        remaining_secs: u64,
    },
}

/// Session gate rejected an operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The persisted token has not been read yet.
    #[error("session is still loading")]
    Loading,

    /// No token.
    #[error("not logged in")]
    NotAuthenticated,

    /// Login attempted while a session exists.
    #[error("already logged in")]
    AlreadyAuthenticated,
}

/// Referenced entity is not in the local collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Unknown order.
    #[error("unknown order {0}")]
    Order(OrderId),

    /// Unknown thread.
    #[error("unknown thread {0}")]
    Thread(ThreadId),

    /// Thread with no counterpart to talk to.
    #[error("thread {0} has no other participant")]
    Peer(ThreadId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            ValidationError::PasswordTooShort { min: 6 }.to_string(),
            "password must be at least 6 characters"
        );
        assert_eq!(ValidationError::MissingField("lastname").to_string(), "lastname is required");
        assert_eq!(LookupError::Order(OrderId::new("o9")).to_string(), "unknown order o9");
    }
}
