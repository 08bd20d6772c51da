//! Login and password-reset payloads.

use serde::{Deserialize, Serialize};

use crate::failure::{ApiFailure, FailureKind};

/// Body of `POST /api/loginRider`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Reply of `POST /api/loginRider`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginReply {
    /// Bearer token. Missing when the backend accepted the credentials but
    /// did not issue a session.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Server message.
    #[serde(default)]
    pub message: String,
}

/// Review state of a rider account that is not yet allowed to log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Documents under review.
    Pending,
    /// Application rejected.
    Rejected,
}

/// Why the backend refused a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRejection {
    /// Unknown email.
    Email(String),
    /// Wrong password.
    Password(String),
    /// Account not verified yet.
    Verification {
        /// Review state, when the backend reports one.
        status: Option<VerificationStatus>,
        /// Server message.
        message: String,
    },
    /// Any other failure.
    General(String),
}

impl LoginRejection {
    /// Classify a failed login response by the body's `from` field.
    pub fn from_failure(failure: &ApiFailure) -> Self {
        let message = failure.message.clone();
        if failure.kind != FailureKind::Rejected {
            return Self::General(message);
        }
        let Some(body) = &failure.body else {
            return Self::General(message);
        };
        match body.from.as_deref() {
            Some("email") => Self::Email(message),
            Some("password") => Self::Password(message),
            Some("verification") => {
                let status = body.verification_status.as_deref().and_then(|raw| {
                    match raw.to_ascii_lowercase().as_str() {
                        "pending" => Some(VerificationStatus::Pending),
                        "rejected" => Some(VerificationStatus::Rejected),
                        _ => None,
                    }
                });
                Self::Verification { status, message }
            },
            _ => Self::General(message),
        }
    }

    /// Message to show the rider.
    pub fn message(&self) -> &str {
        match self {
            Self::Email(m) | Self::Password(m) | Self::General(m) => m,
            Self::Verification { message, .. } => message,
        }
    }
}

/// Body of `POST /api/forgot-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Account email.
    pub email: String,
}

/// Reply of `POST /api/forgot-password`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPasswordReply {
    /// Server message.
    #[serde(default)]
    pub message: String,
    /// Epoch milliseconds before which another code cannot be requested.
    #[serde(default)]
    pub cooldown: i64,
}

/// Body of `POST /api/verify-code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    /// Account email.
    pub email: String,
    /// Code received by email.
    pub verify_code: String,
}

/// Body of `POST /api/change-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Account email.
    pub email: String,
    /// New password.
    pub new_password: String,
    /// Repeated new password.
    pub confirm_password: String,
}
