//! Password reset flow.
//!
//! ```text
//!   Idle ──request(email)──► CodeSent ──verified──► Verified ──changed──► Done
//!                              ▲   │
//!                              └───┘ resend once the cooldown has elapsed
//! ```
//!
//! The server returns the cooldown as an absolute epoch in milliseconds, so
//! the remaining time is always derived from the wall clock instead of a
//! local countdown.

use crate::error::ValidationError;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Stage of the reset flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResetStage {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Code emailed, waiting for the rider to enter it.
    CodeSent,
    /// Code accepted, waiting for the new password.
    Verified,
    /// Password changed.
    Done,
}

/// Password reset state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordReset {
    stage: ResetStage,
    email: Option<String>,
    cooldown_until_ms: i64,
    message: Option<String>,
}

impl PasswordReset {
    /// Idle flow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage.
    pub const fn stage(&self) -> ResetStage {
        self.stage
    }

    /// Email the flow runs for.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Last server message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Validate the email for a code request.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmailRequired`] for a blank email.
    pub fn validate_request(email: &str) -> Result<String, ValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmailRequired);
        }
        Ok(email.to_owned())
    }

    /// A code was emailed.
    pub fn code_sent(&mut self, email: String, message: String, cooldown_until_ms: i64) {
        self.stage = ResetStage::CodeSent;
        self.email = Some(email);
        self.message = Some(message);
        self.cooldown_until_ms = cooldown_until_ms;
    }

    /// Whole seconds until another code may be requested, never negative.
    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        (self.cooldown_until_ms.saturating_sub(now_ms) / 1000).max(0) as u64
    }

    /// Validate a code and return the email it belongs to.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ResetNotStarted`] before a code was sent,
    /// [`ValidationError::CodeRequired`] for a blank code.
    pub fn validate_code(&self, code: &str) -> Result<String, ValidationError> {
        let email = self.email.clone().ok_or(ValidationError::ResetNotStarted)?;
        if code.trim().is_empty() {
            return Err(ValidationError::CodeRequired);
        }
        Ok(email)
    }

    /// The server accepted the code.
    pub fn verified(&mut self, message: String) {
        self.stage = ResetStage::Verified;
        self.message = Some(message);
    }

    /// Validate a new password against its confirmation and return the email
    /// it applies to.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ResetNotStarted`] before verification, then in
    /// order: required, minimum length, confirmation required, mismatch.
    pub fn validate_new_password(
        &self,
        new_password: &str,
        confirm: &str,
    ) -> Result<String, ValidationError> {
        if self.stage != ResetStage::Verified {
            return Err(ValidationError::ResetNotStarted);
        }
        let email = self.email.clone().ok_or(ValidationError::ResetNotStarted)?;
        validate_password_pair(new_password, confirm)?;
        Ok(email)
    }

    /// The password was changed.
    pub fn completed(&mut self, message: String) {
        self.stage = ResetStage::Done;
        self.message = Some(message);
        self.cooldown_until_ms = 0;
    }

    /// Abandon the flow.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Client-side password rules.
///
/// # Errors
///
/// The first rule that fails, checked in order: required, at least
/// [`MIN_PASSWORD_LEN`] characters, confirmation required, match.
pub fn validate_password_pair(new_password: &str, confirm: &str) -> Result<(), ValidationError> {
    if new_password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }
    if confirm.is_empty() {
        return Err(ValidationError::ConfirmationRequired);
    }
    if new_password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
