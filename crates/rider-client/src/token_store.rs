//! Session token persistence.
//!
//! The trait is synchronous: a token is a few bytes and every backend we use
//! (memory, redb) completes immediately.

#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Token store failures. Callers log and swallow them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenStoreError {
    /// Backend I/O failed.
    #[error("token store I/O error: {0}")]
    Io(String),

    /// Stored record could not be encoded or decoded.
    #[error("token store serialization error: {0}")]
    Serialization(String),

    /// Backend is in an unusable state.
    #[error("token store unavailable: {0}")]
    Unavailable(String),
}

/// Where the session token survives restarts.
///
/// Implementations share state between clones.
pub trait TokenStore: Clone + Send + Sync + 'static {
    /// Stored token, if any.
    fn load(&self) -> Result<Option<String>, TokenStoreError>;

    /// Replace the stored token.
    fn save(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Remove the stored token. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// In-memory token store for tests and simulation.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: Arc::new(Mutex::new(Some(token.into()))) }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, TokenStoreError> {
        self.token.lock().map_err(|_| TokenStoreError::Unavailable("lock poisoned".into()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.slot()? = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.slot()? = None;
        Ok(())
    }
}

/// Store standing in for one that could not be opened.
///
/// Every operation fails with the error the real store reported, so the
/// session starts logged out and is simply not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailableTokenStore {
    reason: TokenStoreError,
}

impl UnavailableTokenStore {
    /// Store failing with `reason`.
    pub fn new(reason: TokenStoreError) -> Self {
        Self { reason }
    }

    /// Why the real store is missing.
    pub fn reason(&self) -> &TokenStoreError {
        &self.reason
    }
}

impl TokenStore for UnavailableTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Err(self.reason.clone())
    }

    fn save(&self, _token: &str) -> Result<(), TokenStoreError> {
        Err(self.reason.clone())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        Err(self.reason.clone())
    }
}
