//! Session token storage for the console client.

use std::path::Path;

use rider_client::{TokenStore, TokenStoreError, UnavailableTokenStore, transport::RedbTokenStore};

/// Token store used by the CLI.
///
/// Falls back to [`UnavailableTokenStore`] when the database cannot be
/// opened: the client then starts on the login screen and the session lasts
/// for this run only.
#[derive(Clone)]
pub enum SessionStore {
    /// Redb database on disk.
    Durable(RedbTokenStore),
    /// The database could not be opened.
    Unavailable(UnavailableTokenStore),
}

impl SessionStore {
    /// Open the database at `path`, or fall back when that fails.
    pub fn open(path: &Path) -> Self {
        match RedbTokenStore::open(path) {
            Ok(store) => Self::Durable(store),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "session store unavailable, the login will not be remembered"
                );
                Self::Unavailable(UnavailableTokenStore::new(e))
            },
        }
    }

    /// Whether the token survives restarts.
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Durable(_))
    }
}

impl TokenStore for SessionStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        match self {
            Self::Durable(store) => store.load(),
            Self::Unavailable(store) => store.load(),
        }
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        match self {
            Self::Durable(store) => store.save(token),
            Self::Unavailable(store) => store.save(token),
        }
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match self {
            Self::Durable(store) => store.clear(),
            Self::Unavailable(store) => store.clear(),
        }
    }
}
