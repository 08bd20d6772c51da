//! Redb-backed durable token store.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::token_store::{TokenStore, TokenStoreError};

/// Table: session
/// Key: record name
/// Value: CBOR-encoded [`StoredToken`]
const SESSION: TableDefinition<&str, &[u8]> = TableDefinition::new("session");

/// Key of the token record.
const TOKEN_KEY: &str = "accessToken";

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    saved_at_ms: i64,
}

/// Durable token store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbTokenStore {
    db: Arc<Database>,
}

impl RedbTokenStore {
    /// Open or create a Redb database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `TokenStoreError::Io` if the database cannot be opened or
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TokenStoreError> {
        let db = Database::create(path.as_ref()).map_err(|e| TokenStoreError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| TokenStoreError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(SESSION).map_err(|e| TokenStoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| TokenStoreError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl TokenStore for RedbTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        let txn = self.db.begin_read().map_err(|e| TokenStoreError::Io(e.to_string()))?;
        let table = txn.open_table(SESSION).map_err(|e| TokenStoreError::Io(e.to_string()))?;

        let entry =
            ReadableTable::get(&table, TOKEN_KEY).map_err(|e| TokenStoreError::Io(e.to_string()))?;
        match entry {
            Some(value) => {
                let stored: StoredToken = ciborium::from_reader(value.value())
                    .map_err(|e| TokenStoreError::Serialization(e.to_string()))?;
                Ok(Some(stored.token))
            },
            None => Ok(None),
        }
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        use rider_core::env::Environment;

        let stored = StoredToken {
            token: token.to_owned(),
            saved_at_ms: super::SystemEnv::new().wall_clock_ms(),
        };
        let mut bytes = Vec::new();
        ciborium::into_writer(&stored, &mut bytes)
            .map_err(|e| TokenStoreError::Serialization(e.to_string()))?;

        let txn = self.db.begin_write().map_err(|e| TokenStoreError::Io(e.to_string()))?;
        {
            let mut table =
                txn.open_table(SESSION).map_err(|e| TokenStoreError::Io(e.to_string()))?;
            table
                .insert(TOKEN_KEY, bytes.as_slice())
                .map_err(|e| TokenStoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| TokenStoreError::Io(e.to_string()))?;

        tracing::debug!("session token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let txn = self.db.begin_write().map_err(|e| TokenStoreError::Io(e.to_string()))?;
        {
            let mut table =
                txn.open_table(SESSION).map_err(|e| TokenStoreError::Io(e.to_string()))?;
            table.remove(TOKEN_KEY).map_err(|e| TokenStoreError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| TokenStoreError::Io(e.to_string()))?;

        tracing::debug!("session token cleared");
        Ok(())
    }
}
