//! Index snapshots in the durable store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::IndexedItem;
use crate::error::{Result, SearchError};
use crate::storage::{StorageBackend, StorageError};
use crate::vector::EMBEDDING_DIM;

/// Bumped whenever the embedding scheme or snapshot layout changes.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    dimensions: usize,
    items: &'a [IndexedItem],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    dimensions: usize,
    items: Vec<IndexedItem>,
}

/// Persists and restores the indexed items under a single storage key.
///
/// Only the items are stored; the search structure is rebuilt from them on
/// restore, which yields an equivalent index.
#[derive(Clone)]
pub struct IndexCache {
    storage: Arc<dyn StorageBackend>,
    key: String,
}

impl IndexCache {
    /// Create a cache writing to `storage` under `key`.
    pub fn new(storage: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self { storage, key: key.into() }
    }

    /// The storage key of the snapshot.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write a snapshot of `items`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::PersistenceFailure`] if serialization or the
    /// storage write fails.
    pub async fn persist(&self, items: &[IndexedItem]) -> Result<()> {
        let snapshot = SnapshotRef { version: SNAPSHOT_VERSION, dimensions: EMBEDDING_DIM, items };
        let data = serde_json::to_vec(&snapshot)
            .map_err(|e| SearchError::PersistenceFailure(format!("serialize snapshot: {e}")))?;
        self.storage.save(&self.key, &data).await.map_err(|e| {
            SearchError::PersistenceFailure(format!("write snapshot '{}': {e}", self.key))
        })?;
        info!(key = %self.key, items = items.len(), bytes = data.len(), "persisted search index");
        Ok(())
    }

    /// Read back the last snapshot.
    ///
    /// Returns `Ok(None)` when nothing has been persisted.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::PersistenceFailure`] if the store cannot be read
    /// or the snapshot is corrupt or was written by an incompatible version.
    pub async fn restore(&self) -> Result<Option<Vec<IndexedItem>>> {
        let data = match self.storage.load(&self.key).await {
            Ok(data) => data,
            Err(StorageError::NotFound(_)) => {
                debug!(key = %self.key, "no persisted search index");
                return Ok(None);
            }
            Err(e) => {
                return Err(SearchError::PersistenceFailure(format!(
                    "read snapshot '{}': {e}",
                    self.key
                )));
            }
        };

        let snapshot: Snapshot = serde_json::from_slice(&data)
            .map_err(|e| SearchError::PersistenceFailure(format!("corrupt snapshot: {e}")))?;
        if snapshot.version != SNAPSHOT_VERSION || snapshot.dimensions != EMBEDDING_DIM {
            return Err(SearchError::PersistenceFailure(format!(
                "incompatible snapshot (version {}, {} dimensions)",
                snapshot.version, snapshot.dimensions
            )));
        }
        if let Some(bad) = snapshot.items.iter().find(|item| item.vector.len() != EMBEDDING_DIM) {
            return Err(SearchError::PersistenceFailure(format!(
                "item '{}' has a malformed vector",
                bad.id
            )));
        }

        info!(key = %self.key, items = snapshot.items.len(), "restored search index");
        Ok(Some(snapshot.items))
    }

    /// Delete the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::PersistenceFailure`] if the delete fails.
    pub async fn clear(&self) -> Result<()> {
        self.storage.delete(&self.key).await.map_err(|e| {
            SearchError::PersistenceFailure(format!("delete snapshot '{}': {e}", self.key))
        })
    }
}
