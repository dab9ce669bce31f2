//! Layout persistence over a key-value storage port
//!
//! A layout is stored as a JSON array of marker records under a single key:
//!
//! ```json
//! [{"id": "1", "type": "Light", "x": 50.0, "y": 50.0, "zoneId": "A"}]
//! ```
//!
//! Loading replays the records by direct insertion, so a layout saved against
//! an older version of the floor plan still restores with its stored zones.

use crate::error::{PlacementError, PlacementResult, StorageError};
use crate::marker::{LayoutSnapshot, MarkerStore};
use crate::zone::ZoneIndex;
use std::collections::HashMap;

/// Key-value storage port
///
/// Implementations may do asynchronous I/O underneath, but a `set` for a key
/// must never be overtaken by an earlier `set` for the same key.
pub trait KeyValueStore {
    /// Read the value under `key`, or `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`; deleting an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage, for tests and hosts without durable storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Saves and restores marker layouts through a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct LayoutPersistence<S> {
    storage: S,
}

impl<S: KeyValueStore> LayoutPersistence<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Write the store's snapshot under `key`
    pub fn save(&mut self, store: &MarkerStore, key: &str) -> PlacementResult<()> {
        let snapshot = store.snapshot();
        let json = serde_json::to_string(&snapshot)
            .map_err(|e| StorageError::Backend(format!("failed to encode layout: {e}")))?;

        self.storage.set(key, &json)?;
        log::debug!("saved {} markers under {key:?}", snapshot.len());
        Ok(())
    }

    /// Read the layout under `key` into a fresh store
    ///
    /// An absent key yields an empty store. `zones` is only consulted to
    /// report markers whose stored zone is missing from the current document;
    /// their stored association is kept as-is.
    ///
    /// # Errors
    /// - `StorageCorrupt` if the stored value cannot be decoded
    /// - `Storage` if the port fails to read
    pub fn load(&self, key: &str, zones: &ZoneIndex) -> PlacementResult<MarkerStore> {
        let Some(raw) = self.storage.get(key)? else {
            log::debug!("no layout stored under {key:?}");
            return Ok(MarkerStore::new());
        };

        let snapshot: LayoutSnapshot =
            serde_json::from_str(&raw).map_err(|e| PlacementError::StorageCorrupt {
                key: key.to_owned(),
                reason: e.to_string(),
            })?;

        let store = MarkerStore::restore(&snapshot).map_err(|error| match error {
            PlacementError::StorageCorrupt { reason, .. } => {
                PlacementError::StorageCorrupt { key: key.to_owned(), reason }
            }
            other => other,
        })?;

        let stale = store
            .iter()
            .filter(|marker| marker.zone_id().is_some_and(|zone| !zones.contains_zone(zone)))
            .count();
        if stale > 0 && !zones.is_empty() {
            log::warn!("{stale} restored markers reference zones missing from the current document");
        }

        log::debug!("restored {} markers from {key:?}", store.len());
        Ok(store)
    }

    /// Remove the layout stored under `key`
    pub fn clear(&mut self, key: &str) -> PlacementResult<()> {
        self.storage.remove(key)?;
        Ok(())
    }
}
