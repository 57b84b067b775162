// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory snapshot backed by a persistent store.

use std::sync::Arc;

use crate::error::StoreError;

use super::{Snapshot, SnapshotBackend, SnapshotEntry};

/// The working snapshot plus the backend it is persisted to.
///
/// # Examples
///
/// ```
/// use isy_snapshot::snapshot::{MemoryBackend, SnapshotStore};
///
/// let backend = MemoryBackend::new();
/// let mut store = SnapshotStore::new(backend.clone());
///
/// assert!(store.load().unwrap().is_empty());
/// store.upsert("1A 2B 3C 1", "Porch Light", "255");
/// store.persist().unwrap();
///
/// assert_eq!(backend.stored().unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct SnapshotStore {
    backend: Arc<dyn SnapshotBackend>,
    current: Snapshot,
    loaded: bool,
}

impl SnapshotStore {
    /// Creates a store on top of `backend`. Nothing is read until
    /// [`load`](Self::load) is called.
    #[must_use]
    pub fn new(backend: impl SnapshotBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            current: Snapshot::new(),
            loaded: false,
        }
    }

    /// Replaces the working snapshot with the persisted one.
    ///
    /// A missing store loads as empty. A store that cannot be decoded also
    /// loads as empty, with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the store exists but cannot be read.
    /// The working snapshot is left unchanged and the store stays unloaded.
    pub fn load(&mut self) -> Result<&Snapshot, StoreError> {
        let loaded = self.backend.load();
        self.finish_load(loaded)
    }

    /// Loads the persisted snapshot unless that already happened.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn ensure_loaded(&mut self) -> Result<&Snapshot, StoreError> {
        if !self.loaded {
            self.load()?;
        }
        Ok(&self.current)
    }

    /// Returns the backend so a load or save can run off the lock.
    pub(crate) fn backend(&self) -> Arc<dyn SnapshotBackend> {
        Arc::clone(&self.backend)
    }

    /// Applies the outcome of [`SnapshotBackend::load`].
    pub(crate) fn finish_load(
        &mut self,
        loaded: Result<Option<Snapshot>, StoreError>,
    ) -> Result<&Snapshot, StoreError> {
        self.current = match loaded {
            Ok(Some(snapshot)) => {
                tracing::debug!(entries = snapshot.len(), "Loaded snapshot");
                snapshot
            }
            Ok(None) => {
                tracing::info!("No saved snapshot, starting empty");
                Snapshot::new()
            }
            Err(e @ StoreError::Io(_)) => {
                tracing::error!(error = %e, "Saved snapshot could not be read");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Saved snapshot unreadable, starting empty");
                Snapshot::new()
            }
        };
        self.loaded = true;
        Ok(&self.current)
    }

    /// Returns true once [`load`](Self::load) has run.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Records `value` for `address`, replacing any previous entry.
    pub fn upsert(&mut self, address: &str, name: &str, value: &str) {
        self.current.insert(address, name, value);
    }

    /// Returns the working entries in address order.
    #[must_use]
    pub fn enumerate(&self) -> Vec<SnapshotEntry> {
        self.current.entries().cloned().collect()
    }

    /// Returns the working snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.current
    }

    /// Replaces the working snapshot without touching the backend.
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.current = snapshot;
    }

    /// Writes the working snapshot to the backend.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend rejects the write. The previously
    /// persisted snapshot is left in place.
    pub fn persist(&self) -> Result<(), StoreError> {
        self.backend.save(&self.current)?;
        tracing::debug!(entries = self.current.len(), "Persisted snapshot");
        Ok(())
    }
}
