// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable storage for snapshots.

use std::fmt::Debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::error::StoreError;

use super::Snapshot;

/// Storage that keeps the last persisted snapshot.
///
/// `save` must replace the stored snapshot atomically: after a failed save
/// the previous snapshot must still load.
pub trait SnapshotBackend: Debug + Send + Sync {
    /// Loads the stored snapshot, or `None` if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the stored data cannot be read or decoded.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Replaces the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the snapshot cannot be written.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Stores the snapshot as a JSON file.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, so readers only ever see a complete document.
///
/// # Examples
///
/// ```no_run
/// use isy_snapshot::snapshot::{FileBackend, SnapshotBackend};
/// use isy_snapshot::Snapshot;
///
/// # fn example() -> Result<(), isy_snapshot::error::StoreError> {
/// let backend = FileBackend::new("/var/lib/isy-snapshot/state.json");
///
/// let mut snapshot = Snapshot::new();
/// snapshot.insert("1A 2B 3C 1", "Porch Light", "255");
/// backend.save(&snapshot)?;
///
/// assert_eq!(backend.load()?, Some(snapshot));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a backend storing its snapshot at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotBackend for FileBackend {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Snapshot::from_json(&contents).map(Some)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let contents = snapshot.to_json()?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(contents.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path)?;

        tracing::debug!(path = %self.path.display(), "Wrote snapshot file");
        Ok(())
    }
}

/// Keeps the snapshot in memory.
///
/// Clones share the same storage, which lets a host hand one clone to the
/// service and keep another to read what was persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    stored: Arc<Mutex<Option<Snapshot>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that already holds `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            stored: Arc::new(Mutex::new(Some(snapshot))),
        }
    }

    /// Returns a copy of the stored snapshot.
    #[must_use]
    pub fn stored(&self) -> Option<Snapshot> {
        self.stored.lock().clone()
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.stored.lock().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.stored.lock() = Some(snapshot.clone());
        Ok(())
    }
}
