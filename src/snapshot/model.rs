// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot data types and their persisted encoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Version written into every persisted document.
const FORMAT_VERSION: u32 = 1;

/// Recorded state of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Controller address of the device.
    pub address: String,
    /// Display name at snapshot time.
    pub name: String,
    /// Raw status value at snapshot time.
    pub value: String,
}

/// Recorded state of every in-scope device, keyed by address.
///
/// # Examples
///
/// ```
/// use isy_snapshot::Snapshot;
///
/// let mut snapshot = Snapshot::new();
/// snapshot.insert("1A 2B 3C 1", "Porch", "255");
/// snapshot.insert("1A 2B 3C 1", "Porch", "0");
///
/// assert_eq!(snapshot.len(), 1);
/// assert_eq!(snapshot.get("1A 2B 3C 1").unwrap().value, "0");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<String, SnapshotEntry>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `address`.
    pub fn insert(
        &mut self,
        address: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        let address = address.into();
        self.entries.insert(
            address.clone(),
            SnapshotEntry {
                address,
                name: name.into(),
                value: value.into(),
            },
        );
    }

    /// Returns the entry for `address`.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&SnapshotEntry> {
        self.entries.get(address)
    }

    /// Iterates over the entries in address order.
    pub fn entries(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.values()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no device has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes the snapshot as a persisted JSON document.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let document = PersistedSnapshot {
            version: FORMAT_VERSION,
            nodes: self
                .entries
                .iter()
                .map(|(address, entry)| {
                    (
                        address.clone(),
                        PersistedEntry {
                            name: entry.name.clone(),
                            value: entry.value.clone(),
                        },
                    )
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Decodes a persisted JSON document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or was written by an
    /// unknown format version.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let document: PersistedSnapshot = serde_json::from_str(json)?;
        if document.version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion(document.version));
        }

        let mut snapshot = Self::new();
        for (address, entry) in document.nodes {
            snapshot.insert(address, entry.name, entry.value);
        }
        Ok(snapshot)
    }
}

/// On-disk shape: `{"version": 1, "nodes": {"<address>": {"name", "value"}}}`.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSnapshot {
    version: u32,
    #[serde(default)]
    nodes: BTreeMap<String, PersistedEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    name: String,
    value: String,
}
