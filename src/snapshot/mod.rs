// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recorded device state and its persistence.
//!
//! A [`Snapshot`] maps controller addresses to the value each in-scope
//! device reported. The [`SnapshotStore`] holds the working copy and writes
//! it through a [`SnapshotBackend`]:
//!
//! - [`FileBackend`]: JSON file replaced atomically on every save
//! - [`MemoryBackend`]: in-process storage for hosts that persist on their own
//!
//! # Persisted Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "nodes": {
//!     "1A 2B 3C 1": { "name": "Porch Light", "value": "255" },
//!     "ZW002_1": { "name": "Garage Outlet", "value": "0" }
//!   }
//! }
//! ```

mod backend;
mod model;
mod store;

pub use backend::{FileBackend, MemoryBackend, SnapshotBackend};
pub use model::{Snapshot, SnapshotEntry};
pub use store::SnapshotStore;
