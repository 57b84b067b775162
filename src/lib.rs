// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `isy_snapshot` - Save and restore the state of ISY-controlled lights and switches.
//!
//! This library records the on-level of every dimmable or switchable load
//! known to an ISY home-automation controller and replays it later, for
//! example after a power failure or a scene left the house in a mess.
//!
//! # Supported Devices
//!
//! - **Insteon**: categories 1 (dimmable) and 2 (switched)
//! - **Z-Wave**: categories 3 and 4
//!
//! Only devices whose `ST` status is reported as a level (uom 100 or 51) are
//! recorded. Sensors, thermostats and scenes are left alone.
//!
//! # Quick Start
//!
//! ```no_run
//! use isy_snapshot::{ControllerConfig, SnapshotService};
//! use isy_snapshot::snapshot::FileBackend;
//!
//! #[tokio::main]
//! async fn main() -> isy_snapshot::Result<()> {
//!     let config = ControllerConfig::new("192.168.1.20", "admin", "secret");
//!     let service = SnapshotService::new(&config, FileBackend::new("isy-state.json"))?;
//!
//!     // Record the current state ("12 devices processed")
//!     let report = service.discover().await?;
//!     println!("{report}");
//!
//!     // ... later: put everything back
//!     let report = service.restore().await;
//!     if !report.is_success() {
//!         eprintln!("{report}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The library emits [`tracing`] events and never installs a subscriber.
//! Every service operation runs inside the span passed to
//! [`SnapshotService::with_span`] (by default `isy_snapshot{host=..}`).

pub mod command;
pub mod config;
pub mod error;
mod filter;
pub mod node;
pub mod protocol;
mod service;
pub mod snapshot;

pub use config::{ControllerConfig, Credentials};
pub use error::{ConfigError, ConnectionError, Error, ParseError, Result, StoreError};
pub use filter::EligibilityFilter;
pub use node::{DeviceRecord, Family};
pub use protocol::ControllerClient;
pub use service::{DiscoverReport, RestoreFailure, RestoreReport, SnapshotService};
pub use snapshot::{Snapshot, SnapshotEntry, SnapshotStore};
