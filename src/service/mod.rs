// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot and restore passes.
//!
//! [`SnapshotService`] is the entry point the host calls into. It owns the
//! controller client, the snapshot store and the eligibility filter.
//!
//! # Discover / Save
//!
//! 1. `GET /rest/nodes`
//! 2. parse the node list, skipping malformed nodes
//! 3. keep nodes with a non-empty `ST` value that pass the [`EligibilityFilter`]
//! 4. replace the snapshot with them and persist
//!
//! Each pass replaces the whole snapshot, so devices that left the
//! controller or fell out of scope are dropped. A failed fetch, an
//! unparseable document or a failed write aborts the pass and leaves the
//! persisted snapshot as it was.
//!
//! Backend reads and writes run on tokio's blocking pool.
//!
//! # Restore
//!
//! Every recorded entry is replayed as a `DON`/`DOF` command. Commands run
//! with bounded parallelism and one failure never stops the others.

mod report;

pub use report::{DiscoverReport, RestoreFailure, RestoreReport};

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, Span};

use crate::config::ControllerConfig;
use crate::error::{ConnectionError, Error, Result, StoreError};
use crate::filter::EligibilityFilter;
use crate::node::{ParsedNodes, parse_nodes};
use crate::protocol::ControllerClient;
use crate::snapshot::{Snapshot, SnapshotBackend, SnapshotEntry, SnapshotStore};

/// Runs a backend call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> std::result::Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> std::result::Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Io(io::Error::other(e)))?
}

/// Takes and replays snapshots of one controller's device state.
///
/// Operations are expected to run one at a time; the host serializes
/// discover and restore requests.
///
/// # Examples
///
/// ```no_run
/// use isy_snapshot::{ControllerConfig, SnapshotService};
/// use isy_snapshot::snapshot::FileBackend;
///
/// #[tokio::main]
/// async fn main() -> isy_snapshot::Result<()> {
///     let config = ControllerConfig::new("192.168.1.20", "admin", "secret");
///     let service = SnapshotService::new(&config, FileBackend::new("isy-state.json"))?;
///
///     let saved = service.discover().await?;
///     println!("{saved}");
///
///     let restored = service.restore().await;
///     println!("{restored}");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SnapshotService {
    client: ControllerClient,
    store: Mutex<SnapshotStore>,
    filter: EligibilityFilter,
    restore_concurrency: usize,
    span: Span,
}

impl SnapshotService {
    /// Creates a service for the controller described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if host, username or password is not set,
    /// or [`Error::Connection`] if the HTTP client cannot be created.
    pub fn new(config: &ControllerConfig, backend: impl SnapshotBackend + 'static) -> Result<Self> {
        config.validate()?;
        let client = ControllerClient::new(config)?;

        Ok(Self {
            client,
            store: Mutex::new(SnapshotStore::new(backend)),
            filter: EligibilityFilter::new(),
            restore_concurrency: config.restore_concurrency(),
            span: tracing::info_span!("isy_snapshot", host = %config.host()),
        })
    }

    /// Replaces the span every operation is recorded under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns a copy of the working snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.store.lock().snapshot().clone()
    }

    /// Records the current state of every in-scope device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the node list cannot be fetched,
    /// [`Error::Parse`] if it cannot be parsed at all, and [`Error::Store`]
    /// if the saved snapshot cannot be read or the new one cannot be
    /// persisted. Malformed individual nodes do not fail the pass; they are
    /// listed in [`DiscoverReport::record_errors`].
    pub async fn discover(&self) -> Result<DiscoverReport> {
        self.run_discover().instrument(self.span.clone()).await
    }

    /// Same as [`discover`](Self::discover).
    ///
    /// # Errors
    ///
    /// See [`discover`](Self::discover).
    pub async fn save(&self) -> Result<DiscoverReport> {
        self.discover().await
    }

    /// Sends every recorded value back to its device.
    ///
    /// Never fails as a whole: per-device failures are collected in the
    /// returned report. An empty snapshot restores nothing, and so does a
    /// saved snapshot that cannot be read (logged at `error`).
    pub async fn restore(&self) -> RestoreReport {
        self.run_restore().instrument(self.span.clone()).await
    }

    async fn run_discover(&self) -> Result<DiscoverReport> {
        tracing::info!("Querying device status");

        let document = self.client.fetch_device_list().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch node list");
            Error::from(e)
        })?;

        let parsed = parse_nodes(&document).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse node list");
            Error::from(e)
        })?;

        let report = self.record(parsed).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to store snapshot");
            Error::from(e)
        })?;

        tracing::info!(
            processed = report.processed,
            ignored = report.ignored,
            skipped = report.skipped,
            errors = report.record_errors.len(),
            "{report}"
        );
        Ok(report)
    }

    /// Loads the persisted snapshot unless that already happened.
    async fn ensure_loaded(&self) -> std::result::Result<(), StoreError> {
        let backend = {
            let store = self.store.lock();
            if store.is_loaded() {
                return Ok(());
            }
            store.backend()
        };

        let loaded = run_blocking(move || backend.load()).await;
        self.store.lock().finish_load(loaded)?;
        Ok(())
    }

    /// Builds the snapshot of this pass, swaps it in and persists it.
    ///
    /// On a failed write the working snapshot is rolled back so it matches
    /// what is persisted.
    async fn record(&self, parsed: ParsedNodes) -> std::result::Result<DiscoverReport, StoreError> {
        self.ensure_loaded().await?;

        let mut report = DiscoverReport {
            skipped: parsed.skipped,
            record_errors: parsed.errors,
            ..DiscoverReport::default()
        };

        let mut fresh = Snapshot::new();
        for record in &parsed.records {
            let Some(status) = record.status() else {
                report.ignored += 1;
                continue;
            };
            if !self.filter.is_in_scope(record) {
                report.ignored += 1;
                continue;
            }

            tracing::info!(
                address = %record.address,
                name = %record.name,
                value = %status.value,
                "Saving device state"
            );
            fresh.insert(&record.address, &record.name, &status.value);
            report.processed += 1;
        }

        let (previous, backend) = {
            let mut store = self.store.lock();
            let previous = store.snapshot().clone();
            store.replace(fresh.clone());
            (previous, store.backend())
        };

        if let Err(e) = run_blocking(move || backend.save(&fresh)).await {
            self.store.lock().replace(previous);
            return Err(e);
        }
        tracing::debug!(entries = report.processed, "Persisted snapshot");
        Ok(report)
    }

    async fn run_restore(&self) -> RestoreReport {
        if let Err(e) = self.ensure_loaded().await {
            tracing::error!(error = %e, "Saved snapshot unavailable, nothing restored");
            return RestoreReport::default();
        }
        let entries = self.store.lock().enumerate();

        if entries.is_empty() {
            tracing::info!("Snapshot is empty, nothing to restore");
            return RestoreReport::default();
        }

        tracing::info!(devices = entries.len(), "Restoring device state");

        let semaphore = Arc::new(Semaphore::new(self.restore_concurrency));
        let mut pending: BTreeMap<String, SnapshotEntry> = BTreeMap::new();
        let mut tasks = JoinSet::new();

        for entry in entries {
            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);
            let address = entry.address.clone();
            let value = entry.value.clone();
            pending.insert(address.clone(), entry);

            tasks.spawn(
                async move {
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => {
                            tracing::info!(address = %address, value = %value, "Restoring device");
                            client.send_command(&address, &value).await
                        }
                        Err(_) => Err(ConnectionError::Aborted("restore cancelled".to_string())),
                    };
                    (address, result)
                }
                .in_current_span(),
            );
        }

        let mut report = RestoreReport::default();
        while let Some(joined) = tasks.join_next().await {
            let (address, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, "Restore task failed");
                    continue;
                }
            };
            let Some(entry) = pending.remove(&address) else {
                continue;
            };
            match result {
                Ok(()) => report.restored += 1,
                Err(error) => {
                    tracing::warn!(address = %entry.address, error = %error, "Failed to restore device");
                    report.failures.push(RestoreFailure {
                        address: entry.address,
                        name: entry.name,
                        error,
                    });
                }
            }
        }

        // Tasks that never reported back still count as failures.
        for entry in pending.into_values() {
            report.failures.push(RestoreFailure {
                address: entry.address,
                name: entry.name,
                error: ConnectionError::Aborted("restore task did not complete".to_string()),
            });
        }
        report.failures.sort_by(|a, b| a.address.cmp(&b.address));

        tracing::info!(
            restored = report.restored,
            failed = report.failed(),
            "{report}"
        );
        report
    }
}
