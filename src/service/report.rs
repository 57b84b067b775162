// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outcome summaries surfaced to the operator.

use std::fmt;

use crate::error::{ConnectionError, ParseError};

/// Outcome of a discover/save pass.
#[derive(Debug, Default)]
pub struct DiscoverReport {
    /// Devices recorded in the snapshot.
    pub processed: usize,
    /// Devices with a single property that were out of scope.
    pub ignored: usize,
    /// Nodes reporting no property or several.
    pub skipped: usize,
    /// Nodes that could not be parsed.
    pub record_errors: Vec<ParseError>,
}

impl fmt::Display for DiscoverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} devices processed", self.processed)
    }
}

/// A device whose restore command failed.
#[derive(Debug)]
pub struct RestoreFailure {
    /// Controller address of the device.
    pub address: String,
    /// Display name recorded with the snapshot.
    pub name: String,
    /// Why the command failed.
    pub error: ConnectionError,
}

/// Outcome of a restore pass.
///
/// # Examples
///
/// ```
/// use isy_snapshot::RestoreReport;
///
/// let report = RestoreReport::default();
/// assert!(report.is_success());
/// assert_eq!(report.to_string(), "0 devices restored, 0 failed");
/// ```
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Devices whose command was accepted.
    pub restored: usize,
    /// Devices whose command failed, in address order.
    pub failures: Vec<RestoreFailure>,
}

impl RestoreReport {
    /// Returns the number of failed devices.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if every command was accepted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the addresses of the failed devices.
    #[must_use]
    pub fn failed_addresses(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.address.as_str()).collect()
    }
}

impl fmt::Display for RestoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} devices restored, {} failed",
            self.restored,
            self.failed()
        )?;
        if !self.failures.is_empty() {
            write!(f, ": {}", self.failed_addresses().join(", "))?;
        }
        Ok(())
    }
}
