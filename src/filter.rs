// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decides which devices take part in a snapshot.
//!
//! Only dimmable or switchable loads are recorded. A device qualifies when
//! its `ST` property reports a level (uom `100`, 0-255) or a Z-Wave level
//! (uom `51`, 0-100%) and its family/category pair is one of:
//!
//! | Family | Categories |
//! |--------|------------|
//! | Insteon | `1` (dimmable), `2` (switched) |
//! | Z-Wave | `3`, `4` |
//!
//! Sensors, thermostats, keypads and everything else are left out.

use crate::node::{DeviceRecord, Family};

/// Units of measure that describe an on-level.
const LEVEL_UOMS: [&str; 2] = ["100", "51"];
/// Insteon categories that are loads.
const INSTEON_CATEGORIES: [&str; 2] = ["1", "2"];
/// Z-Wave categories that are loads.
const ZWAVE_CATEGORIES: [&str; 2] = ["3", "4"];

/// Rule table deciding whether a device record is in scope.
///
/// # Examples
///
/// ```
/// use isy_snapshot::EligibilityFilter;
/// use isy_snapshot::node::parse_nodes;
///
/// let xml = br#"<nodes>
///   <node><address>1A 2B 3C 1</address><name>Lamp</name><type>2.0</type>
///     <property id="ST" value="255" uom="100"/></node>
///   <node><address>44 55 66 1</address><name>Motion</name><type>16.1</type>
///     <property id="ST" value="1" uom="1"/></node>
/// </nodes>"#;
///
/// let filter = EligibilityFilter::new();
/// let parsed = parse_nodes(xml).unwrap();
/// let in_scope: Vec<_> = parsed
///     .records
///     .iter()
///     .filter(|r| filter.is_in_scope(r))
///     .map(|r| r.address.as_str())
///     .collect();
/// assert_eq!(in_scope, vec!["1A 2B 3C 1"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityFilter;

impl EligibilityFilter {
    /// Creates the filter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns true if the record's status should be recorded.
    ///
    /// Records without a non-empty `ST` property are never in scope.
    #[must_use]
    pub fn is_in_scope(&self, record: &DeviceRecord) -> bool {
        let Some(status) = record.status() else {
            return false;
        };

        if !LEVEL_UOMS.contains(&status.uom.as_str()) {
            return false;
        }

        let category = record.category();
        match record.family {
            Family::Insteon => INSTEON_CATEGORIES.contains(&category),
            Family::ZWave => ZWAVE_CATEGORIES.contains(&category),
            Family::Other(_) => false,
        }
    }
}
