// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device records produced from the node list.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Property id carrying a node's on/off status.
pub const STATUS_PROPERTY: &str = "ST";

/// Protocol family of an ISY node.
///
/// Nodes without a `<family>` element are Insteon.
///
/// # Examples
///
/// ```
/// use isy_snapshot::node::Family;
///
/// assert_eq!("4".parse::<Family>().unwrap(), Family::ZWave);
/// assert_eq!(Family::default(), Family::Insteon);
/// assert_eq!(Family::from_code(10), Family::Other(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Family {
    /// Insteon (family 1, or no family element).
    #[default]
    Insteon,
    /// Z-Wave (family 4).
    ZWave,
    /// Any other family code (node servers, Zigbee, ...).
    Other(u32),
}

impl Family {
    /// Maps a numeric family code.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Insteon,
            4 => Self::ZWave,
            other => Self::Other(other),
        }
    }

    /// Returns the numeric family code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::Insteon => 1,
            Self::ZWave => 4,
            Self::Other(code) => *code,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insteon => f.write_str("Insteon"),
            Self::ZWave => f.write_str("Z-Wave"),
            Self::Other(code) => write!(f, "family {code}"),
        }
    }
}

impl FromStr for Family {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self::from_code)
    }
}

/// One reported property of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Raw value (e.g., `"255"`).
    pub value: String,
    /// Unit-of-measure code (e.g., `"100"` for a 0-255 level).
    pub uom: String,
    /// Human readable value, when the controller provides one.
    pub formatted: Option<String>,
}

/// A device node from the controller's node list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Controller-assigned address, unique per node.
    pub address: String,
    /// Display name.
    pub name: String,
    /// Dot-separated device type; the first segment is the category.
    pub kind: String,
    /// Protocol family.
    pub family: Family,
    /// Properties keyed by property id.
    pub properties: BTreeMap<String, Property>,
}

impl DeviceRecord {
    /// Returns the device category, the first segment of the type.
    ///
    /// # Examples
    ///
    /// ```
    /// use isy_snapshot::node::{DeviceRecord, Family};
    ///
    /// let record = DeviceRecord {
    ///     address: "1A 2B 3C 1".into(),
    ///     name: "Porch".into(),
    ///     kind: "2.42.67.0".into(),
    ///     family: Family::Insteon,
    ///     properties: Default::default(),
    /// };
    /// assert_eq!(record.category(), "2");
    /// ```
    #[must_use]
    pub fn category(&self) -> &str {
        self.kind.split('.').next().unwrap_or_default()
    }

    /// Returns the `ST` property if it carries a non-empty value.
    #[must_use]
    pub fn status(&self) -> Option<&Property> {
        self.properties
            .get(STATUS_PROPERTY)
            .filter(|property| !property.value.is_empty())
    }
}
