// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISY node commands used to replay a snapshot.
//!
//! # Command Structure
//!
//! Each REST command sent to an ISY node consists of:
//! - the node address (e.g., `1A 2B 3C 1`, `ZW002_1`)
//! - a command name (`DON` or `DOF`)
//! - an optional payload, the on-level for `DON` (e.g., `255`)
//!
//! and is addressed as `/rest/nodes/<address>/cmd/<name>[/<payload>]`.
//!
//! # Examples
//!
//! ```
//! use isy_snapshot::command::NodeCommand;
//!
//! let cmd = NodeCommand::from_value("255");
//! assert_eq!(cmd.name(), "DON");
//! assert_eq!(cmd.payload(), Some("255"));
//! assert_eq!(cmd.path("1A 2B 3C 1"), "/rest/nodes/1A%202B%203C%201/cmd/DON/255");
//!
//! let off = NodeCommand::from_value("0");
//! assert_eq!(off.path("ZW002_1"), "/rest/nodes/ZW002_1/cmd/DOF");
//! ```

/// Stored value that means "off".
const OFF_VALUE: &str = "0";

/// A command that reproduces a recorded on/off state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCommand {
    /// Turn the device off (`DOF`).
    Off,
    /// Turn the device on at the given level (`DON/<level>`).
    On {
        /// Raw on-level as recorded in the snapshot.
        level: String,
    },
}

impl NodeCommand {
    /// Maps a recorded value to the command that restores it.
    ///
    /// `"0"` becomes [`NodeCommand::Off`]; every other value is sent as the
    /// on-level.
    #[must_use]
    pub fn from_value(value: &str) -> Self {
        if value == OFF_VALUE {
            Self::Off
        } else {
            Self::On {
                level: value.to_string(),
            }
        }
    }

    /// Returns the ISY command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Off => "DOF",
            Self::On { .. } => "DON",
        }
    }

    /// Returns the command payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Off => None,
            Self::On { level } => Some(level),
        }
    }

    /// Builds the REST path addressing this command to `address`.
    ///
    /// Address and payload are percent-encoded as single path segments.
    #[must_use]
    pub fn path(&self, address: &str) -> String {
        let mut path = format!(
            "/rest/nodes/{}/cmd/{}",
            urlencoding::encode(address),
            self.name()
        );
        if let Some(payload) = self.payload() {
            path.push('/');
            path.push_str(&urlencoding::encode(payload));
        }
        path
    }
}
