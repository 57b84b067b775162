// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISY node list parsing.
//!
//! The controller answers `GET /rest/nodes` with an XML tree of folders,
//! device nodes and scenes (groups). This module turns the device nodes into
//! [`DeviceRecord`]s.
//!
//! # Node Shape
//!
//! ```xml
//! <node flag="128" nodeDefId="DimmerLampSwitch">
//!     <address>1A 2B 3C 1</address>
//!     <name>Porch Light</name>
//!     <family>4</family>            <!-- optional, Insteon when absent -->
//!     <type>1.32.65.0</type>        <!-- category.subcategory.version.x -->
//!     <property id="ST" value="255" formatted="On" uom="100"/>
//! </node>
//! ```

mod parser;
mod record;

pub use parser::{ParsedNodes, parse_nodes};
pub use record::{DeviceRecord, Family, Property, STATUS_PROPERTY};
