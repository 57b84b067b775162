// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the ISY controller.
//!
//! The controller exposes a small REST interface over HTTP:
//!
//! | Request | Purpose |
//! |---------|---------|
//! | `GET /rest/nodes` | XML list of every node and its current status |
//! | `GET /rest/nodes/<address>/cmd/DON/<level>` | Turn a node on at a level |
//! | `GET /rest/nodes/<address>/cmd/DOF` | Turn a node off |
//!
//! All requests use HTTP basic authentication.

mod http;

pub use http::ControllerClient;
