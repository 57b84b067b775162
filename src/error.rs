// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `isy_snapshot` library.
//!
//! Each concern gets its own enum: parsing the controller's node list,
//! talking to the controller, persisting the snapshot, and validating the
//! connection parameters. [`Error`] wraps all of them for operations that
//! can fail in more than one way.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection parameters are incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The controller could not be reached or rejected a request.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The node list could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The snapshot could not be persisted.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors related to connection parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required parameter is empty or still holds the placeholder value.
    #[error("{notice}")]
    MissingParameter {
        /// Name of the parameter as shown to the operator.
        parameter: &'static str,
        /// Notice telling the operator what to set.
        notice: &'static str,
    },
}

/// Errors related to HTTP communication with the controller.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The controller answered with a non-success status.
    #[error("HTTP {status} - {reason}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// The controller rejected the credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid host or URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The request was abandoned before it completed.
    #[error("request aborted: {0}")]
    Aborted(String),
}

/// Errors related to parsing the controller's node list.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed or has an unexpected shape.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// A node is missing a required field.
    #[error("node #{index} is missing field `{field}`")]
    MissingField {
        /// Position of the node in the document (zero based).
        index: usize,
        /// The missing field.
        field: &'static str,
    },

    /// A field holds a value that cannot be interpreted.
    #[error("failed to parse {field} of node {address}: {message}")]
    InvalidValue {
        /// Address of the offending node.
        address: String,
        /// The field that failed to parse.
        field: &'static str,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to snapshot persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored document was written by an unknown format version.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

impl From<tempfile::PersistError> for StoreError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
