// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection parameters for the ISY controller.
//!
//! The host process owns the parameter UI and hands the values over either
//! through the builder methods or by deserializing its parameter map.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Value the host shows in unset parameter fields.
pub const PLACEHOLDER: &str = "set me";

/// Configuration for talking to one ISY controller.
///
/// # Examples
///
/// ```
/// use isy_snapshot::ControllerConfig;
/// use std::time::Duration;
///
/// let config = ControllerConfig::new("192.168.1.20", "admin", "secret")
///     .with_port(8080)
///     .with_timeout(Duration::from_secs(5))
///     .with_restore_concurrency(2);
///
/// assert_eq!(config.base_url(), "http://192.168.1.20:8080");
/// assert!(config.validate().is_ok());
/// ```
///
/// Deserializing a host parameter map:
///
/// ```
/// use isy_snapshot::ControllerConfig;
///
/// let config: ControllerConfig = serde_json::from_str(
///     r#"{"host": "isy.local", "username": "admin", "password": "pw", "timeout_secs": 3}"#,
/// ).unwrap();
/// assert_eq!(config.timeout().as_secs(), 3);
/// assert_eq!(config.port(), 80);
/// ```
#[derive(Clone, Deserialize)]
#[serde(from = "RawControllerConfig")]
pub struct ControllerConfig {
    host: String,
    port: u16,
    use_https: bool,
    credentials: Credentials,
    timeout: Duration,
    restore_concurrency: usize,
}

impl ControllerConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default number of restore commands in flight at once.
    pub const DEFAULT_RESTORE_CONCURRENCY: usize = 4;

    /// Creates a configuration for the controller at `host`.
    ///
    /// # Arguments
    ///
    /// * `host` - Hostname or IP address of the ISY
    /// * `username` - ISY user for HTTP basic authentication
    /// * `password` - Password of that user
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            credentials: Credentials {
                username: username.into(),
                password: password.into(),
            },
            timeout: Self::DEFAULT_TIMEOUT,
            restore_concurrency: Self::DEFAULT_RESTORE_CONCURRENCY,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many restore commands may be in flight at once.
    ///
    /// Zero is treated as one.
    #[must_use]
    pub fn with_restore_concurrency(mut self, limit: usize) -> Self {
        self.restore_concurrency = limit.max(1);
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the restore parallelism limit.
    #[must_use]
    pub fn restore_concurrency(&self) -> usize {
        self.restore_concurrency
    }

    /// Builds the base URL from this configuration.
    ///
    /// A host that already carries a scheme is used as-is.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            return self.host.trim_end_matches('/').to_string();
        }
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Returns the notice of every required parameter that is not set.
    #[must_use]
    pub fn missing_parameters(&self) -> Vec<ConfigError> {
        [
            (
                "IP Address",
                self.host.as_str(),
                "IP Address of ISY must be set",
            ),
            (
                "Username",
                self.credentials.username.as_str(),
                "ISY Username must be set",
            ),
            (
                "Password",
                self.credentials.password.as_str(),
                "ISY Password must be set",
            ),
        ]
        .into_iter()
        .filter(|(_, value, _)| is_unset(value))
        .map(|(parameter, _, notice)| ConfigError::MissingParameter { parameter, notice })
        .collect()
    }

    /// Checks that host, username and password are all set.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::MissingParameter`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.missing_parameters().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_https", &self.use_https)
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .field("restore_concurrency", &self.restore_concurrency)
            .finish()
    }
}

fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == PLACEHOLDER
}

/// HTTP basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Wire shape of a host parameter map.
#[derive(Deserialize)]
struct RawControllerConfig {
    #[serde(default)]
    host: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    https: bool,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    restore_concurrency: Option<usize>,
}

impl From<RawControllerConfig> for ControllerConfig {
    fn from(raw: RawControllerConfig) -> Self {
        let mut config = Self::new(raw.host, raw.username, raw.password);
        if raw.https {
            config = config.with_https();
        }
        if let Some(port) = raw.port {
            config = config.with_port(port);
        }
        if let Some(secs) = raw.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(limit) = raw.restore_concurrency {
            config = config.with_restore_concurrency(limit);
        }
        config
    }
}
