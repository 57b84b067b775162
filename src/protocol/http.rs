// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the ISY REST interface.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::command::NodeCommand;
use crate::config::{ControllerConfig, Credentials};
use crate::error::ConnectionError;

/// Path of the node list endpoint.
const NODES_PATH: &str = "/rest/nodes";

/// HTTP client for communicating with an ISY controller.
///
/// Every request is an independent `GET` authenticated with HTTP basic
/// auth. No retries are attempted.
///
/// # Examples
///
/// ```no_run
/// use isy_snapshot::ControllerConfig;
/// use isy_snapshot::protocol::ControllerClient;
///
/// # async fn example() -> isy_snapshot::Result<()> {
/// let config = ControllerConfig::new("192.168.1.20", "admin", "secret");
/// let client = ControllerClient::new(&config)?;
///
/// let document = client.fetch_device_list().await?;
/// client.send_command("1A 2B 3C 1", "255").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ControllerClient {
    base_url: String,
    client: Client,
    credentials: Credentials,
    timeout: Duration,
}

impl ControllerClient {
    /// Creates a client from the connection parameters.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn new(config: &ControllerConfig) -> Result<Self, ConnectionError> {
        if config.host().trim().is_empty() {
            return Err(ConnectionError::InvalidAddress(
                "host is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ConnectionError::Http)?;

        Ok(Self {
            base_url: config.base_url(),
            client,
            credentials: config.credentials().clone(),
            timeout: config.timeout(),
        })
    }

    /// Returns the base URL of the controller.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL of the node list endpoint.
    fn nodes_url(&self) -> String {
        format!("{}{NODES_PATH}", self.base_url)
    }

    /// Builds the URL for a node command.
    fn command_url(&self, address: &str, command: &NodeCommand) -> String {
        format!("{}{}", self.base_url, command.path(address))
    }

    /// Fetches the raw node list document.
    ///
    /// The body is returned unparsed.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` on network failure, timeout, or a non-2xx
    /// response.
    pub async fn fetch_device_list(&self) -> Result<Vec<u8>, ConnectionError> {
        let response = self.get(&self.nodes_url()).await?;
        let body = response.bytes().await.map_err(|e| self.map_err(e))?;

        tracing::debug!(bytes = body.len(), "Received node list");

        Ok(body.to_vec())
    }

    /// Sends the command that restores `value` on the node at `address`.
    ///
    /// `"0"` sends `DOF`; any other value sends `DON` with the value as
    /// on-level.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` on network failure, timeout, or a non-2xx
    /// response.
    pub async fn send_command(&self, address: &str, value: &str) -> Result<(), ConnectionError> {
        let command = NodeCommand::from_value(value);
        self.get(&self.command_url(address, &command)).await?;
        Ok(())
    }

    async fn get(&self, url: &str) -> Result<Response, ConnectionError> {
        tracing::debug!(url = %url, "Sending HTTP request");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ConnectionError::AuthenticationFailed);
        }

        if !status.is_success() {
            return Err(ConnectionError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response)
    }

    fn map_err(&self, err: reqwest::Error) -> ConnectionError {
        if err.is_timeout() {
            let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            ConnectionError::Timeout(millis)
        } else {
            ConnectionError::Http(err)
        }
    }
}
