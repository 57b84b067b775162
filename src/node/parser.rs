// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for the `/rest/nodes` document.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ParseError;

use super::record::{DeviceRecord, Family, Property};

/// Result of one parse pass over a node list.
///
/// Nodes without state are counted in `skipped`; nodes that are malformed
/// end up in `errors`. Neither stops the pass.
#[derive(Debug, Default)]
pub struct ParsedNodes {
    /// Device records in document order.
    pub records: Vec<DeviceRecord>,
    /// Nodes skipped because they report no property or several.
    pub skipped: usize,
    /// Per-node failures.
    pub errors: Vec<ParseError>,
}

/// Parses the raw node list returned by the controller.
///
/// Only `<node>` children of the root are considered; folders and groups are
/// ignored. A node is turned into a [`DeviceRecord`] when it reports exactly
/// one `<property>`.
///
/// # Errors
///
/// Returns [`ParseError::Xml`] if the document cannot be parsed at all.
/// Problems with individual nodes are reported in [`ParsedNodes::errors`].
///
/// # Examples
///
/// ```
/// use isy_snapshot::node::{parse_nodes, Family};
///
/// let xml = br#"<nodes>
///   <node flag="128">
///     <address>1A 2B 3C 1</address>
///     <name>Porch Light</name>
///     <type>2.42.67.0</type>
///     <property id="ST" value="255" formatted="On" uom="100"/>
///   </node>
/// </nodes>"#;
///
/// let parsed = parse_nodes(xml).unwrap();
/// assert_eq!(parsed.records.len(), 1);
/// assert_eq!(parsed.records[0].family, Family::Insteon);
/// assert_eq!(parsed.records[0].status().unwrap().value, "255");
/// ```
pub fn parse_nodes(raw: &[u8]) -> Result<ParsedNodes, ParseError> {
    let document: NodesDocument = quick_xml::de::from_reader(raw)?;

    let mut parsed = ParsedNodes::default();
    for (index, node) in document.nodes.into_iter().enumerate() {
        match node.into_record(index) {
            Ok(Some(record)) => parsed.records.push(record),
            Ok(None) => parsed.skipped += 1,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping malformed node");
                parsed.errors.push(err);
            }
        }
    }

    tracing::debug!(
        records = parsed.records.len(),
        skipped = parsed.skipped,
        errors = parsed.errors.len(),
        "Parsed node list"
    );

    Ok(parsed)
}

#[derive(Debug, Default, Deserialize)]
struct NodesDocument {
    #[serde(rename = "node", default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "@id", default)]
    id: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    family: Option<RawFamily>,
    #[serde(rename = "property", default)]
    properties: Vec<RawProperty>,
}

/// `<family instance="..">4</family>`
#[derive(Debug, Deserialize)]
struct RawFamily {
    #[serde(rename = "$text", default)]
    code: String,
}

/// `<property id="ST" value="255" formatted="On" uom="100"/>`
#[derive(Debug, Deserialize)]
struct RawProperty {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(rename = "@value", default)]
    value: String,
    #[serde(rename = "@uom", default)]
    uom: String,
    #[serde(rename = "@formatted", default)]
    formatted: Option<String>,
}

impl RawNode {
    fn label(&self, index: usize) -> String {
        non_empty(self.name.as_ref())
            .or_else(|| non_empty(self.address.as_ref()))
            .map_or_else(|| format!("#{index}"), str::to_string)
    }

    fn into_record(mut self, index: usize) -> Result<Option<DeviceRecord>, ParseError> {
        match self.properties.len() {
            0 => return Ok(None),
            1 => {}
            count => {
                tracing::info!(
                    node = %self.label(index),
                    properties = count,
                    "Device has a property list, skipping"
                );
                return Ok(None);
            }
        }

        let address = required(self.address.take().or(self.id.take()), index, "address")?;
        let name = required(self.name.take(), index, "name")?;
        let kind = required(self.kind.take(), index, "type")?;

        let family = match self.family.as_ref().map(|f| f.code.trim()) {
            None | Some("") => Family::default(),
            Some(code) => code
                .parse::<Family>()
                .map_err(|e| ParseError::InvalidValue {
                    address: address.clone(),
                    field: "family",
                    message: e.to_string(),
                })?,
        };

        let properties: BTreeMap<String, Property> = self
            .properties
            .into_iter()
            .map(|p| {
                (
                    p.id,
                    Property {
                        value: p.value,
                        uom: p.uom,
                        formatted: p.formatted,
                    },
                )
            })
            .collect();

        tracing::debug!(
            address = %address,
            name = %name,
            kind = %kind,
            family = family.code(),
            properties = ?properties,
            "Parsed node"
        );

        Ok(Some(DeviceRecord {
            address,
            name,
            kind,
            family,
            properties,
        }))
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required(
    value: Option<String>,
    index: usize,
    field: &'static str,
) -> Result<String, ParseError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ParseError::MissingField { index, field }),
    }
}
