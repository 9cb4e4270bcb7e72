//! Server listing that seeds the table.

use std::{cmp::Ordering, fs, path::Path};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    models::ServerInfo,
    table::{ServerRowSpec, ServerTable, MIN_SERVER_CELLS},
};

/// Reasons a listing record cannot become a table row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    /// The address is not `host:port`.
    #[error("malformed address {0:?}")]
    BadAddress(String),
}

/// Filters applied after the listing is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingFilter {
    /// Keep servers whose map starts with this prefix.
    pub map_prefix: Option<String>,
    /// Keep servers with strictly more players than this; `0` disables it.
    pub min_players: Option<u32>,
    /// Keep servers with at most this many bots; `0` disables it.
    pub max_bots: Option<u32>,
    /// Keep servers with at most this ping; `0` disables it.
    pub max_ping: Option<i64>,
}

impl ListingFilter {
    /// Whether a server passes every configured filter.
    ///
    /// A server with an unknown value fails the filter on that value.
    pub fn matches(&self, server: &ServerInfo) -> bool {
        if let Some(prefix) = self.map_prefix.as_deref().filter(|p| !p.is_empty()) {
            if !server
                .map_name
                .as_deref()
                .is_some_and(|map| map.starts_with(prefix))
            {
                return false;
            }
        }
        if let Some(min) = self.min_players.filter(|&min| min > 0) {
            if !server.players.is_some_and(|players| players > min) {
                return false;
            }
        }
        if let Some(max) = self.max_bots.filter(|&max| max > 0) {
            if !server.bots.is_some_and(|bots| bots <= max) {
                return false;
            }
        }
        if let Some(max) = self.max_ping.filter(|&max| max > 0) {
            if !server.ping.is_some_and(|ping| ping <= max) {
                return false;
            }
        }
        true
    }
}

/// Parse a listing document.
///
/// The document must be a JSON array. Records that do not decode into a
/// [`ServerInfo`] are skipped with a warning.
pub fn parse_listing(json: &str) -> Result<Vec<ServerInfo>> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(json).context("failed to parse server listing")?;
    let servers = records
        .into_iter()
        .enumerate()
        .filter_map(
            |(index, record)| match serde_json::from_value::<ServerInfo>(record) {
                Ok(server) => Some(server),
                Err(err) => {
                    warn!(index, error = %err, "skipping undecodable listing record");
                    None
                }
            },
        )
        .collect();
    Ok(servers)
}

/// Read a listing file.
pub fn load_listing(path: impl AsRef<Path>) -> Result<Vec<ServerInfo>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read listing {}", path.display()))?;
    parse_listing(&contents).with_context(|| format!("in {}", path.display()))
}

/// Filter, sort and convert listing records into a table.
///
/// Rows are ordered by map, ping, host and port. Records with a malformed
/// address or too few columns are skipped with a warning.
pub fn build_table(mut servers: Vec<ServerInfo>, filter: &ListingFilter) -> ServerTable {
    let total = servers.len();
    servers.retain(|server| filter.matches(server));
    servers.sort_by(compare_servers);

    let specs: Vec<ServerRowSpec> = servers
        .iter()
        .filter_map(|server| match row_spec(server) {
            Ok(spec) => Some(spec),
            Err(err) => {
                warn!(addr = %server.addr, error = %err, "skipping listing record");
                None
            }
        })
        .collect();
    info!(total, shown = specs.len(), "server listing loaded");
    ServerTable::new(specs)
}

/// Convert one listing record into the seed of a server row.
pub fn row_spec(server: &ServerInfo) -> Result<ServerRowSpec, ListingError> {
    static ADDR_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[^\s:/?#]+:\d{1,5}$").expect("invalid address regex"));

    if !ADDR_RE.is_match(&server.addr) {
        return Err(ListingError::BadAddress(server.addr.clone()));
    }
    let cells = server.cells();
    debug_assert!(cells.len() >= MIN_SERVER_CELLS);
    let extra_classes = server
        .tr_attrs
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    Ok(ServerRowSpec {
        addr: server.addr.clone(),
        extra_classes,
        cells,
    })
}

fn compare_servers(a: &ServerInfo, b: &ServerInfo) -> Ordering {
    none_last(&a.map_name, &b.map_name)
        .then_with(|| none_last(&a.ping, &b.ping))
        .then_with(|| a.server_host.cmp(&b.server_host))
        .then_with(|| a.server_port.cmp(&b.server_port))
}

/// Unknown values sort after every known one.
fn none_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
