//! Shared domain models.

use serde::{Deserialize, Serialize};

/// One entry of the server listing that seeds the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Master server region code.
    #[serde(default)]
    pub region: Option<u32>,
    /// Steam application id.
    #[serde(default)]
    pub app_id: Option<u32>,
    /// Server type flag (`d`, `l`, `p`).
    #[serde(default)]
    pub server_type: Option<String>,
    /// Whether VAC is enabled.
    #[serde(default)]
    pub vac: Option<u8>,
    /// Password visibility flag.
    #[serde(default)]
    pub visibility: Option<u8>,
    /// Number of suspected imposters.
    #[serde(default)]
    pub n_imposters: u32,
    /// Host part of the address.
    pub server_host: String,
    /// Port part of the address.
    pub server_port: u16,
    /// Last measured ping in milliseconds.
    #[serde(default)]
    pub ping: Option<i64>,
    /// Current player count.
    #[serde(default)]
    pub players: Option<u32>,
    /// Maximum player count.
    #[serde(default)]
    pub max_players: Option<u32>,
    /// Bot count.
    #[serde(default)]
    pub bots: Option<u32>,
    /// Current map.
    #[serde(default)]
    pub map_name: Option<String>,
    /// Server display name.
    #[serde(default)]
    pub server_name: Option<String>,
    /// `host:port` identity of the server.
    pub addr: String,
    /// Extra row classes, space separated.
    #[serde(default)]
    pub tr_attrs: Option<String>,
}

impl ServerInfo {
    /// Display cells in table column order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            opt(&self.region),
            opt(&self.app_id),
            opt(&self.server_type),
            opt(&self.vac),
            opt(&self.visibility),
            self.n_imposters.to_string(),
            self.server_host.clone(),
            self.server_port.to_string(),
            opt(&self.ping),
            opt(&self.players),
            opt(&self.max_players),
            opt(&self.bots),
            opt(&self.map_name),
            opt(&self.server_name),
        ]
    }
}

/// Live state of one server as returned by the `show-players` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    /// Ping in milliseconds; `null` when the query timed out.
    #[serde(default)]
    pub ping: Option<i64>,
    /// Current player count.
    #[serde(default)]
    pub players: Option<u32>,
    /// Maximum player count.
    #[serde(default)]
    pub max_players: Option<u32>,
    /// Bot count.
    #[serde(default)]
    pub bots: Option<u32>,
    /// Current map.
    #[serde(default)]
    pub map_name: Option<String>,
    /// Players in the order the server reported them.
    #[serde(default)]
    pub a2s_players: Vec<PlayerSnapshot>,
}

impl ServerSnapshot {
    /// Decode a snapshot from the endpoint's JSON body.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Values for the ping, players, max, bots and map cells, in that order.
    pub fn scalar_cells(&self) -> [String; 5] {
        [
            opt(&self.ping),
            opt(&self.players),
            opt(&self.max_players),
            opt(&self.bots),
            opt(&self.map_name),
        ]
    }
}

/// One player reported by a server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// In-game name.
    #[serde(default)]
    pub name: String,
    /// Current score.
    #[serde(default)]
    pub score: i64,
    /// Seconds connected.
    #[serde(default)]
    pub duration: f64,
    /// Annotations attached by the backend (e.g. known cheater tags).
    #[serde(default)]
    pub attributes: String,
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}
