//! Player sub-table rendering.

use chrono::DateTime;

use crate::models::{PlayerSnapshot, ServerSnapshot};

/// Horizontal alignment of a player table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Flush left.
    Left,
    /// Flush right.
    Right,
}

/// Alignment of the number, time, score, attributes and name columns.
pub const PLAYER_COLUMNS: [Align; 5] = [
    Align::Right,
    Align::Right,
    Align::Right,
    Align::Left,
    Align::Left,
];

/// One rendered player line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLine {
    /// 1-based position in the server's player list.
    pub number: usize,
    /// Connection time as `HH:MM:SS`.
    pub time: String,
    /// Score as text.
    pub score: String,
    /// Raw attributes string.
    pub attributes: String,
    /// Player name; this column stretches.
    pub name: String,
}

impl PlayerLine {
    /// Cell texts in column order.
    pub fn cells(&self) -> [String; 5] {
        [
            self.number.to_string(),
            self.time.clone(),
            self.score.clone(),
            self.attributes.clone(),
            self.name.clone(),
        ]
    }
}

/// Rendered player listing for one server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerTable {
    rows: Vec<PlayerLine>,
}

impl PlayerTable {
    /// Player lines in snapshot order.
    pub fn rows(&self) -> &[PlayerLine] {
        &self.rows
    }

    /// Whether the server reported no players.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build a fresh player table from a snapshot, keeping the snapshot's order.
pub fn render_players(snapshot: &ServerSnapshot) -> PlayerTable {
    let rows = snapshot
        .a2s_players
        .iter()
        .enumerate()
        .map(|(idx, player)| render_player(idx + 1, player))
        .collect();
    PlayerTable { rows }
}

fn render_player(number: usize, player: &PlayerSnapshot) -> PlayerLine {
    PlayerLine {
        number,
        time: format_duration(player.duration),
        score: player.score.to_string(),
        attributes: player.attributes.clone(),
        name: player.name.clone(),
    }
}

/// Format elapsed seconds as the UTC time of day of that many seconds past
/// the epoch.
///
/// Durations of 24 hours or more wrap around; `90061` formats as `01:01:01`.
pub fn format_duration(seconds: f64) -> String {
    DateTime::from_timestamp(seconds.floor() as i64, 0)
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "00:00:00".to_string())
}
