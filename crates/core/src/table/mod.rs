//! Ordered row model of the server table.
//!
//! The table is the single source of truth for what the front-end draws.
//! Rows are addressed by [`RowId`] through a lookup that is rebuilt after
//! every structural change.

mod rows;

use std::collections::HashMap;

use tracing::debug;

use crate::{models::ServerSnapshot, render::PlayerTable};

pub use rows::{
    PlayersRow, Row, RowId, RowPair, ServerRow, TableRow, COL_BOTS, COL_MAP, COL_MAX_PLAYERS,
    COL_PING, COL_PLAYERS, MIN_SERVER_CELLS, PLAYERS_CLASS, PLAYERS_SPACER_SPAN, SERVER_CLASS,
};

/// Seed data for one server row.
#[derive(Debug, Clone)]
pub struct ServerRowSpec {
    /// `host:port` address.
    pub addr: String,
    /// Extra classes besides `server`.
    pub extra_classes: Vec<String>,
    /// Display cells in column order.
    pub cells: Vec<String>,
}

/// Ordered list of server rows and their expanded players rows.
#[derive(Debug, Clone, Default)]
pub struct ServerTable {
    rows: Vec<TableRow>,
    positions: HashMap<RowId, usize>,
    next_id: u64,
}

impl ServerTable {
    /// Build a table with one collapsed server row per spec.
    pub fn new(specs: impl IntoIterator<Item = ServerRowSpec>) -> Self {
        let mut table = Self::default();
        for spec in specs {
            let id = table.allocate_id();
            let mut classes = vec![SERVER_CLASS.to_string()];
            classes.extend(spec.extra_classes);
            table.rows.push(TableRow::Server(ServerRow {
                id,
                addr: spec.addr,
                classes,
                cells: spec.cells,
                has_players_row: false,
                connected: false,
            }));
        }
        table.reindex();
        table
    }

    /// All rows in display order.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Number of rows of either kind.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a row in display order.
    pub fn position(&self, id: RowId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Look up a row by identity.
    pub fn get(&self, id: RowId) -> Option<&TableRow> {
        self.position(id).and_then(|idx| self.rows.get(idx))
    }

    /// Look up a server row by identity.
    pub fn server(&self, id: RowId) -> Option<&ServerRow> {
        match self.get(id)? {
            TableRow::Server(row) => Some(row),
            TableRow::Players(_) => None,
        }
    }

    /// Look up a players row by identity.
    pub fn players(&self, id: RowId) -> Option<&PlayersRow> {
        match self.get(id)? {
            TableRow::Players(row) => Some(row),
            TableRow::Server(_) => None,
        }
    }

    /// Iterate over the server rows only.
    pub fn servers(&self) -> impl Iterator<Item = &ServerRow> {
        self.rows.iter().filter_map(|row| match row {
            TableRow::Server(server) => Some(server),
            TableRow::Players(_) => None,
        })
    }

    /// Classify a row by identity.
    pub fn classify(&self, id: RowId) -> Option<Row> {
        Some(match self.get(id)? {
            TableRow::Server(_) => Row::Server(id),
            TableRow::Players(_) => Row::Players(id),
        })
    }

    /// Resolve the logical pair a row belongs to.
    ///
    /// The server of a players row is the row immediately before it.
    pub fn resolve_pair(&self, row: Row) -> Option<RowPair> {
        match row {
            Row::Server(id) => {
                let idx = self.position(id)?;
                let players = match self.rows.get(idx + 1) {
                    Some(TableRow::Players(players)) => Some(players.id),
                    _ => None,
                };
                Some(RowPair {
                    server: id,
                    players,
                })
            }
            Row::Players(id) => {
                let idx = self.position(id)?;
                match self.rows.get(idx.checked_sub(1)?)? {
                    TableRow::Server(server) => Some(RowPair {
                        server: server.id,
                        players: Some(id),
                    }),
                    TableRow::Players(_) => None,
                }
            }
        }
    }

    /// Expand or collapse the players row of a server.
    ///
    /// Returns the new players row on expand and `None` on collapse or when
    /// `server` is not a server row.
    pub fn toggle_players(&mut self, server: RowId) -> Option<RowId> {
        let idx = self.position(server)?;
        let expanded = match self.rows.get(idx)? {
            TableRow::Server(row) => row.has_players_row,
            TableRow::Players(_) => return None,
        };

        if expanded {
            if matches!(self.rows.get(idx + 1), Some(TableRow::Players(_))) {
                self.rows.remove(idx + 1);
            }
            if let Some(TableRow::Server(row)) = self.rows.get_mut(idx) {
                row.has_players_row = false;
            }
            self.reindex();
            debug!(%server, "players row collapsed");
            return None;
        }

        let id = self.allocate_id();
        let players = match self.rows.get_mut(idx)? {
            TableRow::Server(row) => {
                row.has_players_row = true;
                PlayersRow::beneath(id, row)
            }
            TableRow::Players(_) => return None,
        };
        self.rows.insert(idx + 1, TableRow::Players(players));
        self.reindex();
        debug!(%server, players = %id, "players row expanded");
        Some(id)
    }

    /// Move the last-connected marker to `server`.
    ///
    /// The marker is cleared from every row before it is set, so exactly one
    /// row carries it afterwards.
    pub fn mark_connected(&mut self, server: RowId) -> bool {
        if self.server(server).is_none() {
            return false;
        }
        for row in &mut self.rows {
            if let TableRow::Server(row) = row {
                row.connected = row.id == server;
            }
        }
        true
    }

    /// The row carrying the last-connected marker.
    pub fn connected(&self) -> Option<&ServerRow> {
        self.servers().find(|row| row.connected)
    }

    /// Overwrite the ping, players, max, bots and map cells from a snapshot.
    pub fn apply_snapshot(&mut self, server: RowId, snapshot: &ServerSnapshot) -> bool {
        let Some(TableRow::Server(row)) = self.position(server).and_then(|i| self.rows.get_mut(i))
        else {
            return false;
        };
        let columns = [COL_PING, COL_PLAYERS, COL_MAX_PLAYERS, COL_BOTS, COL_MAP];
        for (col, value) in columns.into_iter().zip(snapshot.scalar_cells()) {
            if let Some(cell) = row.cells.get_mut(col) {
                *cell = value;
            }
        }
        true
    }

    /// Replace the rendered player table of a players row.
    ///
    /// The row must still sit directly beneath `server`; otherwise nothing is
    /// written and `false` is returned.
    pub fn set_players(&mut self, server: RowId, players: RowId, table: PlayerTable) -> bool {
        let (Some(server_idx), Some(players_idx)) = (self.position(server), self.position(players))
        else {
            return false;
        };
        if players_idx != server_idx + 1 {
            return false;
        }
        match self.rows.get_mut(players_idx) {
            Some(TableRow::Players(row)) => {
                row.players = Some(table);
                true
            }
            _ => false,
        }
    }

    /// Every currently expanded pair, in display order.
    pub fn expanded_pairs(&self) -> Vec<RowPair> {
        self.servers()
            .filter(|row| row.has_players_row)
            .filter_map(|row| self.resolve_pair(Row::Server(row.id)))
            .collect()
    }

    fn allocate_id(&mut self) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        id
    }

    fn reindex(&mut self) {
        self.positions = self
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.id(), idx))
            .collect();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::PlayerSnapshot;
    use crate::render::render_players;

    pub(crate) fn spec(addr: &str, map: &str, name: &str) -> ServerRowSpec {
        let (host, port) = addr.split_once(':').unwrap_or((addr, ""));
        ServerRowSpec {
            addr: addr.to_string(),
            extra_classes: vec!["bg-dark".to_string()],
            cells: [
                "9", "440", "d", "1", "0", "0", host, port, "50", "10", "24", "0", map, name,
            ]
            .iter()
            .map(|cell| cell.to_string())
            .collect(),
        }
    }

    pub(crate) fn sample_table() -> ServerTable {
        ServerTable::new([
            spec("10.0.0.1:27015", "cp_badlands", "Alpha"),
            spec("10.0.0.2:27015", "pl_upward", "Bravo"),
            spec("10.0.0.3:27016", "koth_viaduct", "Charlie"),
        ])
    }

    fn server_ids(table: &ServerTable) -> Vec<RowId> {
        table.servers().map(|row| row.id()).collect()
    }

    #[test]
    fn toggle_twice_restores_rows() {
        let mut table = sample_table();
        let before = table.rows().to_vec();
        let server = server_ids(&table)[1];

        let players = table.toggle_players(server).expect("expanded");
        assert_eq!(table.len(), 4);
        assert_eq!(table.position(players), Some(2));
        assert!(table.server(server).expect("server").has_players_row());

        assert_eq!(table.toggle_players(server), None);
        assert_eq!(table.rows(), before.as_slice());
        assert_eq!(table.get(players), None);
    }

    #[test]
    fn expanded_row_copies_address_and_classes() {
        let mut table = sample_table();
        let server = server_ids(&table)[0];
        let players = table.toggle_players(server).expect("expanded");
        let row = table.players(players).expect("players row");

        assert_eq!(row.addr(), "10.0.0.1:27015");
        assert_eq!(row.classes(), ["players", "bg-dark"]);
        assert_eq!(row.spacer_span(), 10);
        assert_eq!(row.content_span(), 4);
        assert!(row.players().is_none());
    }

    #[test]
    fn at_most_one_players_row_per_server() {
        let mut table = sample_table();
        let ids = server_ids(&table);
        for _ in 0..5 {
            for id in &ids {
                table.toggle_players(*id);
            }
            for (idx, row) in table.rows().iter().enumerate() {
                if let TableRow::Players(_) = row {
                    assert!(matches!(table.rows()[idx - 1], TableRow::Server(_)));
                    assert!(!matches!(
                        table.rows().get(idx + 1),
                        Some(TableRow::Players(_))
                    ));
                }
            }
        }
    }

    #[test]
    fn players_row_resolves_to_preceding_server() {
        let mut table = sample_table();
        let server = server_ids(&table)[2];
        let players = table.toggle_players(server).expect("expanded");

        let pair = table
            .resolve_pair(table.classify(players).expect("classified"))
            .expect("pair");
        assert_eq!(
            pair,
            RowPair {
                server,
                players: Some(players)
            }
        );
        assert_eq!(
            table.resolve_pair(Row::Server(server)),
            Some(RowPair {
                server,
                players: Some(players)
            })
        );
    }

    #[test]
    fn connect_marker_is_exclusive() {
        let mut table = sample_table();
        assert!(table.connected().is_none());
        let ids = server_ids(&table);
        for id in [ids[0], ids[2], ids[1], ids[1]] {
            assert!(table.mark_connected(id));
            let marked: Vec<_> = table.servers().filter(|row| row.is_connected()).collect();
            assert_eq!(marked.len(), 1);
            assert_eq!(marked[0].id(), id);
        }
    }

    #[test]
    fn marking_a_players_row_is_rejected() {
        let mut table = sample_table();
        let server = server_ids(&table)[0];
        table.mark_connected(server);
        let players = table.toggle_players(server).expect("expanded");
        assert!(!table.mark_connected(players));
        assert_eq!(table.connected().map(ServerRow::id), Some(server));
    }

    #[test]
    fn snapshot_overwrites_scalar_cells() {
        let mut table = sample_table();
        let server = server_ids(&table)[0];
        let snapshot = ServerSnapshot {
            ping: Some(12),
            players: Some(3),
            max_players: Some(24),
            bots: Some(1),
            map_name: Some("de_dust2".to_string()),
            a2s_players: vec![],
        };
        assert!(table.apply_snapshot(server, &snapshot));
        let row = table.server(server).expect("server");
        assert_eq!(&row.cells()[8..13], ["12", "3", "24", "1", "de_dust2"]);
        assert_eq!(row.server_name(), "Alpha");
    }

    #[test]
    fn set_players_requires_adjacent_row() {
        let mut table = sample_table();
        let ids = server_ids(&table);
        let players = table.toggle_players(ids[0]).expect("expanded");
        let snapshot = ServerSnapshot {
            a2s_players: vec![PlayerSnapshot {
                name: "Alice".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        assert!(!table.set_players(ids[1], players, render_players(&snapshot)));
        assert!(table.set_players(ids[0], players, render_players(&snapshot)));
        assert_eq!(
            table
                .players(players)
                .and_then(PlayersRow::players)
                .map(|t| t.rows().len()),
            Some(1)
        );

        table.toggle_players(ids[0]);
        assert!(!table.set_players(ids[0], players, render_players(&snapshot)));
    }

    #[test]
    fn trailing_cells_name_map_and_server() {
        let table = sample_table();
        let row = table.servers().nth(1).expect("row");
        assert_eq!(row.map_name(), "pl_upward");
        assert_eq!(row.server_name(), "Bravo");
    }
}
