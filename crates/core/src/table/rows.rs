use crate::render::PlayerTable;

/// Stable identity of a row for the lifetime of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub(crate) u64);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row#{}", self.0)
    }
}

/// Class carried by every server row.
pub const SERVER_CLASS: &str = "server";
/// Class carried by every players row.
pub const PLAYERS_CLASS: &str = "players";

/// Cell holding the ping value.
pub const COL_PING: usize = 8;
/// Cell holding the current player count.
pub const COL_PLAYERS: usize = 9;
/// Cell holding the maximum player count.
pub const COL_MAX_PLAYERS: usize = 10;
/// Cell holding the bot count.
pub const COL_BOTS: usize = 11;
/// Cell holding the map name.
pub const COL_MAP: usize = 12;
/// Minimum number of cells a server row must carry.
pub const MIN_SERVER_CELLS: usize = 13;
/// Columns skipped by the spacer of a players row.
pub const PLAYERS_SPACER_SPAN: usize = 10;

/// A row for one game server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRow {
    pub(crate) id: RowId,
    pub(crate) addr: String,
    pub(crate) classes: Vec<String>,
    pub(crate) cells: Vec<String>,
    pub(crate) has_players_row: bool,
    pub(crate) connected: bool,
}

impl ServerRow {
    /// Row identity.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// `host:port` address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Class list, `server` first.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Display cells as last rendered.
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Whether a players row currently follows this row.
    pub fn has_players_row(&self) -> bool {
        self.has_players_row
    }

    /// Whether this is the server most recently connected to.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Map name, read from the second-to-last cell.
    pub fn map_name(&self) -> &str {
        self.trailing_cell(2)
    }

    /// Server name, read from the last cell.
    pub fn server_name(&self) -> &str {
        self.trailing_cell(1)
    }

    fn trailing_cell(&self, from_end: usize) -> &str {
        self.cells
            .len()
            .checked_sub(from_end)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Expanded player listing that sits directly beneath its server row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayersRow {
    pub(crate) id: RowId,
    pub(crate) addr: String,
    pub(crate) classes: Vec<String>,
    pub(crate) spacer_span: usize,
    pub(crate) content_span: usize,
    pub(crate) players: Option<PlayerTable>,
}

impl PlayersRow {
    pub(crate) fn beneath(id: RowId, server: &ServerRow) -> Self {
        let classes = server
            .classes
            .iter()
            .map(|class| {
                if class == SERVER_CLASS {
                    PLAYERS_CLASS.to_string()
                } else {
                    class.clone()
                }
            })
            .collect();
        let spacer_span = PLAYERS_SPACER_SPAN.min(server.cells.len());
        Self {
            id,
            addr: server.addr.clone(),
            classes,
            spacer_span,
            content_span: server.cells.len() - spacer_span,
            players: None,
        }
    }

    /// Row identity.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Address copied from the owning server row.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Class list, `players` in place of `server`.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of leading columns left blank.
    pub fn spacer_span(&self) -> usize {
        self.spacer_span
    }

    /// Number of trailing columns reserved for the player table.
    pub fn content_span(&self) -> usize {
        self.content_span
    }

    /// Rendered player table, `None` until the first successful refresh.
    pub fn players(&self) -> Option<&PlayerTable> {
        self.players.as_ref()
    }
}

/// A row of the server table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    /// Server row.
    Server(ServerRow),
    /// Players row.
    Players(PlayersRow),
}

impl TableRow {
    /// Identity of the row regardless of kind.
    pub fn id(&self) -> RowId {
        match self {
            TableRow::Server(row) => row.id,
            TableRow::Players(row) => row.id,
        }
    }
}

/// Classification of a clicked row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    /// A server row.
    Server(RowId),
    /// A players row.
    Players(RowId),
}

/// A server row together with its players row, if expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPair {
    /// The server row.
    pub server: RowId,
    /// The players row directly beneath it.
    pub players: Option<RowId>,
}
