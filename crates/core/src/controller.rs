//! Row interaction controller.
//!
//! Turns clicks on the server table into expansion changes and backend
//! requests, and folds request results back into the table.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::{
    client::ClientError,
    models::ServerSnapshot,
    query::{url_for, CONNECT_PATH, SHOW_PLAYERS_PATH},
    render::render_players,
    table::{Row, RowId, RowPair, ServerTable},
};

/// A click on a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Click {
    /// Row under the pointer or cursor.
    pub row: RowId,
    /// Whether Control was held.
    pub control: bool,
}

/// Identity and generation of one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    /// Pair the refresh was issued for.
    pub pair: RowPair,
    /// Per-server sequence number; only the latest one is applied.
    pub generation: u64,
}

/// Backend request produced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fire-and-forget connect request.
    Connect {
        /// Server being connected to.
        server: RowId,
        /// Path and query of the request.
        url: String,
    },
    /// Snapshot request whose result goes to [`RowController::complete_refresh`].
    Refresh {
        /// Ticket to hand back with the result.
        ticket: RefreshTicket,
        /// Path and query of the request.
        url: String,
    },
}

/// What happened to a refresh result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Server cells were updated; `players_rendered` tells whether the
    /// player table was replaced too.
    Applied {
        /// Whether the player table was replaced.
        players_rendered: bool,
    },
    /// A newer refresh for the same server was issued; result dropped.
    Stale,
    /// The request failed; the table keeps its last state.
    Failed,
}

/// Owns the server table and applies click semantics to it.
#[derive(Debug, Default)]
pub struct RowController {
    table: ServerTable,
    generations: HashMap<RowId, u64>,
}

impl RowController {
    /// Wrap a freshly built table.
    pub fn new(table: ServerTable) -> Self {
        Self {
            table,
            generations: HashMap::new(),
        }
    }

    /// Read-only view of the table.
    pub fn table(&self) -> &ServerTable {
        &self.table
    }

    /// Handle a click and return the requests it triggers.
    ///
    /// * Control-click on either row kind connects, then refreshes.
    /// * A plain click on a server row toggles its players row, then refreshes.
    /// * A plain click on a players row only refreshes.
    pub fn dispatch(&mut self, click: Click) -> Vec<Command> {
        let Some(row) = self.table.classify(click.row) else {
            warn!(row = %click.row, "click on unknown row");
            return Vec::new();
        };
        let Some(mut pair) = self.table.resolve_pair(row) else {
            warn!(row = %click.row, "players row without a server row");
            return Vec::new();
        };

        let mut commands = Vec::with_capacity(2);
        if click.control {
            commands.extend(self.connect(pair.server));
        } else if let Row::Server(server) = row {
            pair.players = self.table.toggle_players(server);
        }
        commands.extend(self.refresh(pair));
        commands
    }

    /// Mark `server` as last connected and build its connect request.
    pub fn connect(&mut self, server: RowId) -> Option<Command> {
        let url = url_for(self.table.server(server)?, CONNECT_PATH);
        self.table.mark_connected(server);
        info!(%server, %url, "connect requested");
        Some(Command::Connect { server, url })
    }

    /// Build a refresh request for a pair, superseding earlier ones.
    pub fn refresh(&mut self, pair: RowPair) -> Option<Command> {
        let url = url_for(self.table.server(pair.server)?, SHOW_PLAYERS_PATH);
        let generation = self.generations.entry(pair.server).or_default();
        *generation += 1;
        let ticket = RefreshTicket {
            pair,
            generation: *generation,
        };
        debug!(server = %pair.server, generation = ticket.generation, "refresh issued");
        Some(Command::Refresh { ticket, url })
    }

    /// Refresh every expanded pair.
    pub fn refresh_expanded(&mut self) -> Vec<Command> {
        self.table
            .expanded_pairs()
            .into_iter()
            .filter_map(|pair| self.refresh(pair))
            .collect()
    }

    /// Fold a refresh result into the table.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<ServerSnapshot, ClientError>,
    ) -> RefreshOutcome {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(server = %ticket.pair.server, error = %err, "refresh failed");
                return RefreshOutcome::Failed;
            }
        };

        let current = self.generations.get(&ticket.pair.server).copied();
        if current != Some(ticket.generation) {
            debug!(server = %ticket.pair.server, generation = ticket.generation, "stale refresh dropped");
            return RefreshOutcome::Stale;
        }
        if !self.table.apply_snapshot(ticket.pair.server, &snapshot) {
            return RefreshOutcome::Stale;
        }

        let players_rendered = match ticket.pair.players {
            Some(players) => {
                let rendered =
                    self.table
                        .set_players(ticket.pair.server, players, render_players(&snapshot));
                if !rendered {
                    debug!(server = %ticket.pair.server, %players, "players row gone; skipped");
                }
                rendered
            }
            None => false,
        };
        RefreshOutcome::Applied { players_rendered }
    }
}
