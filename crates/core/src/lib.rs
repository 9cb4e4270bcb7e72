#![warn(clippy::all, missing_docs)]

//! Core logic for the qvalve server browser.
//!
//! This crate owns the server table model, the row interaction controller,
//! the backend client and the configuration used by the terminal UI and any
//! future frontends.

pub mod client;
pub mod config;
pub mod controller;
pub mod listing;
pub mod models;
pub mod query;
pub mod render;
pub mod runner;
pub mod table;

pub use client::{ClientError, ServerClient};
pub use config::AppConfig;
pub use controller::{Click, Command, RefreshOutcome, RefreshTicket, RowController};
pub use models::{PlayerSnapshot, ServerInfo, ServerSnapshot};
pub use render::{render_players, PlayerTable};
pub use runner::{RefreshEvent, RequestRunner};
pub use table::{Row, RowId, RowPair, ServerTable, TableRow};
