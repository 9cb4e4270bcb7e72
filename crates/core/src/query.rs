//! Endpoint URL construction.

use crate::table::ServerRow;

/// Path of the endpoint that returns a server snapshot.
pub const SHOW_PLAYERS_PATH: &str = "/show-players";
/// Path of the endpoint that writes the connect script.
pub const CONNECT_PATH: &str = "/connect";

/// Build `<path>/<addr>?map_name=<m>&server_name=<s>` for a server row.
///
/// Map and server name come from the row's last two cells as they are
/// rendered right now.
pub fn url_for(row: &ServerRow, path: &str) -> String {
    format!(
        "{path}/{addr}?map_name={map}&server_name={server}",
        addr = row.addr(),
        map = urlencoding::encode(row.map_name()),
        server = urlencoding::encode(row.server_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ServerTable, tests::spec};

    #[test]
    fn builds_path_address_and_escaped_query() {
        let table = ServerTable::new([spec("10.0.0.1:27015", "pl_upward", "Joe's #1 & Co")]);
        let row = table.servers().next().expect("row");
        assert_eq!(
            url_for(row, SHOW_PLAYERS_PATH),
            "/show-players/10.0.0.1:27015?map_name=pl_upward&server_name=Joe%27s%20%231%20%26%20Co"
        );
    }

    #[test]
    fn reads_cells_at_call_time() {
        let mut table = ServerTable::new([spec("10.0.0.1:27015", "pl_upward", "Alpha")]);
        let id = table.servers().next().expect("row").id();
        let snapshot = crate::models::ServerSnapshot {
            map_name: Some("cp_dustbowl".to_string()),
            ..Default::default()
        };
        table.apply_snapshot(id, &snapshot);
        let row = table.server(id).expect("row");
        assert_eq!(
            url_for(row, CONNECT_PATH),
            "/connect/10.0.0.1:27015?map_name=cp_dustbowl&server_name=Alpha"
        );
    }
}
