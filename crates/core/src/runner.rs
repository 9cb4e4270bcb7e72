//! Executes controller commands as background tasks.

use std::collections::HashMap;

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    client::{ClientError, ServerClient},
    controller::{Command, RefreshTicket},
    models::ServerSnapshot,
    table::RowId,
};

/// Result of a finished refresh request.
#[derive(Debug)]
pub struct RefreshEvent {
    /// Ticket the request was issued with.
    pub ticket: RefreshTicket,
    /// Snapshot or failure.
    pub result: Result<ServerSnapshot, ClientError>,
}

/// Spawns backend requests and reports refresh results over a channel.
///
/// At most one refresh per server row is in flight; issuing a new one aborts
/// the previous task.
pub struct RequestRunner {
    client: ServerClient,
    sender: mpsc::Sender<RefreshEvent>,
    in_flight: HashMap<RowId, JoinHandle<()>>,
}

impl RequestRunner {
    /// Create a runner that delivers refresh results to `sender`.
    pub fn new(client: ServerClient, sender: mpsc::Sender<RefreshEvent>) -> Self {
        Self {
            client,
            sender,
            in_flight: HashMap::new(),
        }
    }

    /// Spawn the task for one command. Must be called within a tokio runtime.
    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Connect { server, url } => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    match client.connect(&url).await {
                        Ok(body) => info!(%server, %body, "connect acknowledged"),
                        Err(err) => warn!(%server, error = %err, "connect failed"),
                    }
                });
            }
            Command::Refresh { ticket, url } => {
                let client = self.client.clone();
                let sender = self.sender.clone();
                let handle = tokio::spawn(async move {
                    let result = client.show_players(&url).await;
                    if sender.send(RefreshEvent { ticket, result }).await.is_err() {
                        debug!(server = %ticket.pair.server, "refresh receiver closed");
                    }
                });
                if let Some(previous) = self.in_flight.insert(ticket.pair.server, handle) {
                    previous.abort();
                }
            }
        }
    }

    /// Spawn every command in order.
    pub fn execute_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.execute(command);
        }
    }

    /// Forget finished tasks so the map only tracks live requests.
    pub fn reap(&mut self) {
        self.in_flight.retain(|_, handle| !handle.is_finished());
    }

    /// Number of refresh requests still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Drop for RequestRunner {
    fn drop(&mut self) {
        for handle in self.in_flight.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        client::tests::{serve_once, SNAPSHOT_BODY},
        controller::{Click, RefreshOutcome, RowController},
        table::{tests::sample_table, PlayersRow},
    };

    #[tokio::test]
    async fn refresh_result_is_delivered_with_its_ticket() {
        let (tx, mut rx) = mpsc::channel(4);
        let client =
            ServerClient::new("http://127.0.0.1:1", Duration::from_secs(2)).expect("client");
        let mut runner = RequestRunner::new(client, tx);

        let table = sample_table();
        let server = table.servers().next().expect("row").id();
        let mut controller = RowController::new(table);
        runner.execute_all(controller.dispatch(Click {
            row: server,
            control: false,
        }));

        let event = rx.recv().await.expect("event");
        assert_eq!(event.ticket.pair.server, server);
        assert!(event.result.is_err());
        runner.reap();
        assert_eq!(runner.in_flight(), 0);
    }

    #[tokio::test]
    async fn newer_refresh_aborts_the_older_one() {
        let (tx, mut rx) = mpsc::channel(4);
        // Nothing is polled before the first await, so both tasks are aborted unstarted.
        let client =
            ServerClient::new("http://127.0.0.1:1", Duration::from_secs(2)).expect("client");
        let mut runner = RequestRunner::new(client, tx);

        let table = sample_table();
        let server = table.servers().next().expect("row").id();
        let mut controller = RowController::new(table);
        let pair = crate::table::RowPair {
            server,
            players: None,
        };
        runner.execute_all(controller.refresh(pair));
        runner.execute_all(controller.refresh(pair));
        assert_eq!(runner.in_flight.len(), 1);

        drop(runner);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn delivered_snapshot_is_applied_by_the_controller() {
        let (tx, mut rx) = mpsc::channel(4);
        let base_url = serve_once("200 OK", SNAPSHOT_BODY).await;
        let client = ServerClient::new(base_url, Duration::from_secs(5)).expect("client");
        let mut runner = RequestRunner::new(client, tx);

        let table = sample_table();
        let server = table.servers().next().expect("row").id();
        let mut controller = RowController::new(table);
        runner.execute_all(controller.dispatch(Click {
            row: server,
            control: false,
        }));

        let event = rx.recv().await.expect("event");
        let players = event.ticket.pair.players.expect("expanded");
        assert!(event.result.is_ok());
        assert_eq!(
            controller.complete_refresh(event.ticket, event.result),
            RefreshOutcome::Applied {
                players_rendered: true
            }
        );
        let row = controller.table().server(server).expect("server");
        assert_eq!(&row.cells()[8..13], ["12", "1", "24", "0", "de_dust2"]);
        let rendered = controller
            .table()
            .players(players)
            .and_then(PlayersRow::players)
            .expect("rendered");
        assert_eq!(rendered.rows()[0].name, "Alice");
    }
}
