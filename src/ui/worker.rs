// ABOUTME: Background database worker for the terminal UI
// ABOUTME: Owns the session and runs requests one at a time, replying with tickets

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::commands::{self, ConnectionInfo, TableChange};
use crate::db::Session;
use crate::forms::InsertForm;
use crate::models::ResultSet;
use crate::sql::TableDesign;
use crate::ActionResponse;

/// Identifies one request so the UI can drop replies it no longer wants
pub type Ticket = u64;

#[derive(Debug, Clone)]
pub enum DbRequest {
    Connect { server: String, database: String },
    Disconnect,
    CreateDatabase { server: String, database: String },
    ListTables,
    CreateTable(TableDesign),
    DropTable { table: String, confirmed: bool },
    LoadForm(String),
    Insert(InsertForm),
    ViewTable(String),
    RunQuery(String),
}

/// Where a result grid came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultSource {
    Table(String),
    Query,
}

#[derive(Debug)]
pub enum DbEvent {
    Connected(ActionResponse<ConnectionInfo>),
    Disconnected(ActionResponse<()>),
    DatabaseCreated(ActionResponse<String>),
    TablesListed(ActionResponse<Vec<String>>),
    TableCreated(ActionResponse<TableChange>),
    TableDropped(ActionResponse<TableChange>),
    FormLoaded(ActionResponse<InsertForm>),
    Inserted(ActionResponse<u64>),
    ResultLoaded {
        source: ResultSource,
        response: ActionResponse<ResultSet>,
    },
}

/// Start the worker on `rt`. Requests are handled in the order they were sent.
pub fn spawn(
    rt: &Handle,
    requests: mpsc::UnboundedReceiver<(Ticket, DbRequest)>,
    events: mpsc::UnboundedSender<(Ticket, DbEvent)>,
) -> JoinHandle<()> {
    rt.spawn(run(requests, events))
}

async fn run(
    mut requests: mpsc::UnboundedReceiver<(Ticket, DbRequest)>,
    events: mpsc::UnboundedSender<(Ticket, DbEvent)>,
) {
    let mut session = Session::new();

    while let Some((ticket, request)) = requests.recv().await {
        log::debug!("Worker handling request {}: {:?}", ticket, request);
        let event = handle(&mut session, request).await;
        if events.send((ticket, event)).is_err() {
            break;
        }
    }

    if session.is_connected() {
        if let Err(e) = session.close().await {
            log::warn!("Closing connection on shutdown failed: {}", e);
        }
    }
    log::info!("Database worker stopped");
}

async fn handle(session: &mut Session, request: DbRequest) -> DbEvent {
    match request {
        DbRequest::Connect { server, database } => {
            DbEvent::Connected(commands::connect(session, &server, &database).await)
        }
        DbRequest::Disconnect => DbEvent::Disconnected(commands::disconnect(session).await),
        DbRequest::CreateDatabase { server, database } => {
            DbEvent::DatabaseCreated(commands::create_database(&server, &database).await)
        }
        DbRequest::ListTables => DbEvent::TablesListed(commands::list_tables(session).await),
        DbRequest::CreateTable(design) => {
            DbEvent::TableCreated(commands::create_table(session, &design).await)
        }
        DbRequest::DropTable { table, confirmed } => {
            DbEvent::TableDropped(commands::drop_table(session, &table, confirmed).await)
        }
        DbRequest::LoadForm(table) => {
            DbEvent::FormLoaded(commands::load_form(session, &table).await)
        }
        DbRequest::Insert(form) => DbEvent::Inserted(commands::insert_row(session, &form).await),
        DbRequest::ViewTable(table) => {
            let response = commands::view_table(session, &table).await;
            DbEvent::ResultLoaded {
                source: ResultSource::Table(table),
                response,
            }
        }
        DbRequest::RunQuery(query) => DbEvent::ResultLoaded {
            source: ResultSource::Query,
            response: commands::run_query(session, &query).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_worker_replies_in_order_with_tickets() {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (ev_tx, mut ev_rx) = mpsc::unbounded_channel();
        let handle = spawn(&Handle::current(), req_rx, ev_tx);

        req_tx.send((1, DbRequest::ListTables)).unwrap();
        req_tx.send((2, DbRequest::RunQuery("SELECT 1".into()))).unwrap();
        drop(req_tx);

        let (ticket, event) = ev_rx.recv().await.unwrap();
        assert_eq!(ticket, 1);
        match event {
            DbEvent::TablesListed(response) => assert!(!response.success),
            other => panic!("unexpected event {:?}", other),
        }

        let (ticket, event) = ev_rx.recv().await.unwrap();
        assert_eq!(ticket, 2);
        match event {
            DbEvent::ResultLoaded { source, response } => {
                assert_eq!(source, ResultSource::Query);
                let message = response.error_message().unwrap();
                assert!(message.contains("Please connect to database first"));
            }
            other => panic!("unexpected event {:?}", other),
        }

        handle.await.unwrap();
    }
}
