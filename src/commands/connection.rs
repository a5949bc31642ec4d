// ABOUTME: Connection-related commands
// ABOUTME: Connect, disconnect, and create databases with trusted authentication

use crate::db::{session, ConnectionTarget, Session};
use crate::ActionResponse;

/// What the connection tab shows after a successful connect
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub server: String,
    pub database: String,
    pub sql_server_version: String,
    pub tables: Vec<String>,
}

/// Open the session's connection and load the table list
pub async fn connect(
    session: &mut Session,
    server: &str,
    database: &str,
) -> ActionResponse<ConnectionInfo> {
    let target = match ConnectionTarget::new(server, database) {
        Ok(t) => t,
        Err(e) => return ActionResponse::error(e.to_string()),
    };

    let version = match session.open(target.clone()).await {
        Ok(v) => v,
        Err(e) => {
            log::error!("Connect to {} on {} failed: {}", target.database, target.server, e);
            return ActionResponse::error(format!("Failed to connect: {}", e));
        }
    };

    let mut info = ConnectionInfo {
        server: target.server,
        database: target.database,
        sql_server_version: version,
        tables: Vec::new(),
    };

    match session.list_tables().await {
        Ok(tables) => {
            info.tables = tables;
            ActionResponse::success(info)
        }
        Err(e) => {
            log::warn!("Connected, but listing tables failed: {}", e);
            ActionResponse::success(info)
                .with_warning(format!("Failed to refresh tables list: {}", e))
        }
    }
}

pub async fn disconnect(session: &mut Session) -> ActionResponse<()> {
    ActionResponse::from_result("Disconnect", session.close().await)
}

/// Issue `CREATE DATABASE` through the `master` database; the session is untouched
pub async fn create_database(server: &str, database: &str) -> ActionResponse<String> {
    let target = match ConnectionTarget::new(server, database) {
        Ok(t) => t,
        Err(e) => return ActionResponse::error(e.to_string()),
    };

    match session::create_database(&target).await {
        Ok(()) => ActionResponse::success(target.database),
        Err(e) => {
            log::error!("Create database {} failed: {}", target.database, e);
            ActionResponse::error(format!("Failed to create database: {}", e))
        }
    }
}

/// OS identity used for integrated authentication
pub fn current_identity() -> String {
    whoami::username()
}
