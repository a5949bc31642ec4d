// ABOUTME: Table management commands
// ABOUTME: List, create, and drop tables from the table designer

use crate::db::Session;
use crate::error::{ActionError, ActionResult};
use crate::sql::{self, TableDesign, ValidationError};
use crate::ActionResponse;

/// A table that was created or dropped, with the refreshed table list
#[derive(Debug, Clone)]
pub struct TableChange {
    pub table: String,
    pub tables: Vec<String>,
}

pub async fn list_tables(session: &mut Session) -> ActionResponse<Vec<String>> {
    ActionResponse::from_result("List tables", session.list_tables().await)
}

pub async fn create_table(session: &mut Session, design: &TableDesign) -> ActionResponse<TableChange> {
    let result: ActionResult<String> = async {
        if !session.is_connected() {
            return Err(ActionError::NotConnected);
        }
        let statement = design.to_sql()?;
        session.execute_statement(&statement, &[]).await?;
        Ok(design.name.trim().to_string())
    }
    .await;

    match result {
        Ok(table) => {
            log::info!("Created table {}", table);
            refreshed(session, table).await
        }
        Err(e) => {
            log::error!("Create table failed: {}", e);
            ActionResponse::error(format!("Failed to create table: {}", e))
        }
    }
}

/// Drop a table. `confirmed` must come from the user's answer to the confirmation prompt.
pub async fn drop_table(
    session: &mut Session,
    table: &str,
    confirmed: bool,
) -> ActionResponse<TableChange> {
    let result: ActionResult<String> = async {
        if !session.is_connected() {
            return Err(ActionError::NotConnected);
        }
        let statement = sql::drop_table_sql(table)?;
        if !confirmed {
            return Err(ValidationError::NotConfirmed(table.trim().to_string()).into());
        }
        session.execute_statement(&statement, &[]).await?;
        Ok(table.trim().to_string())
    }
    .await;

    match result {
        Ok(table) => {
            log::info!("Dropped table {}", table);
            refreshed(session, table).await
        }
        Err(e) => {
            log::error!("Drop table failed: {}", e);
            ActionResponse::error(format!("Failed to delete table: {}", e))
        }
    }
}

async fn refreshed(session: &mut Session, table: String) -> ActionResponse<TableChange> {
    match session.list_tables().await {
        Ok(tables) => ActionResponse::success(TableChange { table, tables }),
        Err(e) => ActionResponse::success(TableChange {
            table,
            tables: Vec::new(),
        })
        .with_warning(format!("Failed to refresh tables list: {}", e)),
    }
}
