// ABOUTME: View Data commands
// ABOUTME: Browse a whole table or run a query typed by the user

use crate::db::Session;
use crate::error::ActionResult;
use crate::models::ResultSet;
use crate::sql::{self, ValidationError};
use crate::ActionResponse;

/// `SELECT *` from `table`, with column types taken from the catalog
pub async fn view_table(session: &mut Session, table: &str) -> ActionResponse<ResultSet> {
    let result: ActionResult<ResultSet> = async {
        let statement = sql::select_all_sql(table)?;
        let described = session.describe_columns(table).await?;
        let result = session.execute_query(&statement).await?;
        Ok(result.with_catalog_types(&described))
    }
    .await;

    match result {
        Ok(result) => ActionResponse::success(result),
        Err(e) => {
            log::error!("View table {} failed: {}", table, e);
            ActionResponse::error(format!("Failed to view table data: {}", e))
        }
    }
}

/// Run `query` verbatim and return its first result set
pub async fn run_query(session: &mut Session, query: &str) -> ActionResponse<ResultSet> {
    let result: ActionResult<ResultSet> = async {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        session.execute_query(query).await
    }
    .await;

    match result {
        Ok(result) => ActionResponse::success(result),
        Err(e) => {
            log::error!("Query failed: {}", e);
            ActionResponse::error(format!("Failed to execute query: {}", e))
        }
    }
}
