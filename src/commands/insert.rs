// ABOUTME: Insert Data commands
// ABOUTME: Build the insert form from catalog metadata and submit it as a parameterized INSERT

use crate::db::Session;
use crate::error::{ActionError, ActionResult};
use crate::forms::InsertForm;
use crate::sql::{self, Placeholder};
use crate::ActionResponse;

/// Describe `table` and build one field per column
pub async fn load_form(session: &mut Session, table: &str) -> ActionResponse<InsertForm> {
    let result: ActionResult<InsertForm> = async {
        sql::validate_identifier(table)?;
        let columns = session.describe_columns(table).await?;
        Ok(InsertForm::new(table, columns))
    }
    .await;

    match result {
        Ok(form) => ActionResponse::success(form),
        Err(e) => {
            log::error!("Load table structure for {} failed: {}", table, e);
            ActionResponse::error(format!("Failed to load table structure: {}", e))
        }
    }
}

/// Convert every field and run the INSERT; returns the affected row count
pub async fn insert_row(session: &mut Session, form: &InsertForm) -> ActionResponse<u64> {
    let result: ActionResult<u64> = async {
        if !session.is_connected() {
            return Err(ActionError::NotConnected);
        }
        let statement = form.submit()?;
        let sql = statement.sql(Placeholder::Ordinal);
        session.execute_statement(&sql, &statement.values()).await
    }
    .await;

    match result {
        Ok(rows) => {
            log::info!("Inserted {} row(s) into {}", rows, form.table);
            ActionResponse::success(rows)
        }
        Err(e) => {
            log::error!("Insert into {} failed: {}", form.table, e);
            ActionResponse::error(format!("Failed to insert data: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_form_requires_connection() {
        let mut session = Session::new();
        let response = load_form(&mut session, "Users").await;
        assert!(!response.success);
        assert!(response
            .error_message()
            .unwrap()
            .contains("Please connect to database first"));
    }

    #[tokio::test]
    async fn test_load_form_rejects_unsupported_names() {
        let mut session = Session::new();
        let response = load_form(&mut session, "Users]; DROP TABLE x").await;
        assert!(response.error_message().unwrap().contains("Unsupported identifier"));
    }

    #[tokio::test]
    async fn test_insert_requires_connection() {
        let mut session = Session::new();
        let form = InsertForm::new("Users", vec![]);
        assert!(!insert_row(&mut session, &form).await.success);
    }
}
