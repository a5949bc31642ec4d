// ABOUTME: Explicit session object holding the single open SQL Server connection
// ABOUTME: Every database operation goes through here and fails with NotConnected when closed

use crate::db::sqlserver::{ConnectionTarget, SqlServerConnection};
use crate::error::{ActionError, ActionResult};
use crate::models::{ColumnDescriptor, ResultSet, TypedValue};
use crate::sql::{self, ValidationError};

/// At most one connection at a time; no pooling
#[derive(Default)]
pub struct Session {
    connection: Option<SqlServerConnection>,
    target: Option<ConnectionTarget>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn target(&self) -> Option<&ConnectionTarget> {
        self.target.as_ref()
    }

    /// Open a connection; the previous one must have been closed
    pub async fn open(&mut self, target: ConnectionTarget) -> ActionResult<String> {
        if self.is_connected() {
            return Err(ValidationError::AlreadyConnected.into());
        }

        let mut conn = SqlServerConnection::connect(&target).await?;
        let version = conn.server_version().await?;

        self.connection = Some(conn);
        self.target = Some(target);
        Ok(version)
    }

    /// Drop the connection. A failed close handshake is only logged: the
    /// handle is gone either way, so the session counts as closed.
    pub async fn close(&mut self) -> ActionResult<()> {
        let conn = self.connection.take().ok_or(ActionError::NotConnected)?;
        let target = self.target.take();
        if let Err(e) = conn.close().await {
            log::warn!("Closing connection failed: {}", e);
        }
        if let Some(t) = target {
            log::info!("Disconnected from {} on {}", t.database, t.server);
        }
        Ok(())
    }

    fn connection(&mut self) -> ActionResult<&mut SqlServerConnection> {
        self.connection.as_mut().ok_or(ActionError::NotConnected)
    }

    pub async fn list_tables(&mut self) -> ActionResult<Vec<String>> {
        Ok(self.connection()?.list_tables().await?)
    }

    pub async fn describe_columns(&mut self, table: &str) -> ActionResult<Vec<ColumnDescriptor>> {
        let conn = self.connection()?;
        Ok(conn.describe_columns(table).await?)
    }

    pub async fn execute_statement(
        &mut self,
        sql: &str,
        params: &[&TypedValue],
    ) -> ActionResult<u64> {
        let conn = self.connection()?;
        Ok(conn.execute_statement(sql, params).await?)
    }

    pub async fn execute_query(&mut self, sql: &str) -> ActionResult<ResultSet> {
        let conn = self.connection()?;
        Ok(conn.execute_query(sql).await?)
    }
}

/// Create a database through a short-lived connection to the admin database
pub async fn create_database(target: &ConnectionTarget) -> ActionResult<()> {
    let statement = sql::create_database_sql(&target.database)?;

    let mut conn = SqlServerConnection::connect(&target.admin()).await?;
    let result = conn.execute_statement(&statement, &[]).await;
    if let Err(e) = conn.close().await {
        log::warn!("Failed to close admin connection: {}", e);
    }
    result?;

    log::info!("Created database {} on {}", target.database, target.server);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_describe_columns_requires_connection() {
        let mut session = Session::new();
        let result = session.describe_columns("Users").await;
        assert!(matches!(result, Err(ActionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let mut session = Session::new();
        assert!(!session.is_connected());
        assert!(matches!(
            session.list_tables().await,
            Err(ActionError::NotConnected)
        ));
        assert!(matches!(
            session.execute_query("SELECT 1 AS x").await,
            Err(ActionError::NotConnected)
        ));
        assert!(matches!(
            session.execute_statement("DROP TABLE [T]", &[]).await,
            Err(ActionError::NotConnected)
        ));
        assert!(matches!(session.close().await, Err(ActionError::NotConnected)));
    }
}
