// ABOUTME: SQL Server connection management using tiberius
// ABOUTME: Trusted connections, catalog reads, statement execution, and row conversion

use thiserror::Error;
use tiberius::{AuthMethod, Client, ColumnData, ColumnType, Config, Row, SqlBrowser, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::db::catalog;
use crate::models::{ColumnDescriptor, ResultColumn, ResultSet, TypedValue};
use crate::sql::{self, ValidationError};

/// Database used for server-level statements such as `CREATE DATABASE`
pub const ADMIN_DATABASE: &str = "master";
const APPLICATION_NAME: &str = "mssql-manager";

#[derive(Error, Debug)]
pub enum SqlServerError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Tiberius error: {0}")]
    Tiberius(#[from] tiberius::error::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server and database to open with integrated authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub server: String,
    pub database: String,
}

impl ConnectionTarget {
    pub fn new(server: &str, database: &str) -> Result<Self, ValidationError> {
        let server = server.trim();
        let database = database.trim();
        if server.is_empty() || database.is_empty() {
            return Err(ValidationError::MissingTarget);
        }
        if server.contains([';', '{', '}', '=']) {
            return Err(ValidationError::InvalidServer(server.to_string()));
        }
        sql::validate_identifier(database)?;

        Ok(Self {
            server: server.to_string(),
            database: database.to_string(),
        })
    }

    /// Same server, administrative database
    pub fn admin(&self) -> Self {
        Self {
            server: self.server.clone(),
            database: ADMIN_DATABASE.to_string(),
        }
    }

    pub fn ado_string(&self) -> String {
        format!(
            "server={};database={};IntegratedSecurity=true;TrustServerCertificate=true;ApplicationName={}",
            self.server, self.database, APPLICATION_NAME
        )
    }

    /// Driver configuration; always authenticates as the current OS identity
    pub fn config(&self) -> Result<Config, SqlServerError> {
        let mut config = Config::from_ado_string(&self.ado_string())
            .map_err(|e| SqlServerError::ConnectionFailed(e.to_string()))?;
        config.authentication(integrated_auth()?);
        Ok(config)
    }
}

#[cfg(any(windows, all(unix, feature = "integrated-auth-gssapi")))]
fn integrated_auth() -> Result<AuthMethod, SqlServerError> {
    Ok(AuthMethod::Integrated)
}

#[cfg(not(any(windows, all(unix, feature = "integrated-auth-gssapi"))))]
fn integrated_auth() -> Result<AuthMethod, SqlServerError> {
    Err(SqlServerError::ConnectionFailed(
        "Trusted connections are not available in this build; \
         rebuild with the integrated-auth-gssapi feature"
            .to_string(),
    ))
}

pub struct SqlServerConnection {
    client: Client<Compat<TcpStream>>,
}

impl SqlServerConnection {
    /// Connect to SQL Server as the current OS identity
    pub async fn connect(target: &ConnectionTarget) -> Result<Self, SqlServerError> {
        let config = target.config()?;

        // Resolves named instances through SQL Browser, plain host:port otherwise
        let tcp = TcpStream::connect_named(&config)
            .await
            .map_err(|e| SqlServerError::ConnectionFailed(e.to_string()))?;

        tcp.set_nodelay(true)?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| SqlServerError::ConnectionFailed(e.to_string()))?;

        log::info!("Connected to {} on {}", target.database, target.server);
        Ok(Self { client })
    }

    pub async fn close(self) -> Result<(), SqlServerError> {
        self.client.close().await?;
        Ok(())
    }

    /// Query SQL Server version
    pub async fn server_version(&mut self) -> Result<String, SqlServerError> {
        let row = self
            .client
            .simple_query("SELECT @@VERSION")
            .await?
            .into_row()
            .await?
            .ok_or_else(|| SqlServerError::QueryFailed("No version returned".to_string()))?;

        let version: Option<&str> = row.try_get(0)?;
        Ok(version.unwrap_or("Unknown").to_string())
    }

    /// Base tables of the current database, alphabetical
    pub async fn list_tables(&mut self) -> Result<Vec<String>, SqlServerError> {
        let stream = self.client.simple_query(catalog::LIST_TABLES).await?;
        let rows = stream.into_first_result().await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let name: Option<&str> = row.try_get(0)?;
            if let Some(name) = name {
                tables.push(name.to_string());
            }
        }

        Ok(catalog::sort_tables(tables))
    }

    /// Column metadata of `table` in ordinal order
    pub async fn describe_columns(
        &mut self,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, SqlServerError> {
        let stream = self
            .client
            .query(catalog::DESCRIBE_COLUMNS, &[&table])
            .await?;
        let rows = stream.into_first_result().await?;

        let mut raw = Vec::with_capacity(rows.len());
        for row in rows {
            let name: Option<&str> = row.try_get(0)?;
            let data_type: Option<&str> = row.try_get(1)?;
            let is_nullable: Option<&str> = row.try_get(2)?;
            let ordinal: Option<i32> = row.try_get(3)?;
            raw.push((
                name.unwrap_or("").to_string(),
                data_type.unwrap_or("").to_string(),
                is_nullable.unwrap_or("YES").to_string(),
                ordinal.unwrap_or(0),
            ));
        }

        Ok(catalog::columns_from_rows(raw))
    }

    /// Run DDL or parameterized DML; returns the affected row count
    pub async fn execute_statement(
        &mut self,
        sql: &str,
        params: &[&TypedValue],
    ) -> Result<u64, SqlServerError> {
        log::debug!("Executing statement: {}", sql);

        if params.is_empty() {
            self.client.simple_query(sql).await?.into_results().await?;
            return Ok(0);
        }

        let bound: Vec<&dyn ToSql> = params.iter().map(|p| p.as_sql()).collect();
        let result = self.client.execute(sql, &bound).await?;
        Ok(result.total())
    }

    /// Run arbitrary SQL and collect the first result set
    pub async fn execute_query(&mut self, sql: &str) -> Result<ResultSet, SqlServerError> {
        log::debug!("Executing query: {}", sql);

        let mut stream = self.client.simple_query(sql).await?;
        let columns: Vec<ResultColumn> = stream
            .columns()
            .await?
            .map(|cols| {
                cols.iter()
                    .map(|c| ResultColumn {
                        name: c.name().to_string(),
                        sql_type: Some(type_name(c.column_type()).to_string()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let rows = stream.into_first_result().await?;
        Ok(ResultSet {
            columns,
            rows: rows.iter().map(row_to_strings).collect(),
        })
    }
}

/// Catalog-style name for a wire column type
fn type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Bit | ColumnType::Bitn => "bit",
        ColumnType::Int1 => "tinyint",
        ColumnType::Int2 => "smallint",
        ColumnType::Int4 | ColumnType::Intn => "int",
        ColumnType::Int8 => "bigint",
        ColumnType::Float4 => "real",
        ColumnType::Float8 | ColumnType::Floatn => "float",
        ColumnType::Money | ColumnType::Money4 => "money",
        ColumnType::Decimaln => "decimal",
        ColumnType::Numericn => "numeric",
        ColumnType::Datetime | ColumnType::Datetimen => "datetime",
        ColumnType::Datetime4 => "smalldatetime",
        ColumnType::Datetime2 => "datetime2",
        ColumnType::DatetimeOffsetn => "datetimeoffset",
        ColumnType::Daten => "date",
        ColumnType::Timen => "time",
        ColumnType::Guid => "uniqueidentifier",
        ColumnType::BigVarChar => "varchar",
        ColumnType::BigChar => "char",
        ColumnType::NVarchar => "nvarchar",
        ColumnType::NChar => "nchar",
        ColumnType::Text => "text",
        ColumnType::NText => "ntext",
        ColumnType::Xml => "xml",
        ColumnType::BigVarBin | ColumnType::BigBinary | ColumnType::Image => "varbinary",
        _ => "sql_variant",
    }
}

/// Stringify every cell; `None` is SQL NULL
fn row_to_strings(row: &Row) -> Vec<Option<String>> {
    row.cells()
        .enumerate()
        .map(|(i, (_col, data))| match data {
            ColumnData::DateTime(Some(_))
            | ColumnData::SmallDateTime(Some(_))
            | ColumnData::DateTime2(Some(_)) => row
                .try_get::<chrono::NaiveDateTime, _>(i)
                .ok()
                .flatten()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            ColumnData::DateTimeOffset(Some(_)) => row
                .try_get::<chrono::DateTime<chrono::Utc>, _>(i)
                .ok()
                .flatten()
                .map(|dt| dt.to_rfc3339()),
            ColumnData::Date(Some(_)) => row
                .try_get::<chrono::NaiveDate, _>(i)
                .ok()
                .flatten()
                .map(|d| d.format("%Y-%m-%d").to_string()),
            ColumnData::Time(Some(_)) => row
                .try_get::<chrono::NaiveTime, _>(i)
                .ok()
                .flatten()
                .map(|t| t.format("%H:%M:%S%.f").to_string()),
            _ => cell_to_string(data),
        })
        .collect()
}

fn cell_to_string(data: &ColumnData<'_>) -> Option<String> {
    match data {
        ColumnData::Bit(Some(b)) => Some(if *b { "True" } else { "False" }.to_string()),
        ColumnData::U8(Some(v)) => Some(v.to_string()),
        ColumnData::I16(Some(v)) => Some(v.to_string()),
        ColumnData::I32(Some(v)) => Some(v.to_string()),
        ColumnData::I64(Some(v)) => Some(v.to_string()),
        ColumnData::F32(Some(v)) => Some(v.to_string()),
        ColumnData::F64(Some(v)) => Some(v.to_string()),
        ColumnData::Numeric(Some(n)) => Some(format_numeric(n.value(), n.scale())),
        ColumnData::String(Some(s)) => Some(s.to_string()),
        ColumnData::Guid(Some(g)) => Some(g.to_string()),
        ColumnData::Binary(Some(b)) => {
            let hex: String = b.iter().map(|byte| format!("{:02X}", byte)).collect();
            Some(format!("0x{}", hex))
        }
        ColumnData::Xml(Some(xml)) => Some(xml.to_string()),
        _ => None,
    }
}

/// Render a scaled integer without going through floating point
fn format_numeric(value: i128, scale: u8) -> String {
    if scale == 0 {
        return value.to_string();
    }
    let digits = value.unsigned_abs().to_string();
    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    let sign = if value < 0 { "-" } else { "" };
    format!("{}{}.{}", sign, int_part, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ado_string() {
        let target = ConnectionTarget::new("DESKTOP-01\\SQLEXPRESS", "Shop").unwrap();
        assert_eq!(
            target.ado_string(),
            "server=DESKTOP-01\\SQLEXPRESS;database=Shop;IntegratedSecurity=true;TrustServerCertificate=true;ApplicationName=mssql-manager"
        );
    }

    #[cfg(any(windows, all(unix, feature = "integrated-auth-gssapi")))]
    #[test]
    fn test_config_uses_integrated_auth() {
        let target = ConnectionTarget::new("localhost", "Shop").unwrap();
        let config = target.config().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("Integrated"), "{}", debug);
        assert!(!debug.contains("SqlServerAuth"), "{}", debug);
    }

    #[cfg(not(any(windows, all(unix, feature = "integrated-auth-gssapi"))))]
    #[test]
    fn test_config_refuses_sql_login_fallback() {
        let target = ConnectionTarget::new("localhost", "Shop").unwrap();
        match target.config() {
            Err(SqlServerError::ConnectionFailed(message)) => {
                assert!(message.contains("integrated-auth-gssapi"), "{}", message);
            }
            Err(e) => panic!("unexpected error {}", e),
            Ok(config) => panic!("expected no config, got {:?}", config),
        }
    }

    #[test]
    fn test_admin_target_uses_master() {
        let target = ConnectionTarget::new("localhost", "Shop").unwrap();
        let admin = target.admin();
        assert_eq!(admin.server, "localhost");
        assert_eq!(admin.database, "master");
        assert!(admin.ado_string().contains("database=master;"));
    }

    #[test]
    fn test_target_validation() {
        assert_eq!(
            ConnectionTarget::new(" ", "Shop"),
            Err(ValidationError::MissingTarget)
        );
        assert_eq!(
            ConnectionTarget::new("localhost", ""),
            Err(ValidationError::MissingTarget)
        );
        assert!(matches!(
            ConnectionTarget::new("host;user id=sa", "Shop"),
            Err(ValidationError::InvalidServer(_))
        ));
        assert!(matches!(
            ConnectionTarget::new("localhost", "Shop]"),
            Err(ValidationError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_config_parses_ado_string() {
        let target = ConnectionTarget::new("localhost", "Shop").unwrap();
        assert!(Config::from_ado_string(&target.ado_string()).is_ok());
    }

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(12345, 2), "123.45");
        assert_eq!(format_numeric(-12345, 2), "-123.45");
        assert_eq!(format_numeric(5, 3), "0.005");
        assert_eq!(format_numeric(42, 0), "42");
        assert_eq!(format_numeric(-7, 2), "-0.07");
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&ColumnData::I32(Some(1))), Some("1".to_string()));
        assert_eq!(cell_to_string(&ColumnData::I32(None)), None);
        assert_eq!(
            cell_to_string(&ColumnData::Bit(Some(true))),
            Some("True".to_string())
        );
        assert_eq!(
            cell_to_string(&ColumnData::String(Some("Alice".into()))),
            Some("Alice".to_string())
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(ColumnType::Int4), "int");
        assert_eq!(type_name(ColumnType::NVarchar), "nvarchar");
        assert_eq!(type_name(ColumnType::Datetime2), "datetime2");
        assert_eq!(type_name(ColumnType::Decimaln), "decimal");
    }
}
