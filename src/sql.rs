// ABOUTME: SQL text generation for MSSQL Manager
// ABOUTME: Identifier validation, bracket quoting, and DDL/DML statement builders

use thiserror::Error;

use crate::models::{QueryParameter, TypedValue};

/// SQL Server `sysname` length
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Data types offered by the table designer
pub const DESIGNER_TYPES: &[&str] = &[
    "INT",
    "VARCHAR(50)",
    "VARCHAR(100)",
    "VARCHAR(255)",
    "DATETIME",
    "DECIMAL(10,2)",
    "BIT",
    "TEXT",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter both server and database names")]
    MissingTarget,
    #[error("Server name contains unsupported characters: {0}")]
    InvalidServer(String),
    #[error("Already connected; disconnect first")]
    AlreadyConnected,
    #[error("Please enter table name")]
    EmptyTableName,
    #[error("Please add at least one column")]
    NoColumns,
    #[error("Column {0} must have a name")]
    EmptyColumnName(usize),
    #[error("Unsupported identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Unsupported data type: {0}")]
    InvalidDataType(String),
    #[error("Please enter at least one value")]
    NoValues,
    #[error("Please enter a SQL query")]
    EmptyQuery,
    #[error("Drop of table {0} was not confirmed")]
    NotConfirmed(String),
}

/// Check a table/column/database name against the allowed character set
pub fn validate_identifier(name: &str) -> Result<&str, ValidationError> {
    let invalid = || ValidationError::InvalidIdentifier(name.to_string());

    if name.is_empty() || name.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(invalid());
    }
    if name.trim() != name {
        return Err(invalid());
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '$' | '#' | '@' | ' ');
    if !name.chars().all(allowed) {
        return Err(invalid());
    }
    Ok(name)
}

/// Bracket-quote a validated identifier
pub fn quote_ident(name: &str) -> Result<String, ValidationError> {
    validate_identifier(name).map(|n| format!("[{}]", n))
}

/// Accepts `NAME`, `NAME(n)`, `NAME(MAX)` and `NAME(p,s)`
pub fn validate_data_type(data_type: &str) -> Result<&str, ValidationError> {
    let invalid = || ValidationError::InvalidDataType(data_type.to_string());
    let trimmed = data_type.trim();

    let (base, args) = match trimmed.find('(') {
        Some(open) => {
            let args = trimmed[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
            (trimmed[..open].trim_end(), Some(args))
        }
        None => (trimmed, None),
    };

    if base.is_empty() || !base.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    if let Some(args) = args {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let numeric = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
        let ok = match parts.as_slice() {
            [one] => numeric(one) || one.eq_ignore_ascii_case("max"),
            [p, s] => numeric(p) && numeric(s),
            _ => false,
        };
        if !ok {
            return Err(invalid());
        }
    }

    Ok(trimmed)
}

/// One row of the table designer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: String,
    pub primary_key: bool,
    pub not_null: bool,
}

impl Default for ColumnDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            data_type: DESIGNER_TYPES[0].to_string(),
            primary_key: false,
            not_null: false,
        }
    }
}

/// A table as laid out in the designer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDesign {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDesign {
    /// Build the `CREATE TABLE` statement, columns in designer order
    pub fn to_sql(&self) -> Result<String, ValidationError> {
        let table = self.name.trim();
        if table.is_empty() {
            return Err(ValidationError::EmptyTableName);
        }
        if self.columns.is_empty() {
            return Err(ValidationError::NoColumns);
        }

        let mut defs = Vec::with_capacity(self.columns.len());
        for (i, column) in self.columns.iter().enumerate() {
            let name = column.name.trim();
            if name.is_empty() {
                return Err(ValidationError::EmptyColumnName(i + 1));
            }

            let mut def = format!(
                "{} {}",
                quote_ident(name)?,
                validate_data_type(&column.data_type)?
            );
            if column.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            if column.not_null {
                def.push_str(" NOT NULL");
            }
            defs.push(def);
        }

        Ok(format!(
            "CREATE TABLE {} ({})",
            quote_ident(table)?,
            defs.join(", ")
        ))
    }
}

pub fn drop_table_sql(table: &str) -> Result<String, ValidationError> {
    let table = table.trim();
    if table.is_empty() {
        return Err(ValidationError::EmptyTableName);
    }
    Ok(format!("DROP TABLE {}", quote_ident(table)?))
}

pub fn create_database_sql(database: &str) -> Result<String, ValidationError> {
    Ok(format!("CREATE DATABASE {}", quote_ident(database.trim())?))
}

pub fn select_all_sql(table: &str) -> Result<String, ValidationError> {
    Ok(format!("SELECT * FROM {}", quote_ident(table)?))
}

/// Parameter marker style used when rendering a parameterized statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`, the driver-neutral form
    Question,
    /// `@P1, @P2, ...`, as sent over TDS
    Ordinal,
}

/// A parameterized INSERT built from an insert form
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub parameters: Vec<QueryParameter>,
}

impl InsertStatement {
    pub fn new(table: &str, parameters: Vec<QueryParameter>) -> Result<Self, ValidationError> {
        if parameters.is_empty() {
            return Err(ValidationError::NoValues);
        }
        validate_identifier(table)?;
        for p in &parameters {
            validate_identifier(&p.column_name)?;
        }
        Ok(Self {
            table: table.to_string(),
            parameters,
        })
    }

    pub fn sql(&self, style: Placeholder) -> String {
        let columns: Vec<String> = self
            .parameters
            .iter()
            .map(|p| format!("[{}]", p.column_name))
            .collect();
        let markers: Vec<String> = (1..=self.parameters.len())
            .map(|i| match style {
                Placeholder::Question => "?".to_string(),
                Placeholder::Ordinal => format!("@P{}", i),
            })
            .collect();

        format!(
            "INSERT INTO [{}] ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            markers.join(", ")
        )
    }

    pub fn values(&self) -> Vec<&TypedValue> {
        self.parameters.iter().map(|p| &p.value).collect()
    }
}
