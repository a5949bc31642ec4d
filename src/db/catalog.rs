// ABOUTME: Catalog metadata queries for MSSQL Manager
// ABOUTME: INFORMATION_SCHEMA text and ordering of the rows it returns

use crate::models::ColumnDescriptor;

pub const LIST_TABLES: &str = r#"
    SELECT TABLE_NAME
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME
"#;

/// `@P1` is the table name
pub const DESCRIBE_COLUMNS: &str = r#"
    SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, ORDINAL_POSITION
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_NAME = @P1
    ORDER BY ORDINAL_POSITION
"#;

/// Alphabetical, case-insensitive; the server collation may order differently
pub fn sort_tables(mut tables: Vec<String>) -> Vec<String> {
    tables.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    tables
}

/// Build descriptors from `(name, type, IS_NULLABLE, ordinal)` rows
pub fn columns_from_rows(rows: Vec<(String, String, String, i32)>) -> Vec<ColumnDescriptor> {
    let mut columns: Vec<ColumnDescriptor> = rows
        .into_iter()
        .map(|(name, sql_type, is_nullable, ordinal_position)| ColumnDescriptor {
            name,
            sql_type,
            nullable: is_nullable.eq_ignore_ascii_case("YES"),
            ordinal_position,
        })
        .collect();
    columns.sort_by_key(|c| c.ordinal_position);
    columns
}
