// ABOUTME: Shared data models for MSSQL Manager
// ABOUTME: Column metadata, typed parameter values, and tabular result sets

/// Column metadata as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub ordinal_position: i32,
}

/// A value bound to a statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl TypedValue {
    pub fn as_sql(&self) -> &dyn tiberius::ToSql {
        match self {
            TypedValue::Int(v) => v,
            TypedValue::Float(v) => v,
            TypedValue::Text(v) => v,
        }
    }
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::Int(v) => write!(f, "{}", v),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Text(v) => f.write_str(v),
        }
    }
}

/// A converted form value, keyed by the column it targets
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    pub column_name: String,
    pub value: TypedValue,
}

/// Column header of a result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    /// Catalog-style type name (`int`, `nvarchar`, ...) when known
    pub sql_type: Option<String>,
}

/// Rows returned by a view or query action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Overlay catalog types onto columns matched by name
    pub fn with_catalog_types(mut self, described: &[ColumnDescriptor]) -> Self {
        for column in &mut self.columns {
            if let Some(d) = described.iter().find(|d| d.name == column.name) {
                column.sql_type = Some(d.sql_type.clone());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_types_override_wire_types() {
        let result = ResultSet {
            columns: vec![
                ResultColumn {
                    name: "Id".to_string(),
                    sql_type: Some("int".to_string()),
                },
                ResultColumn {
                    name: "Name".to_string(),
                    sql_type: None,
                },
            ],
            rows: vec![],
        };
        let described = vec![ColumnDescriptor {
            name: "Name".to_string(),
            sql_type: "varchar".to_string(),
            nullable: false,
            ordinal_position: 2,
        }];

        let result = result.with_catalog_types(&described);
        assert_eq!(result.columns[0].sql_type.as_deref(), Some("int"));
        assert_eq!(result.columns[1].sql_type.as_deref(), Some("varchar"));
    }

    #[test]
    fn test_typed_value_display() {
        assert_eq!(TypedValue::Int(42).to_string(), "42");
        assert_eq!(TypedValue::Float(2.5).to_string(), "2.5");
        assert_eq!(TypedValue::Text("Alice".to_string()).to_string(), "Alice");
    }
}
