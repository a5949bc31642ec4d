// ABOUTME: Schema-driven insert forms for MSSQL Manager
// ABOUTME: Maps catalog column types to input widgets and entered values to typed parameters

use thiserror::Error;

use crate::models::{ColumnDescriptor, QueryParameter, TypedValue};
use crate::sql::{InsertStatement, ValidationError};

/// Input representation chosen for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Text,
    Number,
    Decimal,
    Boolean,
    DateTimeText,
}

impl WidgetKind {
    /// Pick the widget for a catalog type name such as `int` or `VARCHAR(50)`
    pub fn for_sql_type(sql_type: &str) -> Self {
        let base = sql_type.split('(').next().unwrap_or("").trim();
        match base.to_ascii_lowercase().as_str() {
            "int" | "bigint" | "smallint" | "tinyint" => WidgetKind::Number,
            "decimal" | "numeric" | "float" | "real" => WidgetKind::Decimal,
            "bit" => WidgetKind::Boolean,
            "datetime" => WidgetKind::DateTimeText,
            _ => WidgetKind::Text,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionErrorKind {
    #[error("not a whole number")]
    InvalidNumber,
    #[error("not a decimal number")]
    InvalidDecimal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for column {column}: {kind}")]
pub struct ConversionError {
    pub column: String,
    pub kind: ConversionErrorKind,
}

/// The value held by a form widget; the variant is fixed when the form is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text(String),
    Number(String),
    Decimal(String),
    Boolean(bool),
    DateTimeText(String),
}

impl FieldInput {
    pub fn empty(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Text => FieldInput::Text(String::new()),
            WidgetKind::Number => FieldInput::Number(String::new()),
            WidgetKind::Decimal => FieldInput::Decimal(String::new()),
            WidgetKind::Boolean => FieldInput::Boolean(false),
            WidgetKind::DateTimeText => FieldInput::DateTimeText(String::new()),
        }
    }

    pub fn kind(&self) -> WidgetKind {
        match self {
            FieldInput::Text(_) => WidgetKind::Text,
            FieldInput::Number(_) => WidgetKind::Number,
            FieldInput::Decimal(_) => WidgetKind::Decimal,
            FieldInput::Boolean(_) => WidgetKind::Boolean,
            FieldInput::DateTimeText(_) => WidgetKind::DateTimeText,
        }
    }

    /// Editable text, `None` for checkboxes
    pub fn text(&self) -> Option<&str> {
        match self {
            FieldInput::Text(s)
            | FieldInput::Number(s)
            | FieldInput::Decimal(s)
            | FieldInput::DateTimeText(s) => Some(s),
            FieldInput::Boolean(_) => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            FieldInput::Text(s)
            | FieldInput::Number(s)
            | FieldInput::Decimal(s)
            | FieldInput::DateTimeText(s) => Some(s),
            FieldInput::Boolean(_) => None,
        }
    }

    pub fn toggle(&mut self) {
        if let FieldInput::Boolean(checked) = self {
            *checked = !*checked;
        }
    }

    /// Convert to a bound value. `Ok(None)` means the column is left out of the statement.
    pub fn convert(&self) -> Result<Option<TypedValue>, ConversionErrorKind> {
        if let FieldInput::Boolean(checked) = self {
            return Ok(Some(TypedValue::Int(i64::from(*checked))));
        }

        let raw = self.text().unwrap_or("").trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let value = match self {
            FieldInput::Number(_) => raw
                .parse::<i64>()
                .map(TypedValue::Int)
                .map_err(|_| ConversionErrorKind::InvalidNumber)?,
            FieldInput::Decimal(_) => {
                let v = raw
                    .parse::<f64>()
                    .map_err(|_| ConversionErrorKind::InvalidDecimal)?;
                if !v.is_finite() {
                    return Err(ConversionErrorKind::InvalidDecimal);
                }
                TypedValue::Float(v)
            }
            // Malformed datetimes are rejected by the server
            _ => TypedValue::Text(raw.to_string()),
        };
        Ok(Some(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub column: ColumnDescriptor,
    pub input: FieldInput,
}

impl FormField {
    pub fn new(column: ColumnDescriptor) -> Self {
        let input = FieldInput::empty(WidgetKind::for_sql_type(&column.sql_type));
        Self { column, input }
    }

    pub fn kind(&self) -> WidgetKind {
        self.input.kind()
    }

    pub fn to_parameter(&self) -> Result<Option<QueryParameter>, ConversionError> {
        let value = self.input.convert().map_err(|kind| ConversionError {
            column: self.column.name.clone(),
            kind,
        })?;
        Ok(value.map(|value| QueryParameter {
            column_name: self.column.name.clone(),
            value,
        }))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Insert form for one table: one field per catalog column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertForm {
    pub table: String,
    pub fields: Vec<FormField>,
}

impl InsertForm {
    pub fn new(table: &str, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            table: table.to_string(),
            fields: columns.into_iter().map(FormField::new).collect(),
        }
    }

    /// Convert every field; any failure rejects the whole submission
    pub fn parameters(&self) -> Result<Vec<QueryParameter>, ConversionError> {
        let mut params = Vec::new();
        for field in &self.fields {
            if let Some(p) = field.to_parameter()? {
                params.push(p);
            }
        }
        Ok(params)
    }

    pub fn submit(&self) -> Result<InsertStatement, FormError> {
        let params = self.parameters()?;
        Ok(InsertStatement::new(&self.table, params)?)
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.input = FieldInput::empty(field.kind());
        }
    }
}
