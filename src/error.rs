// ABOUTME: Error taxonomy for user actions in MSSQL Manager
// ABOUTME: Every failed action resolves to one of these before it reaches the UI

use thiserror::Error;

use crate::db::sqlserver::SqlServerError;
use crate::forms::{ConversionError, FormError};
use crate::sql::ValidationError;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Please connect to database first")]
    NotConnected,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Driver(#[from] SqlServerError),
}

impl From<FormError> for ActionError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::Conversion(e) => ActionError::Conversion(e),
            FormError::Validation(e) => ActionError::Validation(e),
        }
    }
}

impl From<tiberius::error::Error> for ActionError {
    fn from(e: tiberius::error::Error) -> Self {
        ActionError::Driver(SqlServerError::from(e))
    }
}

pub type ActionResult<T> = Result<T, ActionError>;
