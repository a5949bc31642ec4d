// ABOUTME: Database module exports for MSSQL Manager
// ABOUTME: Catalog queries, the tiberius connection, and the session that owns it

pub mod catalog;
pub mod session;
pub mod sqlserver;

pub use session::Session;
pub use sqlserver::{ConnectionTarget, SqlServerConnection};
