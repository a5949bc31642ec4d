// ABOUTME: Terminal user interface for MSSQL Manager
// ABOUTME: App state and rendering on the main thread, database work on a tokio task

pub mod app;
pub mod draw;
pub mod input;
pub mod theme;
pub mod worker;

pub use app::App;
