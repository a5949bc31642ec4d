// ABOUTME: Command module exports
// ABOUTME: One function per user action, each returning an ActionResponse

pub mod connection;
pub mod insert;
pub mod settings;
pub mod tables;
pub mod view;

pub use connection::*;
pub use insert::*;
pub use settings::*;
pub use tables::*;
pub use view::*;
