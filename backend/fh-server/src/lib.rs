pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;

pub use bootstrap::{App, prepare_database, remember_me_settings};
pub use error::{Result, ServerError};
