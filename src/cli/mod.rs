//! CLI module for iidy
//!
//! Provides command-line interface for:
//! - serve: Open the database and serve the HTTP API
//! - migrate: Apply pending schema migrations

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{migrate, migrate_database, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
