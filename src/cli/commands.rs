//! CLI command implementations
//!
//! `serve` wires config, pool, store and HTTP server together and blocks
//! until shutdown. `migrate` applies pending schema migrations and reports
//! the resulting version.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::data::{open_connection, schema, ConnectionPool, ListStore};
use crate::http_server::HttpServer;
use crate::observability::{Logger, MetricsRegistry};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(config.as_deref(), port),
        Command::Migrate { config } => migrate(config.as_deref()),
    }
}

/// Serve the HTTP API until ctrl-c
pub fn serve(config_path: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }
    Logger::set_min_severity(config.severity()?);

    let db_config = config.to_database_config();
    let db_path = db_config.path.display().to_string();
    let pool_size = db_config.pool_size.to_string();
    let pool = ConnectionPool::open(&db_config)?;
    Logger::info(
        "DATABASE_OPENED",
        &[("path", db_path.as_str()), ("pool_size", pool_size.as_str())],
    );

    let store = ListStore::new(pool)
        .with_metrics(Arc::new(MetricsRegistry::new()))
        .with_op_timeout(config.op_timeout());
    let server = HttpServer::new(config.to_http_config(), Arc::new(store));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Bring the schema up to date and print the resulting version
pub fn migrate(config_path: Option<&Path>) -> CliResult<()> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);

    let version = migrate_database(&config)?;
    write_response(json!({ "schema_version": version }))
}

/// Apply pending migrations to the configured database file
pub fn migrate_database(config: &Config) -> CliResult<u32> {
    let db_config = config.to_database_config();
    let mut conn = open_connection(&db_config)?;

    let applied = schema::migrate(&mut conn)?;
    let version = schema::current_version(&conn)?;

    let db_path = db_config.path.display().to_string();
    let applied_str = applied.to_string();
    let version_str = version.to_string();
    Logger::info(
        "SCHEMA_MIGRATED",
        &[
            ("applied", applied_str.as_str()),
            ("path", db_path.as_str()),
            ("version", version_str.as_str()),
        ],
    );

    Ok(version)
}
