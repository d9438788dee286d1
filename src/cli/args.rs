//! CLI argument definitions using clap
//!
//! Commands:
//! - iidy serve [--config <path>] [--port <n>]
//! - iidy migrate [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// iidy - durable attempt lists over HTTP
#[derive(Parser, Debug)]
#[command(name = "iidy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on, overrides the configuration
        #[arg(long)]
        port: Option<u16>,
    },

    /// Bring the database schema up to date and exit
    Migrate {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
