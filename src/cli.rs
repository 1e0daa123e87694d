//! Command-line interface for strictly_gomoku.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Gomoku - real-time gomoku match server
#[derive(Parser, Debug)]
#[command(name = "strictly_gomoku")]
#[command(about = "Real-time gomoku match server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP and WebSocket match server
    Serve {
        /// Path to the server config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database path (overrides config; omit for in-memory matches)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Apply database migrations and exit
    Migrate {
        /// Path to the database file (created if it doesn't exist)
        #[arg(long, default_value = "strictly_gomoku.db")]
        db_path: String,
    },
}
