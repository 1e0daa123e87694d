//! Strictly Gomoku - match server binary.

use anyhow::Result;
use clap::Parser;
use strictly_gomoku::{Cli, Command, MatchRepository, ServerConfig};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db_path,
        } => {
            let mut settings = match config {
                Some(path) => ServerConfig::from_file(path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                settings = settings.with_host(host);
            }
            if let Some(port) = port {
                settings = settings.with_port(port);
            }
            if db_path.is_some() {
                settings = settings.with_db_path(db_path);
            }
            run_server(settings).await
        }
        Command::Migrate { db_path } => run_migrate(db_path),
    }
}

/// Run the HTTP and WebSocket server
#[instrument(skip_all, fields(addr = %config.bind_addr()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    info!(players = config.players().len(), "Starting Strictly Gomoku server");
    strictly_gomoku::serve(config).await
}

/// Prepare a database file
#[instrument]
fn run_migrate(db_path: String) -> Result<()> {
    let repository = MatchRepository::new(db_path)?;
    repository.run_migrations()?;
    info!("Database ready");
    Ok(())
}
