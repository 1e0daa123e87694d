//! SQLite persistence for matches and move ledgers.

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

mod error;
mod models;
mod repository;
mod schema;

pub use error::DbError;
pub use repository::MatchRepository;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
