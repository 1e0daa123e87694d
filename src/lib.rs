//! Strictly Gomoku - real-time gomoku match server
//!
//! Two players alternate placing stones on a 15x15 board until one of them
//! completes five in a row. Every accepted move is appended to a ledger,
//! persisted, and fanned out to all sockets watching the match.
//!
//! # Architecture
//!
//! - **Games**: board, win detection and the match state machine
//! - **Registry**: live player and spectator sockets per match
//! - **Coordinator**: per-match serialization of joins and moves
//! - **Store**: in-memory or SQLite persistence of matches and ledgers
//! - **Server**: REST and WebSocket surface over axum
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_gomoku::{
//!     Identity, MatchCoordinator, MemoryStore, SessionRegistry, TokenDirectory,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let directory = TokenDirectory::from_entries([
//!     ("tok-a".to_string(), Identity::new(1, "alice".to_string())),
//!     ("tok-b".to_string(), Identity::new(2, "bob".to_string())),
//! ]);
//! let coordinator = MatchCoordinator::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(directory),
//!     SessionRegistry::new(),
//! );
//!
//! let game = coordinator.create_match(1).await?;
//! coordinator.join_match(game.id(), 2).await?;
//! coordinator.submit_move(game.id(), 1, 7, 7).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod auth;
mod cli;
mod config;
mod coordinator;
mod db;
mod games;
mod protocol;
mod registry;
mod server;
mod snapshot;
mod store;

/// Player identifier issued by the identity collaborator.
pub type PlayerId = i64;

/// Match identifier allocated by the store.
pub type MatchId = i64;

// Crate-level exports - Identity
pub use auth::{AuthError, Identity, PlayerDirectory, TokenDirectory};

// Crate-level exports - Command line and configuration
pub use cli::{Cli, Command};
pub use config::{ConfigError, PlayerEntry, ServerConfig};

// Crate-level exports - Coordination
pub use coordinator::{CommittedMove, Connection, CoordinatorError, MatchCoordinator, Role};
pub use registry::{ConnectionId, SessionRegistry, SocketHandle};

// Crate-level exports - Persistence
pub use db::{DbError, MIGRATIONS, MatchRepository};
pub use store::{MatchStore, MemoryStore};

// Crate-level exports - Wire types
pub use protocol::{ClientMessage, EventKind, PlayerRef, ServerEvent, WireBoard};
pub use snapshot::{MatchDetail, MatchSnapshot, MoveView};

// Crate-level exports - Server
pub use server::{
    ApiError, AppState, CLOSE_MATCH_NOT_FOUND, CLOSE_UNAUTHENTICATED, router, serve,
};

// Crate-level exports - Game types (gomoku)
pub use games::gomoku::{
    AlternatingTurnInvariant, BOARD_SIZE, Board, Cell, GomokuInvariants, Invariant, InvariantSet,
    InvariantViolation, LedgerSequenceInvariant, Match, MatchStatus, MonotonicBoardInvariant,
    MoveError, MoveLedger, MoveOutcome, MoveRecord, Outcome, Phase, Position, Seat, WIN_LENGTH,
};

/// Win and draw detection.
pub mod rules {
    pub use crate::games::gomoku::rules::{check_win, is_full, run_length};
}
