//! Real-time message protocol for a match channel.
//!
//! Inbound and outbound messages are JSON objects discriminated by `type`
//! with their payload under `data`. Outbound events also carry a
//! `timestamp`. Boards travel as 15 rows of 15 cell codes
//! (0 empty, 1 seat A, 2 seat B), indexed `board[y][x]`.

use crate::games::gomoku::{Board, Match, Outcome};
use crate::{Identity, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Wire form of a board.
pub type WireBoard = Vec<Vec<u8>>;

/// Message sent by a client over a match socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Place a stone at `[x, y]`.
    Move {
        /// Column and row.
        position: [i64; 2],
    },
    /// Free-form chat line.
    Chat {
        /// Chat text.
        message: String,
    },
}

impl ClientMessage {
    /// Parses one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for malformed or unknown messages.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Player reference inside `game_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
}

impl From<&Identity> for PlayerRef {
    fn from(identity: &Identity) -> Self {
        Self {
            id: *identity.id(),
            name: identity.name().clone(),
        }
    }
}

/// Event payloads broadcast to a match's sockets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    /// A seated player's socket connected.
    PlayerJoin {
        /// Player id.
        player_id: PlayerId,
        /// Display name.
        player_name: String,
    },
    /// A seated player's socket disconnected.
    PlayerLeave {
        /// Player id.
        player_id: PlayerId,
        /// Display name.
        player_name: String,
    },
    /// Full snapshot of a match in play.
    GameStart {
        /// Seat A.
        player1: PlayerRef,
        /// Seat B.
        player2: PlayerRef,
        /// Player due to move.
        first_turn: PlayerId,
        /// Current board.
        board: WireBoard,
    },
    /// An accepted, non-terminal move.
    GameMove {
        /// The mover.
        player_id: PlayerId,
        /// `[x, y]` of the stone.
        position: [usize; 2],
        /// Player due to move next.
        next_turn: PlayerId,
        /// Board after the move.
        board: WireBoard,
    },
    /// The match finished.
    GameEnd {
        /// Winner, or `null` for a draw.
        winner_id: Option<PlayerId>,
        /// `"win"` or `"draw"`.
        reason: String,
        /// Board after the deciding move.
        final_board: WireBoard,
    },
    /// Chat line relayed verbatim.
    ChatMessage {
        /// Sender id.
        sender_id: PlayerId,
        /// Sender display name.
        sender_name: String,
        /// Chat text.
        message: String,
    },
    /// Server-side fault reported to one socket.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
    },
}

/// Timestamped outbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEvent {
    /// Payload.
    #[serde(flatten)]
    pub kind: EventKind,
    /// When the event was produced.
    pub timestamp: DateTime<Utc>,
}

impl ServerEvent {
    /// Stamps an event with the current time.
    pub fn now(kind: EventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    /// `player_join` for a seated player.
    pub fn player_join(identity: &Identity) -> Self {
        Self::now(EventKind::PlayerJoin {
            player_id: *identity.id(),
            player_name: identity.name().clone(),
        })
    }

    /// `player_leave` for a seated player.
    pub fn player_leave(identity: &Identity) -> Self {
        Self::now(EventKind::PlayerLeave {
            player_id: *identity.id(),
            player_name: identity.name().clone(),
        })
    }

    /// `game_start` snapshot of a match in play.
    pub fn game_start(game: &Match, host: &Identity, guest: &Identity, first_turn: PlayerId) -> Self {
        Self::now(EventKind::GameStart {
            player1: host.into(),
            player2: guest.into(),
            first_turn,
            board: game.board().to_codes(),
        })
    }

    /// `game_move` after an accepted move.
    pub fn game_move(player_id: PlayerId, position: [usize; 2], next_turn: PlayerId, board: &Board) -> Self {
        Self::now(EventKind::GameMove {
            player_id,
            position,
            next_turn,
            board: board.to_codes(),
        })
    }

    /// `game_end` for a finished match.
    pub fn game_end(winner_id: Option<PlayerId>, outcome: Outcome, board: &Board) -> Self {
        Self::now(EventKind::GameEnd {
            winner_id,
            reason: outcome.reason().to_string(),
            final_board: board.to_codes(),
        })
    }

    /// `chat_message` from any participant.
    pub fn chat(sender: &Identity, message: String) -> Self {
        Self::now(EventKind::ChatMessage {
            sender_id: *sender.id(),
            sender_name: sender.name().clone(),
            message,
        })
    }

    /// `error` for a single socket.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::now(EventKind::Error {
            code: code.into(),
            message: message.into(),
        })
    }

    /// Serializes to the wire text frame.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
