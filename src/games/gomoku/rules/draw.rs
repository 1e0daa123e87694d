//! Full-board detection for gomoku.

use super::super::{BOARD_SIZE, Board};
use tracing::instrument;

/// Checks if every intersection holds a stone.
///
/// A full board with no five-in-a-row ends the match as a draw.
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    board.stone_count() == BOARD_SIZE * BOARD_SIZE
}
