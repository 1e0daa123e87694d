//! Win detection for gomoku.
//!
//! Only the four lines through the last stone are scanned, so the cost of a
//! check is bounded by the board side and never by the number of stones.

use super::super::{Board, Cell, Position, Seat, WIN_LENGTH};
use tracing::instrument;

/// Unit steps for the vertical, horizontal, main-diagonal and anti-diagonal axes.
pub const AXES: [(i64, i64); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Length of the contiguous `seat` run through `pos` along `(dx, dy)`.
///
/// Counts `pos` itself plus matching stones in both directions, stopping at
/// the edge or at the first empty/opposing cell.
pub fn run_length(board: &Board, pos: Position, seat: Seat, (dx, dy): (i64, i64)) -> usize {
    if board.get(pos) != Cell::Occupied(seat) {
        return 0;
    }
    1 + ray(board, pos, seat, dx, dy) + ray(board, pos, seat, -dx, -dy)
}

fn ray(board: &Board, pos: Position, seat: Seat, dx: i64, dy: i64) -> usize {
    (1..)
        .map_while(|distance| pos.offset(dx, dy, distance))
        .take_while(|next| board.get(*next) == Cell::Occupied(seat))
        .count()
}

/// Checks whether the stone just placed at `pos` completes five in a row.
///
/// Overlines (six or more) also win. Stops at the first qualifying axis.
#[instrument(skip(board))]
pub fn check_win(board: &Board, pos: Position, seat: Seat) -> bool {
    AXES
        .iter()
        .any(|axis| run_length(board, pos, seat, *axis) >= WIN_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i64, y: i64) -> Position {
        Position::new(x, y).unwrap()
    }

    fn board_with(stones: &[(i64, i64)], seat: Seat) -> Board {
        let mut board = Board::new();
        for (x, y) in stones {
            board.place(pos(*x, *y), seat).unwrap();
        }
        board
    }

    #[test]
    fn test_single_stone_no_win() {
        let board = board_with(&[(7, 7)], Seat::A);
        assert!(!check_win(&board, pos(7, 7), Seat::A));
    }

    #[test]
    fn test_vertical_five() {
        let board = board_with(&[(7, 7), (7, 8), (7, 9), (7, 10), (7, 11)], Seat::A);
        assert!(check_win(&board, pos(7, 11), Seat::A));
    }

    #[test]
    fn test_horizontal_five_completed_in_middle() {
        let board = board_with(&[(3, 4), (4, 4), (5, 4), (6, 4), (7, 4)], Seat::B);
        assert!(check_win(&board, pos(5, 4), Seat::B));
    }

    #[test]
    fn test_main_diagonal_five() {
        let board = board_with(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)], Seat::A);
        assert!(check_win(&board, pos(0, 0), Seat::A));
    }

    #[test]
    fn test_anti_diagonal_five_at_edge() {
        let board = board_with(&[(14, 0), (13, 1), (12, 2), (11, 3), (10, 4)], Seat::A);
        assert!(check_win(&board, pos(12, 2), Seat::A));
    }

    #[test]
    fn test_four_is_not_enough() {
        let board = board_with(&[(7, 7), (8, 7), (9, 7), (10, 7)], Seat::A);
        assert!(!check_win(&board, pos(10, 7), Seat::A));
    }

    #[test]
    fn test_overline_wins() {
        let board = board_with(&[(2, 5), (3, 5), (4, 5), (5, 5), (6, 5), (7, 5)], Seat::A);
        assert!(check_win(&board, pos(4, 5), Seat::A));
        assert_eq!(run_length(&board, pos(4, 5), Seat::A, (1, 0)), 6);
    }

    #[test]
    fn test_opponent_stone_breaks_run() {
        let mut board = board_with(&[(0, 3), (1, 3), (3, 3), (4, 3)], Seat::A);
        board.place(pos(2, 3), Seat::B).unwrap();
        assert!(!check_win(&board, pos(4, 3), Seat::A));
        assert!(!check_win(&board, pos(2, 3), Seat::B));
    }

    #[test]
    fn test_gap_breaks_run() {
        let board = board_with(&[(0, 9), (1, 9), (2, 9), (4, 9), (5, 9)], Seat::A);
        assert!(!check_win(&board, pos(2, 9), Seat::A));
    }

    #[test]
    fn test_run_does_not_wrap_rows() {
        let board = board_with(&[(12, 0), (13, 0), (14, 0), (0, 1), (1, 1)], Seat::A);
        assert!(!check_win(&board, pos(14, 0), Seat::A));
    }
}
