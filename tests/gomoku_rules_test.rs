//! Tests for gomoku win detection against a brute-force scan.

use strictly_gomoku::rules::{check_win, is_full, run_length};
use strictly_gomoku::{BOARD_SIZE, Board, Cell, Position, Seat, WIN_LENGTH};

/// Scans all windows of five through `pos` on every axis.
fn brute_force_win(board: &Board, pos: Position, seat: Seat) -> bool {
    let axes = [(0i64, 1i64), (1, 0), (1, 1), (1, -1)];
    let (px, py) = (pos.x() as i64, pos.y() as i64);
    axes.iter().any(|&(dx, dy)| {
        (0..WIN_LENGTH as i64).any(|back| {
            (0..WIN_LENGTH as i64).all(|i| {
                let k = i - back;
                Position::checked(px + dx * k, py + dy * k)
                    .is_some_and(|p| board.get(p) == Cell::Occupied(seat))
            })
        })
    })
}

/// Small xorshift so board fills are reproducible without extra crates.
struct Xorshift(u64);

impl Xorshift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

#[test]
fn test_check_win_matches_brute_force_on_dense_boards() {
    let mut rng = Xorshift(0x9e37_79b9_7f4a_7c15);
    for _ in 0..200 {
        let mut board = Board::new();
        for y in 0..BOARD_SIZE as i64 {
            for x in 0..BOARD_SIZE as i64 {
                let seat = match rng.next() % 3 {
                    0 => continue,
                    1 => Seat::A,
                    _ => Seat::B,
                };
                board.place(Position::new(x, y).unwrap(), seat).unwrap();
            }
        }
        for y in 0..BOARD_SIZE as i64 {
            for x in 0..BOARD_SIZE as i64 {
                let pos = Position::new(x, y).unwrap();
                if let Cell::Occupied(seat) = board.get(pos) {
                    assert_eq!(
                        check_win(&board, pos, seat),
                        brute_force_win(&board, pos, seat),
                        "Mismatch at {} on\n{}",
                        pos,
                        board.display()
                    );
                }
            }
        }
    }
}

#[test]
fn test_anti_diagonal_run_through_middle() {
    let mut board = Board::new();
    for (x, y) in [(10, 2), (9, 3), (7, 5), (6, 6)] {
        board.place(Position::new(x, y).unwrap(), Seat::B).unwrap();
    }
    let last = Position::new(8, 4).unwrap();
    board.place(last, Seat::B).unwrap();
    assert_eq!(run_length(&board, last, Seat::B, (1, -1)), 5);
    assert!(check_win(&board, last, Seat::B));
}

#[test]
fn test_four_is_not_enough() {
    let mut board = Board::new();
    for x in 0..4 {
        board.place(Position::new(x, 14).unwrap(), Seat::A).unwrap();
    }
    assert!(!check_win(&board, Position::new(3, 14).unwrap(), Seat::A));
}

#[test]
fn test_full_board_detection() {
    let mut board = Board::new();
    for y in 0..BOARD_SIZE as i64 {
        for x in 0..BOARD_SIZE as i64 {
            assert!(!is_full(&board));
            let seat = if (x + y) % 2 == 0 { Seat::A } else { Seat::B };
            board.place(Position::new(x, y).unwrap(), seat).unwrap();
        }
    }
    assert!(is_full(&board));
    assert_eq!(board.stone_count(), BOARD_SIZE * BOARD_SIZE);
}

#[test]
fn test_wire_codes_round_trip_board() {
    let mut board = Board::new();
    board.place(Position::new(3, 1).unwrap(), Seat::A).unwrap();
    board.place(Position::new(0, 14).unwrap(), Seat::B).unwrap();

    let codes = board.to_codes();
    assert_eq!(codes[1][3], 1);
    assert_eq!(codes[14][0], 2);
    assert_eq!(Board::from_codes(&codes), Some(board));
    assert_eq!(Board::from_codes(&codes[..14]), None);
}
