//! Core domain types for gomoku.

use super::action::MoveError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Side length of the square board.
pub const BOARD_SIZE: usize = 15;

/// Contiguous stones needed to win.
pub const WIN_LENGTH: usize = 5;

/// Seat in a match. Seat A always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Seat {
    /// The creating player (moves first).
    A,
    /// The joining player.
    B,
}

impl Seat {
    /// Returns the other seat.
    pub fn opponent(self) -> Self {
        match self {
            Seat::A => Seat::B,
            Seat::B => Seat::A,
        }
    }

    /// Wire code used for this seat's stones (1 or 2).
    pub fn code(self) -> u8 {
        match self {
            Seat::A => 1,
            Seat::B => 2,
        }
    }
}

/// A single intersection on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Cell {
    /// No stone.
    #[default]
    Empty,
    /// Stone belonging to a seat.
    Occupied(Seat),
}

impl Cell {
    /// Wire code: 0 for empty, otherwise the seat code.
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Occupied(seat) => seat.code(),
        }
    }

    /// Parses a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Occupied(Seat::A)),
            2 => Some(Cell::Occupied(Seat::B)),
            _ => None,
        }
    }
}

/// An in-bounds board coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    x: usize,
    y: usize,
}

impl Position {
    /// Validates raw client coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::OutOfBounds`] when either coordinate falls outside `[0, 15)`.
    pub fn new(x: i64, y: i64) -> Result<Self, MoveError> {
        Self::checked(x, y).ok_or(MoveError::OutOfBounds { x, y })
    }

    /// Returns the position if `(x, y)` lies on the board.
    pub fn checked(x: i64, y: i64) -> Option<Self> {
        let size = BOARD_SIZE as i64;
        if (0..size).contains(&x) && (0..size).contains(&y) {
            Some(Self {
                x: x as usize,
                y: y as usize,
            })
        } else {
            None
        }
    }

    /// Column.
    pub fn x(&self) -> usize {
        self.x
    }

    /// Row.
    pub fn y(&self) -> usize {
        self.y
    }

    /// Steps `distance` cells along `(dx, dy)`, or `None` past the edge.
    pub fn offset(self, dx: i64, dy: i64, distance: i64) -> Option<Self> {
        Self::checked(self.x as i64 + dx * distance, self.y as i64 + dy * distance)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 15x15 gomoku board, indexed `[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Gets the cell at a position.
    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.y][pos.x]
    }

    /// Checks if a cell is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Cell::Empty
    }

    /// Places a stone. Cells go from empty to occupied exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::CellOccupied`] if the cell already holds a stone.
    #[instrument(skip(self))]
    pub fn place(&mut self, pos: Position, seat: Seat) -> Result<(), MoveError> {
        if !self.is_empty(pos) {
            return Err(MoveError::CellOccupied(pos));
        }
        self.cells[pos.y][pos.x] = Cell::Occupied(seat);
        Ok(())
    }

    /// Number of stones on the board.
    pub fn stone_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell != Cell::Empty)
            .count()
    }

    /// Rows of cells, top to bottom.
    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// Wire representation: rows of 0/1/2 codes.
    pub fn to_codes(&self) -> Vec<Vec<u8>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|cell| cell.code()).collect())
            .collect()
    }

    /// Rebuilds a board from its wire representation.
    ///
    /// Returns `None` if the grid is not 15x15 or holds an unknown code.
    pub fn from_codes(codes: &[Vec<u8>]) -> Option<Self> {
        if codes.len() != BOARD_SIZE {
            return None;
        }
        let mut board = Self::new();
        for (y, row) in codes.iter().enumerate() {
            if row.len() != BOARD_SIZE {
                return None;
            }
            for (x, code) in row.iter().enumerate() {
                board.cells[y][x] = Cell::from_code(*code)?;
            }
        }
        Some(board)
    }

    /// Formats the board as text, `.` for empty, `X`/`O` for seats A/B.
    pub fn display(&self) -> String {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Empty => '.',
                        Cell::Occupied(Seat::A) => 'X',
                        Cell::Occupied(Seat::B) => 'O',
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
