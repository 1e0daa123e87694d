//! Game rules for gomoku.
//!
//! Pure functions over a [`Board`](super::Board), kept apart from match
//! bookkeeping so they can be tested on hand-built positions.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{check_win, run_length};
