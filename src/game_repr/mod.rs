pub mod attacks;
mod position;
mod san;

pub use position::*;

// The rules engine itself comes from the `chess` crate
pub use chess::{BitBoard, Board, ChessMove, Color, Piece, Square, ALL_SQUARES};
