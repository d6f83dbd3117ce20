// Piece-square tables for positional evaluation
// All values in centipawns (100 = 1 pawn)
// Tables are from White's perspective, index 0 = a1, index 63 = h8
// For Black pieces, mirror the square vertically (sq ^ 56)

use chess::{Color, Piece, Square};

// Pawn - advancement rewarded, center valued
pub const PAWN_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,  // Rank 1
    -5, -5, -5, -5, -5, -5, -5, -5,  // Rank 2 (start squares)
    -3,  0,  2,  5,  5,  2,  0, -3,  // Rank 3
     0,  3,  8, 15, 15,  8,  3,  0,  // Rank 4
     5,  8, 12, 20, 20, 12,  8,  5,  // Rank 5
    15, 20, 28, 35, 35, 28, 20, 15,  // Rank 6
    40, 45, 50, 50, 50, 50, 45, 40,  // Rank 7 (near promotion)
     0,  0,  0,  0,  0,  0,  0,  0,  // Rank 8
];

// Knight - strong in the center, heavily penalized on the rim
pub const KNIGHT_TABLE: [i32; 64] = [
    -80,-60,-40,-40,-40,-40,-60,-80,  // Rank 1
    -60,-30,  0,  5,  5,  0,-30,-60,  // Rank 2
    -40,  0, 15, 22, 22, 15,  0,-40,  // Rank 3
    -40,  5, 22, 30, 30, 22,  5,-40,  // Rank 4
    -40,  5, 22, 30, 30, 22,  5,-40,  // Rank 5
    -40,  0, 15, 22, 22, 15,  0,-40,  // Rank 6
    -60,-30,  0,  0,  0,  0,-30,-60,  // Rank 7
    -80,-60,-40,-40,-40,-40,-60,-80,  // Rank 8
];

// Bishop - long diagonals, avoid the edges
pub const BISHOP_TABLE: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,  // Rank 1
    -10,  8,  0,  0,  0,  0,  8,-10,  // Rank 2
    -10, 12, 12, 12, 12, 12, 12,-10,  // Rank 3
    -10,  0, 12, 14, 14, 12,  0,-10,  // Rank 4
    -10,  5,  8, 14, 14,  8,  5,-10,  // Rank 5
    -10,  0,  8, 10, 10,  8,  0,-10,  // Rank 6
    -10,  0,  0,  0,  0,  0,  0,-10,  // Rank 7
    -20,-10,-10,-10,-10,-10,-10,-20,  // Rank 8
];

// Rook - 7th rank bonus
pub const ROOK_TABLE: [i32; 64] = [
     0,  0,  0,  2,  2,  0,  0,  0,  // Rank 1
    -5,  0,  0,  0,  0,  0,  0, -5,  // Rank 2
    -5,  0,  0,  0,  0,  0,  0, -5,  // Rank 3
    -5,  0,  0,  0,  0,  0,  0, -5,  // Rank 4
    -5,  0,  0,  0,  0,  0,  0, -5,  // Rank 5
    -3,  0,  0,  0,  0,  0,  0, -3,  // Rank 6
    10, 15, 15, 15, 15, 15, 15, 10,  // Rank 7
     5,  5,  8, 10, 10,  8,  5,  5,  // Rank 8
];

// Queen - stay back early, central later
pub const QUEEN_TABLE: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,  // Rank 1
    -10,  0,  0,  0,  0,  0,  0,-10,  // Rank 2
    -10,  0,  5,  5,  5,  5,  0,-10,  // Rank 3
     -5,  0,  5,  8,  8,  5,  0, -5,  // Rank 4
     -5,  0,  5,  8,  8,  5,  0, -5,  // Rank 5
    -10,  0,  5,  5,  5,  5,  0,-10,  // Rank 6
    -10,  0,  0,  0,  0,  0,  0,-10,  // Rank 7
    -20,-10,-10, -5, -5,-10,-10,-20,  // Rank 8
];

// King middlegame - hide behind pawns, castling encouraged
pub const KING_MIDDLEGAME_TABLE: [i32; 64] = [
     20, 30, 10,  0,  0, 10, 30, 20,  // Rank 1
     20, 20,  0,  0,  0,  0, 20, 20,  // Rank 2
    -10,-20,-20,-20,-20,-20,-20,-10,  // Rank 3
    -20,-30,-30,-40,-40,-30,-30,-20,  // Rank 4
    -30,-40,-40,-50,-50,-40,-40,-30,  // Rank 5
    -30,-40,-40,-50,-50,-40,-40,-30,  // Rank 6
    -30,-40,-40,-50,-50,-40,-40,-30,  // Rank 7
    -30,-40,-40,-50,-50,-40,-40,-30,  // Rank 8
];

// Pawn endgame - advancement matters, capped well below mate scores
pub const PAWN_ENDGAME_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,  // Rank 1
     5,  5,  5,  5,  5,  5,  5,  5,  // Rank 2
     8,  8, 10, 12, 12, 10,  8,  8,  // Rank 3
    12, 14, 16, 20, 20, 16, 14, 12,  // Rank 4
    20, 22, 25, 28, 28, 25, 22, 20,  // Rank 5
    30, 33, 36, 40, 40, 36, 33, 30,  // Rank 6
    45, 48, 50, 52, 52, 50, 48, 45,  // Rank 7
     0,  0,  0,  0,  0,  0,  0,  0,  // Rank 8
];

// Rook endgame - central files and the 7th rank
pub const ROOK_ENDGAME_TABLE: [i32; 64] = [
     0,  0,  5,  8,  8,  5,  0,  0,  // Rank 1
     0,  5,  8, 10, 10,  8,  5,  0,  // Rank 2
     0,  5,  8, 10, 10,  8,  5,  0,  // Rank 3
     0,  5,  8, 10, 10,  8,  5,  0,  // Rank 4
     0,  5,  8, 10, 10,  8,  5,  0,  // Rank 5
     0,  5,  8, 10, 10,  8,  5,  0,  // Rank 6
    10, 15, 15, 15, 15, 15, 15, 10,  // Rank 7
     5,  8, 10, 12, 12, 10,  8,  5,  // Rank 8
];

// Queen endgame - active, centralized
pub const QUEEN_ENDGAME_TABLE: [i32; 64] = [
    -10, -5, -5, -5, -5, -5, -5,-10,  // Rank 1
     -5,  0,  5,  5,  5,  5,  0, -5,  // Rank 2
     -5,  5, 10, 10, 10, 10,  5, -5,  // Rank 3
     -5,  5, 10, 15, 15, 10,  5, -5,  // Rank 4
     -5,  5, 10, 15, 15, 10,  5, -5,  // Rank 5
     -5,  5, 10, 10, 10, 10,  5, -5,  // Rank 6
     -5,  0,  5,  5,  5,  5,  0, -5,  // Rank 7
    -10, -5, -5, -5, -5, -5, -5,-10,  // Rank 8
];

// King endgame - march to the center to support pawns
pub const KING_ENDGAME_TABLE: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,  // Rank 1
    -30,-20,-10,  0,  0,-10,-20,-30,  // Rank 2
    -30,-10, 20, 30, 30, 20,-10,-30,  // Rank 3
    -30,-10, 30, 40, 40, 30,-10,-30,  // Rank 4
    -30,-10, 30, 40, 40, 30,-10,-30,  // Rank 5
    -30,-10, 20, 30, 30, 20,-10,-30,  // Rank 6
    -30,-30,  0,  0,  0,  0,-30,-30,  // Rank 7
    -50,-30,-30,-30,-30,-30,-30,-50,  // Rank 8
];

/// Positional value of `piece` of `color` on `sq`.
///
/// Pawns, rooks, queens and kings switch tables in the endgame; knights and
/// bishops use one table throughout.
#[inline]
pub fn get_pst_value(piece: Piece, color: Color, sq: Square, is_endgame: bool) -> i32 {
    let index = match color {
        Color::White => sq.to_index(),
        Color::Black => sq.to_index() ^ 56,
    };

    let table = match (piece, is_endgame) {
        (Piece::Pawn, false) => &PAWN_TABLE,
        (Piece::Pawn, true) => &PAWN_ENDGAME_TABLE,
        (Piece::Knight, _) => &KNIGHT_TABLE,
        (Piece::Bishop, _) => &BISHOP_TABLE,
        (Piece::Rook, false) => &ROOK_TABLE,
        (Piece::Rook, true) => &ROOK_ENDGAME_TABLE,
        (Piece::Queen, false) => &QUEEN_TABLE,
        (Piece::Queen, true) => &QUEEN_ENDGAME_TABLE,
        (Piece::King, false) => &KING_MIDDLEGAME_TABLE,
        (Piece::King, true) => &KING_ENDGAME_TABLE,
    };

    table[index]
}
