// Attack queries built on the `chess` crate's precomputed tables.
//
// `chess::Board` only answers questions for the side to move; evaluation
// needs both colors, so these helpers work from raw bitboards.

use chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_pawn_quiets,
    get_rook_moves, BitBoard, Board, Color, Piece, Square, EMPTY,
};

/// All pieces of `color` attacking `sq`
pub fn attackers(board: &Board, color: Color, sq: Square) -> BitBoard {
    attackers_through(board, color, sq, *board.combined())
}

/// Attackers of `sq` with sliders blocked only by `occupied`
fn attackers_through(board: &Board, color: Color, sq: Square, occupied: BitBoard) -> BitBoard {
    let own = *board.color_combined(color);
    let diagonal = *board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen);
    let straight = *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);

    // A pawn of `color` attacks `sq` exactly when a pawn of the other color
    // standing on `sq` would attack it back.
    let pawns = get_pawn_attacks(sq, !color, *board.pieces(Piece::Pawn) & own);

    pawns
        | (get_knight_moves(sq) & *board.pieces(Piece::Knight) & own)
        | (get_king_moves(sq) & *board.pieces(Piece::King) & own)
        | (get_bishop_moves(sq, occupied) & diagonal & own)
        | (get_rook_moves(sq, occupied) & straight & own)
}

/// Squares the king of `color` could step to: not own-occupied and not attacked.
/// The king is lifted off the board first so a slider keeps covering the
/// squares behind it.
pub fn king_escape_squares(board: &Board, color: Color) -> u32 {
    let king = board.king_square(color);
    let own = *board.color_combined(color);
    let without_king = *board.combined() ^ BitBoard::from_square(king);
    (get_king_moves(king) & !own)
        .filter(|&sq| attackers_through(board, !color, sq, without_king) == EMPTY)
        .count() as u32
}

/// Pseudo-legal move count of `color`, computed even when `color` is not to move.
/// Pawn pushes, pawn captures and piece moves to empty or enemy squares.
pub fn pseudo_mobility(board: &Board, color: Color) -> u32 {
    let own = *board.color_combined(color);
    let enemy = *board.color_combined(!color);
    let occupied = *board.combined();
    let targets = !own;

    let mut count = 0;
    for sq in *board.pieces(Piece::Pawn) & own {
        count += (get_pawn_quiets(sq, color, occupied) | get_pawn_attacks(sq, color, enemy)).popcnt();
    }
    for sq in *board.pieces(Piece::Knight) & own {
        count += (get_knight_moves(sq) & targets).popcnt();
    }
    for sq in *board.pieces(Piece::Bishop) & own {
        count += (get_bishop_moves(sq, occupied) & targets).popcnt();
    }
    for sq in *board.pieces(Piece::Rook) & own {
        count += (get_rook_moves(sq, occupied) & targets).popcnt();
    }
    for sq in *board.pieces(Piece::Queen) & own {
        count += ((get_bishop_moves(sq, occupied) | get_rook_moves(sq, occupied)) & targets).popcnt();
    }
    count + (get_king_moves(board.king_square(color)) & targets).popcnt()
}
