// Move ordering on real positions

use crate::agent::ai::move_ordering::{order_captures, order_moves, HistoryTable, KillerMoves};
use crate::game_repr::{Position, Square};
use chess::ChessMove;

fn ordered(pos: &mut Position) -> Vec<ChessMove> {
    order_moves(pos, None, &KillerMoves::new(), &HistoryTable::new(), 0).to_vec()
}

#[test]
fn test_ordering_preserves_count() {
    let mut pos = Position::default();
    let regular = pos.legal_move_count();
    assert_eq!(ordered(&mut pos).len(), regular);
    assert_eq!(pos.stack_depth(), 0);
}

#[test]
fn test_queen_capture_first() {
    let mut pos = Position::from_fen("rnb1kbnr/pppppppp/8/8/4q3/2N5/PPPPPPPP/R1BQKBNR w KQkq - 0 1").unwrap();
    let moves = ordered(&mut pos);
    assert_eq!(moves[0], ChessMove::new(Square::C3, Square::E4, None));
}

#[test]
fn test_tt_move_beats_captures() {
    let mut pos = Position::from_fen("rnb1kbnr/pppppppp/8/8/4q3/2N5/PPPPPPPP/R1BQKBNR w KQkq - 0 1").unwrap();
    let quiet = ChessMove::new(Square::A2, Square::A3, None);
    let moves = order_moves(&mut pos, Some(quiet), &KillerMoves::new(), &HistoryTable::new(), 0);
    assert_eq!(moves[0], quiet);
}

#[test]
fn test_promotion_before_quiet_moves() {
    let mut pos = Position::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
    let moves = ordered(&mut pos);
    assert_eq!(moves[0].get_promotion(), Some(chess::Piece::Queen));
}

#[test]
fn test_repeating_move_ordered_after_fresh_moves() {
    let mut pos = Position::default();
    for san in ["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6"] {
        pos.push_san(san).unwrap();
    }
    // Ng1 would bring back a position seen twice already
    let back = ChessMove::new(Square::F3, Square::G1, None);
    let moves = ordered(&mut pos);
    let index = moves.iter().position(|&m| m == back).unwrap();
    assert_eq!(index, moves.len() - 1);
}

#[test]
fn test_killer_move_promoted() {
    let mut pos = Position::default();
    let killer = ChessMove::new(Square::H2, Square::H3, None);
    let mut killers = KillerMoves::new();
    killers.record(2, killer);
    let moves = order_moves(&mut pos, None, &killers, &HistoryTable::new(), 2);
    assert_eq!(moves[0], killer);
    // Killers are per ply
    assert_eq!(killers.get(3), [None, None]);
}

#[test]
fn test_captures_only_in_quiescence_order() {
    let pos = Position::from_fen("4k3/8/3p1q2/8/4N3/8/8/4K3 w - - 0 1").unwrap();
    let captures = order_captures(&pos);
    assert_eq!(captures.len(), 2);
    assert_eq!(captures[0], ChessMove::new(Square::E4, Square::F6, None));
    assert!(captures.iter().all(|&m| pos.is_capture(m)));
}
