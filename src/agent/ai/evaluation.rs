// Position evaluation function
// Returns score in centipawns (positive = good for side to move)
//
// Every positional term is computed from White's point of view and the sum is
// negated when Black is to move. Terms split by game phase:
// - always: material, piece-square tables, rook files, bishop pair,
//   pawn structure, mobility
// - middlegame: development, castling, center control, king pawn shield
// - endgame: mating drive and the anti-stalemate guard

use chess::{get_file, BitBoard, ChessMove, Color, File, Piece, Square, EMPTY};
use rand::Rng;
use smallvec::SmallVec;

use super::piece_square_tables::get_pst_value;
use super::zobrist;
use crate::game_repr::{attacks, Position};

// Material values in centipawns
pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;

/// Base of a checkmate score; the depth bonus is added on top so that
/// shallower mates are more extreme.
pub const MATE_SCORE: i32 = 99_000;

/// Scores beyond this magnitude are mate scores
pub const MATE_THRESHOLD: i32 = 90_000;

/// Deepest ply below the root at which mates are still told apart
pub const MATE_HORIZON: i32 = 256;

/// Material edge at which the endgame mating drive switches on
const DECISIVE_MATERIAL: i32 = 500;

const ANTI_STALEMATE_PENALTY: i32 = 300;

const BISHOP_PAIR_BONUS: i32 = 30;
const ROOK_OPEN_FILE: i32 = 25;
const ROOK_SEMI_OPEN_FILE: i32 = 12;

const DOUBLED_PAWN_PENALTY: i32 = 20;
const ISOLATED_PAWN_PENALTY: i32 = 15;
const PASSED_PAWN_BASE: i32 = 20;
const PASSED_PAWN_PER_RANK: i32 = 8;
const BACKWARD_PAWN_PENALTY: i32 = 25;

const UNDEVELOPED_MINOR_PENALTY: i32 = 12;
const DOUBLE_MOVE_PENALTY: i32 = 18;
const EARLY_QUEEN_PENALTY: i32 = 12;
const KNIGHT_DEVELOPED_BONUS: i32 = 8;
const BISHOP_DEVELOPED_BONUS: i32 = 6;

const CASTLED_BONUS: i32 = 60;
const LOST_CASTLING_PENALTY: i32 = 50;
const UNCASTLED_PENALTY: i32 = 10;

const SHIELD_NEAR: i32 = 20;
const SHIELD_FAR: i32 = 10;

/// Get material value for a piece type (kings are not counted)
#[inline]
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 0,
    }
}

/// Is `score` a forced-mate score (for either side)?
#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

/// Depth bonus for a position `ply` plies below the search root.
///
/// Counting from the root rather than from the remaining depth keeps a mate
/// score identical across iterations and transposition table hits.
#[inline]
pub fn mate_bonus(ply: usize) -> i32 {
    (MATE_HORIZON - ply as i32).max(0)
}

/// Plies from the root to the checkmate encoded in `score`
#[inline]
pub fn mate_distance(score: i32) -> Option<i32> {
    if is_mate_score(score) {
        Some(MATE_SCORE + MATE_HORIZON - score.abs())
    } else {
        None
    }
}

#[inline]
fn sign(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

#[inline]
fn count(pos: &Position, piece: Piece, color: Color) -> i32 {
    pos.pieces(piece, color).popcnt() as i32
}

#[inline]
fn rank_of(sq: Square) -> i32 {
    sq.get_rank().to_index() as i32
}

#[inline]
fn file_of(sq: Square) -> i32 {
    sq.get_file().to_index() as i32
}

#[inline]
fn square_at(rank: i32, file: i32) -> Option<Square> {
    if (0..8).contains(&rank) && (0..8).contains(&file) {
        Some(Square::make_square(
            chess::Rank::from_index(rank as usize),
            File::from_index(file as usize),
        ))
    } else {
        None
    }
}

/// Material balance, White minus Black
pub fn material(pos: &Position) -> i32 {
    [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
        .into_iter()
        .map(|piece| piece_value(piece) * (count(pos, piece, Color::White) - count(pos, piece, Color::Black)))
        .sum()
}

/// Material balance from `color`'s point of view
#[inline]
pub fn material_for(pos: &Position, color: Color) -> i32 {
    material(pos) * sign(color)
}

/// No queens left, or both queens still on but each side has at most one minor
pub fn is_endgame(pos: &Position) -> bool {
    let queens = count(pos, Piece::Queen, Color::White) + count(pos, Piece::Queen, Color::Black);
    let minors = |color| count(pos, Piece::Knight, color) + count(pos, Piece::Bishop, color);
    queens == 0 || (queens == 2 && minors(Color::White) <= 1 && minors(Color::Black) <= 1)
}

/// Static evaluation from the side to move's point of view.
///
/// `depth_bonus` only matters for checkmated positions, where a larger bonus
/// (a mate nearer the root, see [`mate_bonus`]) scores more extreme.
pub fn evaluate(pos: &Position, depth_bonus: i32) -> i32 {
    score_position(pos, depth_bonus).0
}

/// Facts several terms need, gathered with a single legal move generation
struct BoardState {
    moves: SmallVec<[ChessMove; 64]>,
    in_check: bool,
}

impl BoardState {
    fn of(pos: &Position) -> Self {
        Self {
            moves: pos.legal_moves(),
            in_check: pos.is_check(),
        }
    }

    fn is_checkmate(&self) -> bool {
        self.moves.is_empty() && self.in_check
    }

    fn is_dead_draw(&self, pos: &Position) -> bool {
        (self.moves.is_empty() && !self.in_check)
            || pos.is_insufficient_material()
            || pos.is_seventyfive_moves()
    }
}

/// Side-to-move score and whether the position is terminal
fn score_position(pos: &Position, depth_bonus: i32) -> (i32, bool) {
    let state = BoardState::of(pos);
    if state.is_checkmate() {
        return (-(MATE_SCORE + depth_bonus), true);
    }
    if state.is_dead_draw(pos) {
        return (0, true);
    }

    let score = white_relative_score(pos, &state);
    (score * sign(pos.side_to_move()), false)
}

/// Sum of all positional terms, positive = good for White
fn white_relative_score(pos: &Position, state: &BoardState) -> i32 {
    let endgame = is_endgame(pos);
    let mat = material(pos);

    let mut score = mat;
    score += piece_square_score(pos, endgame);

    if endgame {
        score += anti_stalemate_score(pos, state, mat);
        score += mating_drive_score(pos, mat);
    } else {
        score += development_score(pos);
        score += castling_score(pos);
        score += center_control_score(pos);
        score += king_shield_score(pos);
    }

    score += rook_file_score(pos);
    score += bishop_pair_score(pos);
    score += pawn_structure_score(pos);
    score += mobility_score(pos);
    score
}

fn piece_square_score(pos: &Position, endgame: bool) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        for piece in chess::ALL_PIECES {
            for sq in pos.pieces(piece, color) {
                score += sign(color) * get_pst_value(piece, color, sq, endgame);
            }
        }
    }
    score
}

/// Penalize undeveloped minors, shuffling the same minor twice and an early
/// queen sortie. Fades out linearly over the first 40 plies.
fn development_score(pos: &Position) -> i32 {
    let ply = pos.ply() as i32;
    if ply > 40 {
        return 0;
    }
    let weight = (1.0 - ply as f64 / 40.0).max(0.0);

    const WHITE_MINORS: [(Square, Piece); 4] = [
        (Square::B1, Piece::Knight),
        (Square::G1, Piece::Knight),
        (Square::C1, Piece::Bishop),
        (Square::F1, Piece::Bishop),
    ];
    const BLACK_MINORS: [(Square, Piece); 4] = [
        (Square::B8, Piece::Knight),
        (Square::G8, Piece::Knight),
        (Square::C8, Piece::Bishop),
        (Square::F8, Piece::Bishop),
    ];

    let mut score = 0;
    for (color, homes, queen_home, back_rank) in [
        (Color::White, WHITE_MINORS, Square::D1, 0),
        (Color::Black, BLACK_MINORS, Square::D8, 7),
    ] {
        let undeveloped = homes
            .iter()
            .filter(|(sq, piece)| pos.piece_at(*sq) == Some((*piece, color)))
            .count() as i32;
        let mut side = -UNDEVELOPED_MINOR_PENALTY * undeveloped;

        if ply >= 4 && undeveloped >= 1 {
            side -= DOUBLE_MOVE_PENALTY * double_minor_moves(pos, color);
        }

        if ply < 12 && undeveloped >= 2 {
            let queen_left_home = pos
                .pieces(Piece::Queen, color)
                .into_iter()
                .next()
                .is_some_and(|sq| sq != queen_home);
            if queen_left_home {
                side -= EARLY_QUEEN_PENALTY * undeveloped;
            }
        }

        for sq in pos.pieces(Piece::Knight, color) {
            if rank_of(sq) != back_rank {
                side += KNIGHT_DEVELOPED_BONUS;
            }
        }
        for sq in pos.pieces(Piece::Bishop, color) {
            if rank_of(sq) != back_rank {
                side += BISHOP_DEVELOPED_BONUS;
            }
        }

        score += sign(color) * side;
    }

    (score as f64 * weight) as i32
}

/// Consecutive own moves where a minor piece moved again straight away
fn double_minor_moves(pos: &Position, color: Color) -> i32 {
    let own: Vec<_> = pos.played_moves().filter(|played| played.color == color).collect();
    own.windows(2)
        .filter(|pair| {
            pair[1].mv.get_source() == pair[0].mv.get_dest()
                && matches!(pair[1].piece, Piece::Knight | Piece::Bishop)
        })
        .count() as i32
}

fn castling_score(pos: &Position) -> i32 {
    let mut score = 0;
    for (color, home, kingside, queenside) in [
        (Color::White, Square::E1, Square::G1, Square::C1),
        (Color::Black, Square::E8, Square::G8, Square::C8),
    ] {
        let king = pos.king_square(color);
        let castled = (king == kingside && !pos.has_kingside_castling_rights(color))
            || (king == queenside && !pos.has_queenside_castling_rights(color));
        let can_castle = pos.has_castling_rights(color);

        let side = if castled {
            CASTLED_BONUS
        } else if !can_castle && king != kingside && king != queenside {
            -LOST_CASTLING_PENALTY
        } else if can_castle && king == home {
            -UNCASTLED_PENALTY
        } else {
            0
        };
        score += sign(color) * side;
    }
    score
}

/// Occupation and exclusive control of the center. Fades out over 60 plies.
fn center_control_score(pos: &Position) -> i32 {
    let ply = pos.ply() as i32;
    if ply > 60 {
        return 0;
    }
    let weight = (1.0 - ply as f64 / 60.0).max(0.0);

    const STRICT: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];
    const EXTENDED: [Square; 12] = [
        Square::C3, Square::D3, Square::E3, Square::F3,
        Square::C4, Square::F4, Square::C5, Square::F5,
        Square::C6, Square::D6, Square::E6, Square::F6,
    ];

    let mut score = 0;
    for (squares, pawn_bonus, piece_bonus, control_bonus) in
        [(&STRICT[..], 30, 15, 10), (&EXTENDED[..], 12, 6, 3)]
    {
        for &sq in squares {
            if let Some((piece, color)) = pos.piece_at(sq) {
                let value = if piece == Piece::Pawn { pawn_bonus } else { piece_bonus };
                score += sign(color) * value;
            }
            let white = pos.is_attacked_by(Color::White, sq);
            let black = pos.is_attacked_by(Color::Black, sq);
            if white && !black {
                score += control_bonus;
            } else if black && !white {
                score -= control_bonus;
            }
        }
    }

    (score as f64 * weight) as i32
}

/// Own pawns on the two ranks in front of the king
fn king_shield_score(pos: &Position) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let king = pos.king_square(color);
        let forward = sign(color);
        let pawns = pos.pieces(Piece::Pawn, color);
        let mut side = 0;
        for (distance, bonus) in [(1, SHIELD_NEAR), (2, SHIELD_FAR)] {
            for df in -1..=1 {
                if let Some(sq) = square_at(rank_of(king) + forward * distance, file_of(king) + df) {
                    if pawns & BitBoard::from_square(sq) != EMPTY {
                        side += bonus;
                    }
                }
            }
        }
        score += sign(color) * side;
    }
    score
}

fn rook_file_score(pos: &Position) -> i32 {
    let white_pawns = pos.pieces(Piece::Pawn, Color::White);
    let black_pawns = pos.pieces(Piece::Pawn, Color::Black);
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let (own, enemy) = match color {
            Color::White => (white_pawns, black_pawns),
            Color::Black => (black_pawns, white_pawns),
        };
        for sq in pos.pieces(Piece::Rook, color) {
            let file = get_file(sq.get_file());
            if own & file == EMPTY {
                let bonus = if enemy & file == EMPTY { ROOK_OPEN_FILE } else { ROOK_SEMI_OPEN_FILE };
                score += sign(color) * bonus;
            }
        }
    }
    score
}

fn bishop_pair_score(pos: &Position) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        if count(pos, Piece::Bishop, color) >= 2 {
            score += sign(color) * BISHOP_PAIR_BONUS;
        }
    }
    score
}

/// Doubled, isolated, passed and backward pawns
fn pawn_structure_score(pos: &Position) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let own = pos.pieces(Piece::Pawn, color);
        let enemy = pos.pieces(Piece::Pawn, !color);
        let forward = sign(color);

        let mut per_file = [0i32; 8];
        for sq in own {
            per_file[file_of(sq) as usize] += 1;
        }
        let has_file = |f: i32| (0..8).contains(&f) && per_file[f as usize] > 0;

        let mut side = 0;
        for (file, &n) in per_file.iter().enumerate() {
            if n > 1 {
                side -= DOUBLED_PAWN_PENALTY * (n - 1);
            }
            let file = file as i32;
            if n > 0 && !has_file(file - 1) && !has_file(file + 1) {
                side -= ISOLATED_PAWN_PENALTY;
            }
        }

        for sq in own {
            let rank = rank_of(sq);
            let file = file_of(sq);
            // Ranks ahead of this pawn, from its owner's point of view
            let ahead = |r: i32| (r - rank) * forward > 0;

            let blocked = enemy
                .into_iter()
                .any(|e| (file_of(e) - file).abs() <= 1 && ahead(rank_of(e)));
            if !blocked {
                let advance = if color == Color::White { rank } else { 7 - rank };
                side += PASSED_PAWN_BASE + PASSED_PAWN_PER_RANK * advance;
            }

            // No neighbour pawn level with or behind it, and the square in
            // front is covered by an enemy pawn
            let supportable = own
                .into_iter()
                .any(|o| (file_of(o) - file).abs() == 1 && !ahead(rank_of(o)));
            if !supportable {
                let stop_rank = rank + forward;
                let guarded = [file - 1, file + 1].into_iter().any(|f| {
                    square_at(stop_rank + forward, f)
                        .is_some_and(|s| enemy & BitBoard::from_square(s) != EMPTY)
                });
                if (0..8).contains(&stop_rank) && guarded {
                    side -= BACKWARD_PAWN_PENALTY;
                }
            }
        }

        score += sign(color) * side;
    }
    score
}

fn mobility_score(pos: &Position) -> i32 {
    pos.pseudo_mobility(Color::White) as i32 - pos.pseudo_mobility(Color::Black) as i32
}

/// The side to move is losing, not in check, and can only shuffle its king
/// with one or two moves: steer the winning side away from stalemate.
fn anti_stalemate_score(pos: &Position, state: &BoardState, mat: i32) -> i32 {
    let to_move = pos.side_to_move();
    if mat * sign(to_move) > -DECISIVE_MATERIAL || state.in_check {
        return 0;
    }
    let moves = &state.moves;
    if moves.is_empty() || moves.len() > 2 {
        return 0;
    }
    let king = pos.king_square(to_move);
    if moves.iter().all(|mv| mv.get_source() == king) {
        // The trapping side is the opponent of the side to move
        -sign(!to_move) * ANTI_STALEMATE_PENALTY
    } else {
        0
    }
}

/// Drive the losing king to a corner and bring the winning king closer
fn mating_drive_score(pos: &Position, mat: i32) -> i32 {
    let winner = if mat >= DECISIVE_MATERIAL {
        Color::White
    } else if mat <= -DECISIVE_MATERIAL {
        Color::Black
    } else {
        return 0;
    };
    let loser = !winner;

    let loser_king = pos.king_square(loser);
    let winner_king = pos.king_square(winner);

    let corner = |sq: Square| {
        let (r, f) = (rank_of(sq), file_of(sq));
        r.min(7 - r) + f.min(7 - f)
    };
    let king_distance = (rank_of(winner_king) - rank_of(loser_king))
        .abs()
        .max((file_of(winner_king) - file_of(loser_king)).abs());
    let escapes = attacks::king_escape_squares(pos.board(), loser) as i32;

    let drive = (14 - corner(loser_king)) * 20 + (7 - king_distance) * 15 + (8 - escapes) * 10;
    sign(winner) * drive
}

/// Source of learned position values for the evaluation blend
pub trait LearnedValues {
    /// Learned value for `hash`, from the side to move's point of view.
    /// Must not refresh any recency bookkeeping.
    fn learned_value(&self, hash: u64) -> Option<f64>;

    /// Weight of the learned value in `[0, 1]`
    fn blend_weight(&self) -> f64;
}

/// Static evaluation plus the optional learned blend and training noise
pub struct Evaluator<'a> {
    learned: Option<&'a dyn LearnedValues>,
    noise: i32,
}

impl<'a> Evaluator<'a> {
    pub fn new(learned: Option<&'a dyn LearnedValues>, noise: i32) -> Self {
        Self {
            learned,
            noise: noise.max(0),
        }
    }

    /// Plain static evaluation, no blend and no noise
    pub fn plain() -> Self {
        Self::new(None, 0)
    }

    /// Side-to-move relative score of `pos`
    pub fn evaluate(&self, pos: &Position, depth_bonus: i32) -> i32 {
        let (mut score, terminal) = score_position(pos, depth_bonus);
        if terminal {
            return score;
        }

        if let Some(learned) = self.learned {
            let weight = learned.blend_weight();
            if weight > 0.0 {
                if let Some(value) = learned.learned_value(zobrist::hash(pos)) {
                    score = (score as f64 * (1.0 - weight) + value * weight).round() as i32;
                }
            }
        }

        if self.noise > 0 {
            score += rand::thread_rng().gen_range(-self.noise..=self.noise);
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn test_material_counts() {
        assert_eq!(material(&Position::default()), 0);
        let p = pos("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(material(&p), QUEEN_VALUE);
        assert_eq!(material_for(&p, Color::Black), -QUEEN_VALUE);
    }

    #[test]
    fn test_endgame_detection() {
        assert!(!is_endgame(&Position::default()));
        assert!(is_endgame(&pos("4k3/pppp4/8/8/8/8/PPPP4/R3K3 w - - 0 1")));
        // Both queens, one minor each
        assert!(is_endgame(&pos("3qk1n1/8/8/8/8/8/8/3QK1N1 w - - 0 1")));
        assert!(!is_endgame(&pos("3qk1n1/8/8/8/8/8/8/2BQK1N1 w - - 0 1")));
    }

    #[test]
    fn test_rook_file_bonus() {
        // Open file for White's rook, Black's rook sits behind its own pawn
        let p = pos("r3k3/p7/8/8/8/8/8/4K2R w - - 0 1");
        assert_eq!(rook_file_score(&p), ROOK_OPEN_FILE);
    }

    #[test]
    fn test_castled_king_bonus() {
        let castled = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R4RK1 w kq - 0 1");
        // Black still sits on e8 with its rights
        assert_eq!(castling_score(&castled), CASTLED_BONUS + UNCASTLED_PENALTY);
        let walked = pos("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R4K1R w kq - 0 1");
        assert_eq!(castling_score(&walked), -LOST_CASTLING_PENALTY + UNCASTLED_PENALTY);
    }

    #[test]
    fn test_doubled_and_isolated_pawns() {
        // White: doubled isolated pawns on the a-file. Black: a healthy pair.
        let p = pos("4k3/8/8/6pp/8/P7/P7/4K3 w - - 0 1");
        let white_only = pos("4k3/8/8/8/8/P7/P7/4K3 w - - 0 1");
        assert!(pawn_structure_score(&white_only) < pawn_structure_score(&pos("4k3/8/8/8/8/8/PP6/4K3 w - - 0 1")));
        assert!(pawn_structure_score(&p) < 0);
    }

    #[test]
    fn test_passed_pawn_grows_with_advance() {
        let far = pos("4k3/8/1P6/8/8/8/8/4K3 w - - 0 1");
        let near = pos("4k3/8/8/8/8/1P6/8/4K3 w - - 0 1");
        assert!(pawn_structure_score(&far) > pawn_structure_score(&near));
    }

    #[test]
    fn test_checkmate_scores_scale_with_depth_bonus() {
        let mated = pos("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert!(mated.is_checkmate());
        assert_eq!(evaluate(&mated, 0), -MATE_SCORE);
        assert!(evaluate(&mated, 3) < evaluate(&mated, 1));
    }

    #[test]
    fn test_board_state_agrees_with_status() {
        let cases = [
            // fool's mate
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
            // stalemate
            "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1",
            // in check with an escape
            "4k3/8/8/8/8/8/4r3/4K3 w - - 0 1",
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        ];
        for fen in cases {
            let p = pos(fen);
            let state = BoardState::of(&p);
            assert_eq!(state.is_checkmate(), p.is_checkmate(), "{fen}");
            assert_eq!(state.is_dead_draw(&p), p.is_stalemate(), "{fen}");
            assert_eq!(state.moves.len(), p.legal_move_count(), "{fen}");
        }
        assert_eq!(evaluate(&pos(cases[1]), 5), 0);
    }

    #[test]
    fn test_anti_stalemate_uses_shared_moves() {
        // Black king boxed in a corner with Ka7 as its only move
        let p = pos("k7/8/8/1Q6/8/8/8/4K3 b - - 0 1");
        let state = BoardState::of(&p);
        assert_eq!(state.moves.len(), 1);
        // White-relative: the trapping side pays
        assert_eq!(anti_stalemate_score(&p, &state, material(&p)), -ANTI_STALEMATE_PENALTY);
    }

    #[test]
    fn test_evaluator_noise_is_bounded() {
        let p = Position::default();
        let base = evaluate(&p, 0);
        let noisy = Evaluator::new(None, 5);
        for _ in 0..50 {
            let score = noisy.evaluate(&p, 0);
            assert!((score - base).abs() <= 5);
        }
    }
}
