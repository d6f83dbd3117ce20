// Move ordering for the alpha-beta search
//
// Priority, highest first:
// 1. The transposition-table move
// 2. Captures by MVV-LVA, en passant and promotions
// 3. Killer moves for the current ply
// 4. Quiet moves by history score
// Moves that walk into a repeated position sink to the bottom.

use chess::{ChessMove, Piece};
use smallvec::SmallVec;

use super::evaluation::piece_value;
use crate::game_repr::Position;

/// Plies tracked by the killer table
pub const MAX_PLY: usize = 64;

const TT_MOVE_SCORE: i32 = 1_000_000;
const REPETITION_PENALTY: i32 = 500;
const EN_PASSANT_BONUS: i32 = 500;
const PRIMARY_KILLER: i32 = 90;
const SECONDARY_KILLER: i32 = 80;

/// History scores are divided by this before joining the ordering score
const HISTORY_SCALE: i32 = 256;

/// Any history entry crossing this halves the whole table
const HISTORY_AGING_LIMIT: i32 = 16_384;

/// Two quiet moves per ply that recently caused a beta cutoff
#[derive(Debug, Clone)]
pub struct KillerMoves {
    slots: [[Option<ChessMove>; 2]; MAX_PLY],
}

impl KillerMoves {
    pub fn new() -> Self {
        Self {
            slots: [[None; 2]; MAX_PLY],
        }
    }

    /// Record a cutoff move at `ply`, pushing the previous primary down
    pub fn record(&mut self, ply: usize, mv: ChessMove) {
        let Some(slot) = self.slots.get_mut(ply) else {
            return;
        };
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
    }

    /// Ordering bonus of `mv` at `ply`
    pub fn bonus(&self, ply: usize, mv: ChessMove) -> i32 {
        match self.slots.get(ply) {
            Some([Some(first), _]) if *first == mv => PRIMARY_KILLER,
            Some([_, Some(second)]) if *second == mv => SECONDARY_KILLER,
            _ => 0,
        }
    }

    pub fn get(&self, ply: usize) -> [Option<ChessMove>; 2] {
        self.slots.get(ply).copied().unwrap_or([None, None])
    }

    pub fn clear(&mut self) {
        self.slots = [[None; 2]; MAX_PLY];
    }
}

impl Default for KillerMoves {
    fn default() -> Self {
        Self::new()
    }
}

/// Cutoff statistics for quiet moves, indexed by (from, to)
#[derive(Debug, Clone)]
pub struct HistoryTable {
    scores: Box<[[i32; 64]; 64]>,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            scores: Box::new([[0; 64]; 64]),
        }
    }

    /// Reward a quiet move that caused a cutoff at `depth`
    pub fn record(&mut self, mv: ChessMove, depth: u8) {
        let depth = depth as i32;
        let entry = &mut self.scores[mv.get_source().to_index()][mv.get_dest().to_index()];
        *entry = entry.saturating_add(depth * depth);
        if *entry > HISTORY_AGING_LIMIT {
            self.age();
        }
    }

    pub fn score(&self, mv: ChessMove) -> i32 {
        self.scores[mv.get_source().to_index()][mv.get_dest().to_index()]
    }

    /// Halve every entry
    fn age(&mut self) {
        for row in self.scores.iter_mut() {
            for entry in row.iter_mut() {
                *entry /= 2;
            }
        }
    }

    pub fn clear(&mut self) {
        for row in self.scores.iter_mut() {
            row.fill(0);
        }
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// MVV-LVA score of a capture: most valuable victim, least valuable attacker
#[inline]
fn mvv_lva(victim: Piece, attacker: Piece) -> i32 {
    10 * piece_value(victim) - piece_value(attacker)
}

/// Ordering score of a single move, ignoring the TT move
pub fn score_move(
    pos: &mut Position,
    mv: ChessMove,
    killers: &KillerMoves,
    history: &HistoryTable,
    ply: usize,
) -> i32 {
    let mut score = 0;

    let attacker = pos.board().piece_on(mv.get_source()).unwrap_or(Piece::Pawn);
    let capture = pos.captured_piece(mv);
    if let Some(victim) = capture {
        score += mvv_lva(victim, attacker);
        if pos.is_en_passant(mv) {
            score += EN_PASSANT_BONUS;
        }
    }

    if let Some(promotion) = mv.get_promotion() {
        score += piece_value(promotion);
    }

    if capture.is_none() && mv.get_promotion().is_none() {
        score += killers.bonus(ply, mv);
        score += history.score(mv) / HISTORY_SCALE;
    }

    let repeats = {
        let after = pos.play(mv);
        after.is_repetition(2)
    };
    if repeats {
        score -= REPETITION_PENALTY;
    }

    score
}

/// All legal moves, best candidates first
pub fn order_moves(
    pos: &mut Position,
    tt_move: Option<ChessMove>,
    killers: &KillerMoves,
    history: &HistoryTable,
    ply: usize,
) -> SmallVec<[ChessMove; 64]> {
    let moves = pos.legal_moves();
    let mut scored: SmallVec<[(ChessMove, i32); 64]> = moves
        .into_iter()
        .map(|mv| {
            let score = if Some(mv) == tt_move {
                TT_MOVE_SCORE
            } else {
                score_move(pos, mv, killers, history, ply)
            };
            (mv, score)
        })
        .collect();

    // Stable sort keeps generation order among equal scores
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(mv, _)| mv).collect()
}

/// Captures only (en passant included), by MVV-LVA
pub fn order_captures(pos: &Position) -> SmallVec<[ChessMove; 32]> {
    let mut scored: SmallVec<[(ChessMove, i32); 32]> = pos
        .legal_moves()
        .into_iter()
        .filter_map(|mv| {
            let victim = pos.captured_piece(mv)?;
            let attacker = pos.board().piece_on(mv.get_source()).unwrap_or(Piece::Pawn);
            Some((mv, mvv_lva(victim, attacker)))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(mv, _)| mv).collect()
}
