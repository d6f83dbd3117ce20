// Negamax Search with Alpha-Beta Pruning
//
// Negamax relies on the zero-sum property of chess: max(a, b) = -min(-a, -b).
// One function searches for both sides and negates the score at each level.
//
// Pruning and ordering:
// - Transposition table for position caching
// - Killer move and history heuristics for quiet moves
// - Null move pruning for early cutoffs
// - Late move reductions for quiet moves far down the list
// - Quiescence search at the leaves to avoid the horizon effect
//
// Every move is played through a scoped guard, so the position stack is
// balanced again on every exit path, including a timeout unwinding through
// `?`.

use std::time::{Duration, Instant};

use chess::ChessMove;

use super::evaluation::{is_endgame, material_for, Evaluator, MATE_THRESHOLD};
use super::move_ordering::{order_moves, HistoryTable, KillerMoves};
use super::quiescence::quiescence;
use super::transposition_table::{score_from_tt, score_to_tt, Bound, TranspositionTable};
use super::zobrist;
use crate::game_repr::Position;

/// Larger than any reachable score; safe to negate
pub const INFINITY: i32 = 1_000_000;

/// Null move reduction depth (how much to reduce depth for null move search)
const NULL_MOVE_REDUCTION: u8 = 2;

/// Minimum depth to attempt null move pruning
const NULL_MOVE_MIN_DEPTH: u8 = 3;

/// Moves before this index are never reduced
const LMR_MIN_INDEX: usize = 4;
const LMR_MIN_DEPTH: u8 = 3;

/// A repetition is scored as a draw, or as this penalty for a side that is
/// ahead by more than `REPETITION_MATERIAL_MARGIN`
const REPETITION_PENALTY: i32 = 200;
const REPETITION_MATERIAL_MARGIN: i32 = 100;

/// The time budget ran out. Carries no score: the interrupted iteration is
/// thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTimeout;

/// Node counter and deadline shared by the main search and quiescence
#[derive(Debug, Clone)]
pub struct SearchClock {
    start: Instant,
    deadline: Instant,
    nodes: u64,
    check_interval: u64,
    expired: bool,
}

impl SearchClock {
    pub fn new(budget: Duration, check_interval: u64) -> Self {
        let start = Instant::now();
        Self {
            start,
            deadline: start + budget,
            nodes: 0,
            check_interval: check_interval.max(1),
            expired: false,
        }
    }

    /// Count a node. The clock is only read every `check_interval` nodes;
    /// once expired, every later tick fails too.
    #[inline]
    pub fn tick(&mut self) -> Result<(), SearchTimeout> {
        self.nodes += 1;
        if !self.expired && self.nodes % self.check_interval == 0 && Instant::now() >= self.deadline {
            self.expired = true;
        }
        if self.expired {
            Err(SearchTimeout)
        } else {
            Ok(())
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn expired(&self) -> bool {
        self.expired
    }
}

/// Mutable state threaded through one search
pub struct SearchContext<'a> {
    pub tt: &'a mut TranspositionTable,
    pub killers: &'a mut KillerMoves,
    pub history: &'a mut HistoryTable,
    pub eval: Evaluator<'a>,
    pub clock: SearchClock,
}

/// Negamax search with alpha-beta pruning
///
/// # Arguments
///
/// * `pos` - Current position; played moves are always undone before returning
/// * `depth` - Remaining search depth (0 = leaf node, call quiescence)
/// * `ply` - Distance from the root, used for killer slots
/// * `alpha` / `beta` - Search window
///
/// # Returns
///
/// (score, best_move) from the side to move's point of view, or
/// `SearchTimeout` when the deadline passed somewhere below this node.
pub fn negamax(
    pos: &mut Position,
    depth: u8,
    ply: usize,
    mut alpha: i32,
    mut beta: i32,
    ctx: &mut SearchContext<'_>,
) -> Result<(i32, Option<ChessMove>), SearchTimeout> {
    ctx.clock.tick()?;

    if ply > 0 && pos.is_repetition(2) {
        let ahead = material_for(pos, pos.side_to_move()) > REPETITION_MATERIAL_MARGIN;
        return Ok((if ahead { -REPETITION_PENALTY } else { 0 }, None));
    }

    let hash = zobrist::hash(pos);
    let mut tt_move = None;
    if let Some(entry) = ctx.tt.get(hash) {
        tt_move = entry.best_move.filter(|mv| pos.is_legal(*mv));
        // The root always searches its moves; its entry only orders them
        if ply > 0 && entry.usable_at(depth) {
            let score = score_from_tt(entry.score, ply);
            match entry.bound {
                Bound::Exact => return Ok((score, tt_move)),
                Bound::Lower => alpha = alpha.max(score),
                Bound::Upper => beta = beta.min(score),
            }
            if alpha >= beta {
                return Ok((score, tt_move));
            }
        }
    }

    if depth == 0 || pos.is_game_over() {
        let score = quiescence(pos, alpha, beta, ply, 0, ctx)?;
        return Ok((score, None));
    }

    // Null move: if passing still fails high, a real move will too
    if ply > 0
        && !pos.is_check()
        && depth >= NULL_MOVE_MIN_DEPTH
        && alpha.abs() < MATE_THRESHOLD
        && beta.abs() < MATE_THRESHOLD
        && !is_endgame(pos)
    {
        if let Some(mut child) = pos.play_null() {
            let reduced = depth - 1 - NULL_MOVE_REDUCTION;
            let (score, _) = negamax(&mut child, reduced, ply + 1, -beta, -beta + 1, ctx)?;
            if -score >= beta {
                return Ok((beta, None));
            }
        }
    }

    let alpha_orig = alpha;
    let moves = order_moves(pos, tt_move, &*ctx.killers, &*ctx.history, ply);

    let mut best_score = -INFINITY;
    let mut best_move = None;

    for (index, mv) in moves.into_iter().enumerate() {
        let quiet = !pos.is_capture(mv) && mv.get_promotion().is_none();
        let reduce = index >= LMR_MIN_INDEX && depth >= LMR_MIN_DEPTH && quiet && !pos.gives_check(mv);

        let score = {
            let mut child = pos.play(mv);
            let mut score = if reduce {
                -negamax(&mut child, depth - 2, ply + 1, -beta, -alpha, ctx)?.0
            } else {
                -negamax(&mut child, depth - 1, ply + 1, -beta, -alpha, ctx)?.0
            };
            // The reduced search looked promising: verify at full depth
            if reduce && score > alpha {
                score = -negamax(&mut child, depth - 1, ply + 1, -beta, -alpha, ctx)?.0;
            }
            score
        };

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            if quiet {
                ctx.killers.record(ply, mv);
                ctx.history.record(mv, depth);
            }
            break;
        }
    }

    if best_move.is_none() {
        let score = quiescence(pos, alpha_orig, beta, ply, 0, ctx)?;
        return Ok((score, None));
    }

    let bound = if best_score <= alpha_orig {
        Bound::Upper
    } else if best_score >= beta {
        Bound::Lower
    } else {
        Bound::Exact
    };
    ctx.tt.put(hash, score_to_tt(best_score, ply), bound, depth, best_move);

    Ok((best_score, best_move))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ai::evaluation::{is_mate_score, mate_bonus, MATE_SCORE};

    struct Tables {
        tt: TranspositionTable,
        killers: KillerMoves,
        history: HistoryTable,
    }

    impl Tables {
        fn new() -> Self {
            Self {
                tt: TranspositionTable::with_capacity(50_000),
                killers: KillerMoves::new(),
                history: HistoryTable::new(),
            }
        }

        fn context(&mut self, budget: Duration, interval: u64) -> SearchContext<'_> {
            SearchContext {
                tt: &mut self.tt,
                killers: &mut self.killers,
                history: &mut self.history,
                eval: Evaluator::plain(),
                clock: SearchClock::new(budget, interval),
            }
        }
    }

    #[test]
    fn test_finds_back_rank_mate() {
        let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mut tables = Tables::new();
        let mut ctx = tables.context(Duration::from_secs(30), 2048);
        let (score, mv) = negamax(&mut pos, 2, 0, -INFINITY, INFINITY, &mut ctx).unwrap();
        assert_eq!(mv.map(|m| pos.san(m)), Some("Ra8#".to_string()));
        assert!(score >= MATE_SCORE);
    }

    #[test]
    fn test_mated_side_scores_negative_mate() {
        let mut pos =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        let mut tables = Tables::new();
        let mut ctx = tables.context(Duration::from_secs(30), 2048);
        let (score, mv) = negamax(&mut pos, 3, 0, -INFINITY, INFINITY, &mut ctx).unwrap();
        assert_eq!(mv, None);
        assert_eq!(score, -(MATE_SCORE + mate_bonus(0)));
    }

    #[test]
    fn test_mate_score_stable_across_depths_and_tt_reuse() {
        let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mut tables = Tables::new();
        let mut scores = Vec::new();
        for depth in [1, 2, 4, 2, 4] {
            let mut ctx = tables.context(Duration::from_secs(30), 2048);
            let (score, mv) = negamax(&mut pos, depth, 0, -INFINITY, INFINITY, &mut ctx).unwrap();
            assert_eq!(mv.map(|m| pos.san(m)), Some("Ra8#".to_string()), "depth {}", depth);
            scores.push(score);
        }
        // Mate on the first ply, whatever the depth and whatever the table holds
        assert!(scores.iter().all(|&s| s == MATE_SCORE + mate_bonus(1)), "{:?}", scores);
    }

    #[test]
    fn test_root_ignores_stale_tt_bounds() {
        let mut pos = Position::from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 0 1").unwrap();
        let mut tables = Tables::new();
        // A bogus mate bound for the root left over from an earlier decision
        tables
            .tt
            .put(zobrist::hash(&pos), MATE_SCORE + 200, Bound::Lower, 10, None);
        let mut ctx = tables.context(Duration::from_secs(30), 2048);
        let (score, mv) = negamax(&mut pos, 3, 0, -INFINITY, INFINITY, &mut ctx).unwrap();
        assert!(!is_mate_score(score), "score {}", score);
        assert!(score > 300);
        // The rook must not be left hanging next to the black king
        let mv = mv.unwrap();
        let child = pos.play(mv);
        assert!(child
            .legal_moves()
            .iter()
            .all(|&reply| child.captured_piece(reply).is_none()));
    }

    #[test]
    fn test_timeout_unwinds_and_restores_position() {
        let mut pos = Position::default();
        let fen = pos.fen();
        let mut tables = Tables::new();
        let mut ctx = tables.context(Duration::ZERO, 1);
        let result = negamax(&mut pos, 6, 0, -INFINITY, INFINITY, &mut ctx);
        assert_eq!(result, Err(SearchTimeout));
        assert_eq!(pos.stack_depth(), 0);
        assert_eq!(pos.fen(), fen);
    }

    #[test]
    fn test_stores_result_in_tt() {
        let mut pos = Position::default();
        let mut tables = Tables::new();
        let mut ctx = tables.context(Duration::from_secs(30), 2048);
        negamax(&mut pos, 2, 0, -INFINITY, INFINITY, &mut ctx).unwrap();
        drop(ctx);
        let entry = tables.tt.get(zobrist::hash(&pos)).unwrap();
        assert_eq!(entry.depth, 2);
        assert!(entry.best_move.is_some());
    }

    #[test]
    fn test_clock_counts_nodes() {
        let mut clock = SearchClock::new(Duration::from_secs(60), 4);
        for _ in 0..10 {
            clock.tick().unwrap();
        }
        assert_eq!(clock.nodes(), 10);
        assert!(!clock.expired());
    }
}
