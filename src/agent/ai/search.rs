// Iterative Deepening Search Orchestrator
//
// Searches depth 1, 2, 3, ... up to the configured maximum. Each iteration
// fills the transposition table and the killer/history tables, so the next
// one starts from much better move ordering. From depth 3 on the root is
// searched with an aspiration window around the previous score.

use std::time::Duration;

use chess::ChessMove;
use log::debug;

use super::config::SearchConfig;
use super::evaluation::{is_mate_score, mate_distance, Evaluator, LearnedValues};
use super::move_ordering::{HistoryTable, KillerMoves};
use super::negamax::{negamax, SearchClock, SearchContext, SearchTimeout, INFINITY};
use super::transposition_table::TranspositionTable;
use crate::error::{EngineError, Result};
use crate::game_repr::Position;

/// Aspiration failures before falling back to a full window
const ASPIRATION_RETRIES: u32 = 3;

/// Depths up to this one always use the full window
const FULL_WINDOW_DEPTH: u8 = 2;

/// No new iteration starts once this share of the budget is spent
const TIME_USAGE_CUTOFF: f64 = 0.85;

/// Result of a search operation
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: ChessMove,
    /// Score of the last completed iteration, side to move's point of view
    pub score: i32,
    /// Deepest completed iteration (0 when only the fallback move is known)
    pub depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
    /// An iteration was cut off by the deadline
    pub timed_out: bool,
}

/// Iterative deepening driver that owns the search tables between moves
pub struct SearchEngine {
    config: SearchConfig,
    tt: TranspositionTable,
    killers: KillerMoves,
    history: HistoryTable,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            tt: TranspositionTable::with_capacity(config.tt_capacity),
            killers: KillerMoves::new(),
            history: HistoryTable::new(),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn transposition_table(&self) -> &TranspositionTable {
        &self.tt
    }

    /// Forget everything learned about the previous game
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.killers.clear();
        self.history.clear();
    }

    /// Pick a move for the side to move in `pos`.
    ///
    /// `pos` is searched in place and is back in its original state when this
    /// returns, whether or not the deadline was hit.
    pub fn search(&mut self, pos: &mut Position, learned: Option<&dyn LearnedValues>) -> Result<SearchResult> {
        let legal = pos.legal_moves();
        if legal.is_empty() {
            return Err(EngineError::NoLegalMove { fen: pos.fen() });
        }

        // Killers and history describe one decision; the TT lives for the game
        self.killers.clear();
        self.history.clear();

        let fallback = first_non_repeating(pos, &legal);
        let budget = self.config.time_limit;
        let max_depth = self.config.max_depth.max(1);
        let window = self.config.aspiration_window.max(1);

        let mut ctx = SearchContext {
            tt: &mut self.tt,
            killers: &mut self.killers,
            history: &mut self.history,
            eval: Evaluator::new(learned, self.config.eval_noise),
            clock: SearchClock::new(budget, self.config.node_check_interval),
        };

        let mut result = SearchResult {
            best_move: fallback,
            score: 0,
            depth: 0,
            nodes: 0,
            elapsed: Duration::ZERO,
            timed_out: false,
        };

        for depth in 1..=max_depth {
            let (score, best) = match search_root(pos, depth, result.score, window, &mut ctx) {
                Ok(found) => found,
                Err(SearchTimeout) => {
                    debug!("info depth {} timed out, keeping depth {}", depth, result.depth);
                    result.timed_out = true;
                    break;
                }
            };

            result.score = score;
            result.depth = depth;
            if let Some(mv) = best {
                result.best_move = mv;
            }

            let elapsed = ctx.clock.elapsed();
            debug!(
                "info depth {} score cp {} nodes {} time {} pv {}",
                depth,
                score,
                ctx.clock.nodes(),
                elapsed.as_millis(),
                result.best_move
            );

            // A game-over root has nothing deeper to find, and a mate inside
            // the searched depth cannot be improved on
            let proven_mate = mate_distance(score).is_some_and(|plies| plies <= i32::from(depth));
            if best.is_none() || proven_mate {
                break;
            }
            if elapsed.as_secs_f64() >= budget.as_secs_f64() * TIME_USAGE_CUTOFF {
                break;
            }
        }

        result.nodes = ctx.clock.nodes();
        result.elapsed = ctx.clock.elapsed();
        Ok(result)
    }
}

/// One iteration at the root: full window for shallow depths, otherwise an
/// aspiration window that doubles on every failure.
fn search_root(
    pos: &mut Position,
    depth: u8,
    previous: i32,
    window: i32,
    ctx: &mut SearchContext<'_>,
) -> std::result::Result<(i32, Option<ChessMove>), SearchTimeout> {
    if depth > FULL_WINDOW_DEPTH && !is_mate_score(previous) {
        let mut margin = window;
        for _ in 0..ASPIRATION_RETRIES {
            let (alpha, beta) = (previous - margin, previous + margin);
            let (score, best) = negamax(pos, depth, 0, alpha, beta, ctx)?;
            if score > alpha && score < beta && best.is_some() {
                return Ok((score, best));
            }
            margin = margin.saturating_mul(2);
        }
    }
    negamax(pos, depth, 0, -INFINITY, INFINITY, ctx)
}

/// First legal move that does not repeat a position, else the first legal move
fn first_non_repeating(pos: &mut Position, legal: &[ChessMove]) -> ChessMove {
    let first = legal[0];
    legal
        .iter()
        .copied()
        .find(|&mv| !pos.play(mv).is_repetition(2))
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(depth: u8, millis: u64) -> SearchEngine {
        SearchEngine::new(SearchConfig {
            max_depth: depth,
            time_limit: Duration::from_millis(millis),
            tt_capacity: 100_000,
            ..SearchConfig::default()
        })
    }

    #[test]
    fn test_search_starting_position() {
        let mut pos = Position::default();
        let result = engine(3, 10_000).search(&mut pos, None).unwrap();
        assert!(pos.is_legal(result.best_move));
        assert_eq!(result.depth, 3);
        assert!(result.nodes > 0);
        assert!(!result.timed_out);
    }

    #[test]
    fn test_no_legal_move_is_an_error() {
        let mut pos =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        let err = engine(3, 1_000).search(&mut pos, None).unwrap_err();
        assert!(matches!(err, EngineError::NoLegalMove { .. }));
    }

    #[test]
    fn test_single_legal_move_is_returned() {
        // The rook holds the g-file, only Kh7 is legal
        let mut pos = Position::from_fen("7k/8/8/8/8/8/8/K5R1 b - - 0 1").unwrap();
        let legal = pos.legal_moves();
        assert_eq!(legal.len(), 1);
        let result = engine(1, 5_000).search(&mut pos, None).unwrap();
        assert_eq!(result.best_move, legal[0]);
    }

    #[test]
    fn test_mate_stops_iterating_early() {
        let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let result = engine(8, 30_000).search(&mut pos, None).unwrap();
        assert_eq!(pos.san(result.best_move), "Ra8#");
        assert!(result.depth < 8);
    }

    #[test]
    fn test_mate_found_again_with_warm_table() {
        let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mut engine = engine(6, 30_000);
        let cold = engine.search(&mut pos, None).unwrap();
        let warm = engine.search(&mut pos, None).unwrap();
        assert_eq!(pos.san(warm.best_move), "Ra8#");
        assert_eq!(warm.score, cold.score);
        assert_eq!(mate_distance(warm.score), Some(1));
    }

    #[test]
    fn test_won_ending_stays_sane_with_warm_table() {
        let mut pos = Position::from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 0 1").unwrap();
        let mut engine = engine(4, 30_000);
        for _ in 0..3 {
            let result = engine.search(&mut pos, None).unwrap();
            assert_eq!(result.depth, 4);
            assert!(!is_mate_score(result.score), "score {}", result.score);
            assert!(result.score > 300, "score {}", result.score);
        }
    }

    #[test]
    fn test_new_game_clears_table() {
        let mut pos = Position::default();
        let mut engine = engine(2, 5_000);
        engine.search(&mut pos, None).unwrap();
        assert!(!engine.transposition_table().is_empty());
        engine.new_game();
        assert!(engine.transposition_table().is_empty());
    }
}
