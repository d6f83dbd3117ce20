// AI Agent - Negamax with Alpha-Beta Pruning and a learning overlay
//
// This module implements a classical chess AI using the Negamax algorithm
// with alpha-beta pruning, iterative deepening, and transposition tables,
// plus a temporal-difference learner that adjusts the evaluation from game
// results.
//
// Key features:
// - Transposition table with strict LRU eviction, keyed by Zobrist hashes
// - Aspiration windows, null-move pruning and late move reductions
// - Quiescence search to avoid horizon effect
// - Move ordering with killer and history heuristics
// - Learned position values persisted between runs

pub mod config;
pub mod evaluation;
pub mod learning;
pub mod learning_store;
mod lru;
pub mod move_ordering;
pub mod negamax;
pub mod opening_book;
mod piece_square_tables;
pub mod quiescence;
pub mod search;
pub mod transposition_table;
mod tree_player;
pub mod zobrist;

#[cfg(test)]
mod tests;

pub use config::{BookConfig, Difficulty, LearningConfig, PlayerConfig, SearchConfig};
pub use evaluation::{evaluate, Evaluator, LearnedValues, MATE_SCORE, MATE_THRESHOLD};
pub use learning::{LearningManager, RecordedMove};
pub use learning_store::{LearningSnapshot, LearningStore};
pub use search::{SearchEngine, SearchResult};
pub use transposition_table::{Bound, TTEntry, TranspositionTable};
pub use tree_player::TreePlayer;
