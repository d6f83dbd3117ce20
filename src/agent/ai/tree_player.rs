//! TreePlayer - tree-search chess AI with an optional learning overlay
//!
//! Each move decision runs through three stages:
//! 1. **Opening book**: while the game is still in known theory, play a random
//!    book move
//! 2. **Exploration**: a learning player sometimes plays a random
//!    (non-repeating) move so it keeps discovering new positions
//! 3. **Search**: iterative-deepening negamax with the learned values blended
//!    into the evaluation
//!
//! Decisions from stages 2 and 3 are recorded so the game result can be
//! propagated back over them when the game ends.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chess_learner::agent::ai::{Difficulty, PlayerConfig, TreePlayer};
//! use chess_learner::agent::{GameResult, LearningPlayer, Player};
//! use chess_learner::game_repr::{Color, Position};
//!
//! let mut player = TreePlayer::new(PlayerConfig {
//!     search: Difficulty::Medium.search_config(),
//!     learning_path: Some("learning.json.gz".into()),
//!     ..PlayerConfig::default()
//! });
//!
//! let mut pos = Position::default();
//! let san = player.choose_move(&mut pos).unwrap();
//! pos.push_san(&san).unwrap();
//!
//! if let Some(learner) = player.as_learning_player() {
//!     learner.end_game(GameResult::Unfinished, &pos, Color::White);
//! }
//! ```

use chess::{ChessMove, Color};
use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::config::PlayerConfig;
use super::evaluation::{evaluate, LearnedValues};
use super::learning::LearningManager;
use super::learning_store::LearningStore;
use super::opening_book::OpeningBook;
use super::search::{SearchEngine, SearchResult};
use super::zobrist;
use crate::agent::player::{GameResult, LearningPlayer, LearningStats, Player};
use crate::error::{EngineError, Result};
use crate::game_repr::Position;

pub struct TreePlayer {
    name: String,
    engine: SearchEngine,
    learning: Option<LearningManager>,
    book: OpeningBook,
    rng: Xoshiro256PlusPlus,
    last_search: Option<SearchResult>,
}

impl TreePlayer {
    /// Build a player from `config`, loading the learning store when a path
    /// is configured.
    pub fn new(config: PlayerConfig) -> Self {
        let learning = config
            .learning_path
            .as_ref()
            .map(|path| LearningManager::open(LearningStore::new(path), config.learning.clone()));
        Self {
            name: "TreePlayer".to_string(),
            engine: SearchEngine::new(config.search),
            learning,
            book: OpeningBook::new(&config.opening_book),
            rng: Xoshiro256PlusPlus::from_entropy(),
            last_search: None,
        }
    }

    /// Attach (or replace) the learning overlay
    pub fn with_learning(mut self, learning: LearningManager) -> Self {
        self.learning = Some(learning);
        self
    }

    /// Fix the random source used by the book and exploration
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn learning(&self) -> Option<&LearningManager> {
        self.learning.as_ref()
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Statistics of the last full search, if the last decision searched
    pub fn last_search(&self) -> Option<&SearchResult> {
        self.last_search.as_ref()
    }

    /// A uniformly random legal move, avoiding repetitions when possible
    fn exploration_move(&mut self, pos: &mut Position) -> Option<ChessMove> {
        let legal = pos.legal_moves();
        let fresh: Vec<ChessMove> = legal
            .iter()
            .copied()
            .filter(|&mv| !pos.play(mv).is_repetition(2))
            .collect();
        let pool: &[ChessMove] = if fresh.is_empty() { &legal } else { &fresh };
        pool.choose(&mut self.rng).copied()
    }

    /// Remember the decision for the end-of-game update
    fn record(&mut self, pos: &Position, mv: ChessMove) {
        if let Some(learning) = self.learning.as_mut() {
            learning.record_move(zobrist::hash(pos), pos.san(mv), evaluate(pos, 0) as f64);
        }
    }
}

impl Player for TreePlayer {
    fn choose_move(&mut self, pos: &mut Position) -> Result<String> {
        if pos.legal_move_count() == 0 {
            return Err(EngineError::NoLegalMove { fen: pos.fen() });
        }
        self.last_search = None;

        if let Some(mv) = self.book.probe(pos, &mut self.rng) {
            debug!("{}: book move {}", self.name, pos.san(mv));
            return Ok(pos.san(mv));
        }

        let explore = match &self.learning {
            Some(learning) => learning.should_explore(&mut self.rng),
            None => false,
        };
        if explore {
            if let Some(mv) = self.exploration_move(pos) {
                debug!("{}: exploring with {}", self.name, pos.san(mv));
                self.record(pos, mv);
                return Ok(pos.san(mv));
            }
        }

        let learned = self.learning.as_ref().map(|l| l as &dyn LearnedValues);
        let result = self.engine.search(pos, learned)?;
        let mv = result.best_move;
        debug!(
            "{}: searched {} (depth {}, score {}, {} nodes)",
            self.name,
            pos.san(mv),
            result.depth,
            result.score,
            result.nodes
        );
        self.last_search = Some(result);
        self.record(pos, mv);
        Ok(pos.san(mv))
    }

    fn new_game(&mut self) {
        self.engine.new_game();
        self.book.reset();
        self.last_search = None;
        if let Some(learning) = self.learning.as_mut() {
            learning.start_new_game();
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_learning_player(&mut self) -> Option<&mut dyn LearningPlayer> {
        if self.learning.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl LearningPlayer for TreePlayer {
    fn end_game(&mut self, result: GameResult, final_position: &Position, color: Color) {
        if let Some(learning) = self.learning.as_mut() {
            learning.end_game(result, final_position, color);
        }
        self.new_game();
    }

    fn learning_stats(&self) -> LearningStats {
        match &self.learning {
            Some(learning) => learning.stats(),
            None => LearningStats {
                games_played: 0,
                positions_learned: 0,
                wins: 0,
                draws: 0,
                losses: 0,
                win_rate: 0.0,
                exploration_rate: 0.0,
            },
        }
    }
}
