//! Tunable parameters for the search and the learning overlay.
//!
//! Every knob has a `Default` matching the engine's stock behavior, so callers
//! only override what they care about:
//!
//! ```rust
//! use chess_learner::agent::ai::{Difficulty, SearchConfig};
//! use std::time::Duration;
//!
//! let config = SearchConfig {
//!     time_limit: Duration::from_millis(500),
//!     ..Difficulty::Hard.search_config()
//! };
//! assert_eq!(config.max_depth, 8);
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Iterative-deepening search parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Deepest iteration attempted
    pub max_depth: u8,
    /// Wall-clock budget per move decision
    pub time_limit: Duration,
    /// Transposition table entries
    pub tt_capacity: usize,
    /// Uniform evaluation noise in `[-eval_noise, eval_noise]`, 0 disables it
    pub eval_noise: i32,
    /// Half-width of the first aspiration window
    pub aspiration_window: i32,
    /// Nodes between two deadline checks
    pub node_check_interval: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            time_limit: Duration::from_secs(2),
            tt_capacity: 400_000,
            eval_noise: 0,
            aspiration_window: 50,
            node_check_interval: 2048,
        }
    }
}

/// Parameters of the temporal-difference learning overlay
#[derive(Debug, Clone, PartialEq)]
pub struct LearningConfig {
    /// Learned positions kept before the least recently used is dropped
    pub max_positions: usize,
    pub learning_rate: f64,
    /// Per-move discount applied while walking back from the final position
    pub discount: f64,
    pub explore_start: f64,
    pub explore_min: f64,
    /// Exploration rate multiplier applied after every game
    pub explore_decay: f64,
    /// Blend weight gained per game played
    pub blend_per_game: f64,
    /// Upper bound of the blend weight
    pub blend_cap: f64,
    /// Terminal reward for a decisive result
    pub win_reward: f64,
    /// Reward for an unfinished game judged won or lost on material
    pub truncated_reward: f64,
    /// Material edge needed to call an unfinished game
    pub truncated_threshold: i32,
    /// Weight of the final material balance added to the reward
    pub material_shaping: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            max_positions: 200_000,
            learning_rate: 0.15,
            discount: 0.92,
            explore_start: 0.35,
            explore_min: 0.05,
            explore_decay: 0.995,
            blend_per_game: 0.002,
            blend_cap: 0.40,
            win_reward: 1000.0,
            truncated_reward: 300.0,
            truncated_threshold: 150,
            material_shaping: 0.1,
        }
    }
}

/// Everything a [`TreePlayer`](super::TreePlayer) needs to be built
#[derive(Debug, Clone, Default)]
pub struct PlayerConfig {
    pub search: SearchConfig,
    /// Where to persist learned values; `None` disables learning
    pub learning_path: Option<PathBuf>,
    pub learning: LearningConfig,
    pub opening_book: BookConfig,
}

/// Opening book usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookConfig {
    pub enabled: bool,
    /// Own moves per game that may come from the book
    pub max_moves: u32,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_moves: 12,
        }
    }
}

/// Preset search strengths
///
/// Each level maps to a depth cap and a time budget; the time budget is what
/// usually ends the search, the depth cap keeps trivial positions fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    /// Depth 2, 200ms
    Easy,
    /// Depth 4, 1s
    Medium,
    /// Depth 8, 2s
    Hard,
    /// Depth 10, 5s
    Expert,
}

impl Difficulty {
    pub fn max_depth(&self) -> u8 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 4,
            Difficulty::Hard => 8,
            Difficulty::Expert => 10,
        }
    }

    pub fn time_limit(&self) -> Duration {
        match self {
            Difficulty::Easy => Duration::from_millis(200),
            Difficulty::Medium => Duration::from_secs(1),
            Difficulty::Hard => Duration::from_secs(2),
            Difficulty::Expert => Duration::from_secs(5),
        }
    }

    /// Get a display name for this difficulty level
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            max_depth: self.max_depth(),
            time_limit: self.time_limit(),
            ..SearchConfig::default()
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (depth {}, {}ms)", self.name(), self.max_depth(), self.time_limit().as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_engine() {
        let search = SearchConfig::default();
        assert_eq!(search.max_depth, 10);
        assert_eq!(search.time_limit, Duration::from_secs(2));
        assert_eq!(search.tt_capacity, 400_000);
        assert_eq!(search.node_check_interval, 2048);

        let learning = LearningConfig::default();
        assert_eq!(learning.max_positions, 200_000);
        assert_eq!(learning.learning_rate, 0.15);
        assert_eq!(learning.discount, 0.92);
    }

    #[test]
    fn test_difficulty_depth_increases() {
        let levels = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard, Difficulty::Expert];
        for pair in levels.windows(2) {
            assert!(pair[0].max_depth() < pair[1].max_depth());
            assert!(pair[0].time_limit() <= pair[1].time_limit());
        }
        assert_eq!(Difficulty::Hard.search_config(), SearchConfig {
            max_depth: 8,
            ..SearchConfig::default()
        });
    }

    #[test]
    fn test_difficulty_display() {
        assert_eq!(Difficulty::Easy.to_string(), "Easy (depth 2, 200ms)");
        assert_eq!(Difficulty::Expert.to_string(), "Expert (depth 10, 5000ms)");
    }
}
