// Temporal-difference learning overlay
//
// During a game the player records every position it decided in (hash, move,
// static score). When the game ends the final reward is walked back over the
// recorded positions with a per-move discount, nudging each stored value
// towards its discounted target. The learned values are blended into the
// static evaluation with a weight that grows with experience.

use chess::Color;
use chrono::Utc;
use log::{info, warn};
use rand::Rng;

use super::config::LearningConfig;
use super::evaluation::{material_for, LearnedValues};
use super::learning_store::{LearningSnapshot, LearningStore};
use super::lru::LruMap;
use crate::agent::player::{GameResult, LearningStats};
use crate::error::Result;
use crate::game_repr::Position;

/// One decision taken during the current game
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMove {
    pub hash: u64,
    pub san: String,
    /// Static evaluation before the move, from the mover's point of view
    pub score: f64,
}

pub struct LearningManager {
    config: LearningConfig,
    store: Option<LearningStore>,
    values: LruMap<f64>,
    current_game: Vec<RecordedMove>,
    games_played: u64,
    wins: u64,
    losses: u64,
    draws: u64,
    exploration_rate: f64,
}

impl LearningManager {
    /// A learner that never touches the disk
    pub fn in_memory(config: LearningConfig) -> Self {
        Self {
            values: LruMap::new(config.max_positions),
            exploration_rate: config.explore_start,
            config,
            store: None,
            current_game: Vec::new(),
            games_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    /// A learner persisted at `store`, restored from it when possible
    pub fn open(store: LearningStore, config: LearningConfig) -> Self {
        let snapshot = store.load();
        let mut manager = Self::in_memory(config);
        manager.store = Some(store);
        if let Some(snapshot) = snapshot {
            manager.restore(snapshot);
        }
        manager
    }

    fn restore(&mut self, snapshot: LearningSnapshot) {
        let skip = snapshot.position_values.len().saturating_sub(self.values.capacity());
        for (hash, value) in snapshot.position_values.into_iter().skip(skip) {
            self.values.insert(hash, value);
        }
        self.games_played = snapshot.games_played;
        self.wins = snapshot.wins;
        self.losses = snapshot.losses;
        self.draws = snapshot.draws;

        let decayed = self.config.explore_start * self.config.explore_decay.powf(self.games_played as f64);
        self.exploration_rate = decayed.max(self.config.explore_min);
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    pub fn start_new_game(&mut self) {
        self.current_game.clear();
    }

    pub fn record_move(&mut self, hash: u64, san: impl Into<String>, score: f64) {
        self.current_game.push(RecordedMove {
            hash,
            san: san.into(),
            score,
        });
    }

    pub fn recorded_moves(&self) -> &[RecordedMove] {
        &self.current_game
    }

    /// Learned value of a position, without refreshing its recency
    pub fn value(&self, hash: u64) -> Option<f64> {
        self.values.peek(hash).copied()
    }

    pub fn games_played(&self) -> u64 {
        self.games_played
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    /// Weight of learned values in the evaluation blend
    pub fn blend_weight(&self) -> f64 {
        (self.games_played as f64 * self.config.blend_per_game).min(self.config.blend_cap)
    }

    /// Roll for an exploratory move
    pub fn should_explore<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.exploration_rate
    }

    /// Learn from a finished game played as `color` and persist the result.
    ///
    /// Returns the shaped reward that was propagated.
    pub fn end_game(&mut self, result: GameResult, final_position: &Position, color: Color) -> f64 {
        self.games_played += 1;

        let material = material_for(final_position, color);
        let reward = match result {
            GameResult::WhiteWins | GameResult::BlackWins => {
                if result.winner() == Some(color) {
                    self.wins += 1;
                    self.config.win_reward
                } else {
                    self.losses += 1;
                    -self.config.win_reward
                }
            }
            GameResult::Draw => {
                self.draws += 1;
                0.0
            }
            GameResult::Unfinished => {
                if material > self.config.truncated_threshold {
                    self.wins += 1;
                    self.config.truncated_reward
                } else if material < -self.config.truncated_threshold {
                    self.losses += 1;
                    -self.config.truncated_reward
                } else {
                    self.draws += 1;
                    0.0
                }
            }
        };
        let shaped = reward + self.config.material_shaping * material as f64;

        self.backpropagate(shaped);
        self.current_game.clear();
        self.exploration_rate = (self.exploration_rate * self.config.explore_decay).max(self.config.explore_min);

        info!(
            "game {} finished {} as {:?}: reward {:.1}, {} positions learned, exploration {:.4}",
            self.games_played,
            result,
            color,
            shaped,
            self.values.len(),
            self.exploration_rate
        );

        if let Err(err) = self.save() {
            warn!("could not save learning data: {}", err);
        }
        shaped
    }

    /// Walk the reward back from the last recorded move to the first
    fn backpropagate(&mut self, reward: f64) {
        let mut target = reward;
        for recorded in self.current_game.iter().rev() {
            let old = self.values.peek(recorded.hash).copied().unwrap_or(recorded.score);
            let updated = old + self.config.learning_rate * (target - old);
            self.values.insert(recorded.hash, updated);
            target *= self.config.discount;
        }
    }

    pub fn stats(&self) -> LearningStats {
        let win_rate = if self.games_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.games_played as f64
        };
        LearningStats {
            games_played: self.games_played,
            positions_learned: self.values.len(),
            wins: self.wins,
            draws: self.draws,
            losses: self.losses,
            win_rate,
            exploration_rate: self.exploration_rate,
        }
    }

    pub fn snapshot(&self) -> LearningSnapshot {
        LearningSnapshot {
            position_values: self.values.iter().map(|(hash, value)| (hash, *value)).collect(),
            games_played: self.games_played,
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
            last_updated: Some(Utc::now().to_rfc3339()),
        }
    }

    /// Write the store now. A no-op for in-memory learners.
    pub fn save(&self) -> Result<()> {
        match &self.store {
            Some(store) => store.save(&self.snapshot()),
            None => Ok(()),
        }
    }
}

impl LearnedValues for LearningManager {
    fn learned_value(&self, hash: u64) -> Option<f64> {
        self.value(hash)
    }

    fn blend_weight(&self) -> f64 {
        LearningManager::blend_weight(self)
    }
}
