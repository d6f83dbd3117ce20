//! Player trait and associated types for chess game agents.
//!
//! This module provides the core abstraction for anything that can pick a move:
//! the searching [`TreePlayer`](crate::agent::ai::TreePlayer), the
//! [`RandomPlayer`](crate::agent::RandomPlayer) baseline, or a caller-supplied
//! implementation driving its own engine.
//!
//! # Design Philosophy
//!
//! The `Player` trait focuses on **behavior** rather than construction. Different
//! player implementations need different initialization parameters (search
//! configuration, a learning store path, a random seed), so the trait does not
//! define a constructor. Each implementation provides its own.
//!
//! Learning is an optional capability. Players that update themselves from game
//! results additionally implement [`LearningPlayer`] and expose it through
//! [`Player::as_learning_player`], so a game driver holding `Box<dyn Player>` can
//! report results without knowing the concrete type.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chess_learner::agent::{GameResult, Player, RandomPlayer};
//! use chess_learner::game_repr::Position;
//!
//! fn play_out<'a>(white: &'a mut dyn Player, black: &'a mut dyn Player) -> GameResult {
//!     let mut pos = Position::default();
//!     while GameResult::from_position(&pos).is_none() {
//!         let player: &mut dyn Player = if pos.ply() % 2 == 0 { &mut *white } else { &mut *black };
//!         let san = player.choose_move(&mut pos).expect("a legal move");
//!         pos.push_san(&san).expect("the player returned a legal move");
//!     }
//!     GameResult::from_position(&pos).unwrap_or(GameResult::Unfinished)
//! }
//!
//! let mut white = RandomPlayer::seeded(1);
//! let mut black = RandomPlayer::seeded(2);
//! println!("{}", play_out(&mut white, &mut black));
//! ```
//!
//! # Synchronous Design
//!
//! `choose_move()` is synchronous (blocking). The searching player blocks for at
//! most its configured time budget and always answers with a legal move.

use std::fmt;
use std::str::FromStr;

use chess::Color;

use crate::error::{EngineError, Result};
use crate::game_repr::Position;

/// Result of a chess game, in the usual PGN result notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    /// `1-0`
    WhiteWins,
    /// `0-1`
    BlackWins,
    /// `1/2-1/2`: stalemate, insufficient material, the 75-move rule, repetition
    Draw,
    /// `*`: the game was stopped before a result was reached
    Unfinished,
}

impl GameResult {
    /// Create a GameResult from the winning color
    pub fn from_winner(winner: Color) -> Self {
        match winner {
            Color::White => GameResult::WhiteWins,
            Color::Black => GameResult::BlackWins,
        }
    }

    /// Result of a finished position, `None` while the game goes on.
    ///
    /// A checkmated side to move loses; every other way the game can end
    /// (stalemate, insufficient material, 75-move rule, fivefold repetition)
    /// is a draw.
    pub fn from_position(pos: &Position) -> Option<Self> {
        if pos.is_checkmate() {
            Some(Self::from_winner(!pos.side_to_move()))
        } else if pos.is_game_over() {
            Some(GameResult::Draw)
        } else {
            None
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::WhiteWins => Some(Color::White),
            GameResult::BlackWins => Some(Color::Black),
            GameResult::Draw | GameResult::Unfinished => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Unfinished => "*",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameResult {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1-0" => Ok(GameResult::WhiteWins),
            "0-1" => Ok(GameResult::BlackWins),
            "1/2-1/2" => Ok(GameResult::Draw),
            "*" => Ok(GameResult::Unfinished),
            other => Err(EngineError::InvalidResultCode(other.to_string())),
        }
    }
}

/// Snapshot of what a learning player has absorbed so far.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningStats {
    pub games_played: u64,
    pub positions_learned: usize,
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
    /// Wins divided by games played (0 before the first game)
    pub win_rate: f64,
    /// Probability of playing a random move instead of searching
    pub exploration_rate: f64,
}

/// Trait for entities that can provide chess moves.
///
/// # Required Methods
///
/// Only `choose_move()` must be implemented. All other methods have default
/// implementations that can be overridden as needed.
///
/// # Method Behavior
///
/// ## `choose_move()`
/// - Receives the current position by mutable reference; implementations may
///   push and pop moves while thinking but must leave it as they found it
/// - Returns the chosen move in SAN, legal in the given position
/// - Fails with [`EngineError::NoLegalMove`] when the side to move has no move
///
/// ## `new_game()`
/// - Default: Does nothing
/// - Override: To reset per-game state (caches, opening book progress, move records)
///
/// ## `name()`
/// - Default: Returns "Player"
///
/// ## `as_learning_player()`
/// - Default: `None`
/// - Override: Learning players return `Some(self)`
pub trait Player {
    /// Pick a move for the side to move in `pos`, in SAN.
    fn choose_move(&mut self, pos: &mut Position) -> Result<String>;

    /// Prepare for a new game.
    fn new_game(&mut self) {}

    /// Get the player's display name.
    fn name(&self) -> &str {
        "Player"
    }

    /// The learning capability of this player, if it has one.
    fn as_learning_player(&mut self) -> Option<&mut dyn LearningPlayer> {
        None
    }
}

/// A player that improves from game results.
pub trait LearningPlayer {
    /// Feed back the result of a finished (or abandoned) game.
    ///
    /// `color` is the side this player had; `final_position` is where the game
    /// stopped and is used to judge unfinished games on material.
    fn end_game(&mut self, result: GameResult, final_position: &Position, color: Color);

    fn learning_stats(&self) -> LearningStats;
}
