//! Random player: a baseline opponent that plays any legal move.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::agent::player::Player;
use crate::error::{EngineError, Result};
use crate::game_repr::Position;

/// Plays a uniformly random legal move
pub struct RandomPlayer {
    rng: Xoshiro256PlusPlus,
}

impl RandomPlayer {
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
        }
    }

    /// Reproducible move sequence
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for RandomPlayer {
    fn choose_move(&mut self, pos: &mut Position) -> Result<String> {
        let legal = pos.legal_moves();
        let mv = legal
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| EngineError::NoLegalMove { fen: pos.fen() })?;
        Ok(pos.san(mv))
    }

    fn name(&self) -> &str {
        "Random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plays_legal_moves_until_the_end() {
        let mut player = RandomPlayer::seeded(5);
        let mut pos = Position::default();
        for _ in 0..60 {
            if pos.is_game_over() {
                break;
            }
            let san = player.choose_move(&mut pos).unwrap();
            pos.push_san(&san).unwrap();
        }
    }

    #[test]
    fn test_same_seed_same_moves() {
        let mut a = RandomPlayer::seeded(9);
        let mut b = RandomPlayer::seeded(9);
        let mut pos = Position::default();
        assert_eq!(a.choose_move(&mut pos).unwrap(), b.choose_move(&mut pos).unwrap());
    }

    #[test]
    fn test_stalemate_is_an_error() {
        let mut pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(RandomPlayer::seeded(1).choose_move(&mut pos).is_err());
    }
}
