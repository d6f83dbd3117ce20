//! Full games between the engine's players
//!
//! This test suite checks:
//! - Every move a player returns is legal in the position it was asked about
//! - Games end cleanly and the result is reported to learning players
//! - The search player beats a random mover on material in a short game

use chess_learner::agent::ai::{BookConfig, LearningConfig, LearningManager, PlayerConfig, SearchConfig};
use chess_learner::agent::{GameResult, Player, RandomPlayer, TreePlayer};
use chess_learner::game_repr::{Color, Position};
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fast_config() -> PlayerConfig {
    PlayerConfig {
        search: SearchConfig {
            max_depth: 2,
            time_limit: Duration::from_millis(500),
            tt_capacity: 50_000,
            ..SearchConfig::default()
        },
        opening_book: BookConfig::default(),
        ..PlayerConfig::default()
    }
}

/// Play until the game ends or `max_plies` moves were made
fn play<'a>(white: &'a mut dyn Player, black: &'a mut dyn Player, max_plies: usize) -> Position {
    let mut pos = Position::default();
    white.new_game();
    black.new_game();
    for _ in 0..max_plies {
        if pos.is_game_over() {
            break;
        }
        let mover: &mut dyn Player = if pos.side_to_move() == Color::White {
            &mut *white
        } else {
            &mut *black
        };
        let san = mover.choose_move(&mut pos).unwrap();
        pos.push_san(&san)
            .unwrap_or_else(|e| panic!("{} played illegal {}: {}", mover.name(), san, e));
    }
    pos
}

#[test]
fn test_tree_player_vs_random() {
    init_logging();
    let mut engine = TreePlayer::new(fast_config()).with_seed(3);
    let mut random = RandomPlayer::seeded(3);

    let pos = play(&mut engine, &mut random, 40);
    let result = GameResult::from_position(&pos).unwrap_or(GameResult::Unfinished);
    assert_ne!(result, GameResult::BlackWins, "lost to a random mover: {}", pos.fen());
    assert!(
        result == GameResult::WhiteWins
            || chess_learner::agent::ai::evaluation::material_for(&pos, Color::White) >= 0,
        "behind on material against a random mover: {}",
        pos.fen()
    );
}

#[test]
fn test_learning_player_reports_results() {
    init_logging();
    let learning = LearningManager::in_memory(LearningConfig::default());
    let config = PlayerConfig {
        opening_book: BookConfig {
            enabled: false,
            max_moves: 0,
        },
        ..fast_config()
    };
    let mut engine = TreePlayer::new(config).with_seed(8).with_learning(learning);
    let mut random = RandomPlayer::seeded(8);

    let pos = play(&mut random, &mut engine, 30);
    let result = GameResult::from_position(&pos).unwrap_or(GameResult::Unfinished);

    let learner = engine.as_learning_player().expect("learning enabled");
    learner.end_game(result, &pos, Color::Black);
    let stats = learner.learning_stats();
    assert_eq!(stats.games_played, 1);
    assert_eq!(stats.wins + stats.draws + stats.losses, 1);
    assert!(stats.positions_learned > 0);
    assert!(stats.exploration_rate < LearningConfig::default().explore_start);
}

#[test]
fn test_engine_self_play_stays_legal() {
    init_logging();
    let mut white = TreePlayer::new(fast_config()).with_seed(1).with_name("White");
    let mut black = TreePlayer::new(fast_config()).with_seed(2).with_name("Black");
    let pos = play(&mut white, &mut black, 24);
    assert!(pos.stack_depth() > 0);
}

#[test]
fn test_rook_ending_is_converted() {
    init_logging();
    let quiet_config = |depth| PlayerConfig {
        search: SearchConfig {
            max_depth: depth,
            time_limit: Duration::from_secs(60),
            tt_capacity: 200_000,
            ..SearchConfig::default()
        },
        opening_book: BookConfig {
            enabled: false,
            max_moves: 0,
        },
        ..PlayerConfig::default()
    };
    // The winner keeps one transposition table for the whole game
    let mut winner = TreePlayer::new(quiet_config(5)).with_name("Winner");
    let mut defender = TreePlayer::new(quiet_config(2)).with_name("Defender");

    let mut pos = Position::from_fen("8/8/2k5/8/R7/8/8/4K3 w - - 0 1").unwrap();
    for _ in 0..100 {
        if pos.is_game_over() {
            break;
        }
        let mover: &mut dyn Player = if pos.side_to_move() == Color::White {
            &mut winner
        } else {
            &mut defender
        };
        let san = mover.choose_move(&mut pos).unwrap();
        pos.push_san(&san).unwrap();
        assert_eq!(
            pos.pieces(chess_learner::game_repr::Piece::Rook, Color::White).popcnt(),
            1,
            "rook lost after {}: {}",
            san,
            pos.fen()
        );
    }

    assert!(pos.is_checkmate(), "no mate, ended in {}", pos.fen());
    assert_eq!(pos.side_to_move(), Color::Black);
}
