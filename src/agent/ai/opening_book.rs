// Small opening book
//
// Positions are keyed by the first three FEN fields (placement, side to move,
// castling rights), so move counters and en-passant availability do not
// matter. Each entry lists SAN candidates; one is picked at random.

use std::collections::HashMap;
use std::sync::LazyLock;

use chess::ChessMove;
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

use super::config::BookConfig;
use crate::game_repr::Position;

#[rustfmt::skip]
static BOOK_LINES: &[(&str, &[&str])] = &[
    // Start position
    ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq", &["e4", "d4", "c4", "Nf3", "g3", "b3"]),
    // 1.e4
    ("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq", &["e5", "c5", "e6", "c6", "d6", "g6", "d5"]),
    // 1.d4
    ("rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq", &["d5", "Nf6", "e6", "f5", "c5", "g6"]),
    // 1.c4
    ("rnbqkbnr/pppppppp/8/8/2P5/8/PP1PPPPP/RNBQKBNR b KQkq", &["e5", "c5", "Nf6", "e6", "g6", "c6"]),
    // 1.Nf3
    ("rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq", &["d5", "Nf6", "c5", "g6", "e6"]),
    // 1.e4 e5
    ("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq", &["Nf3", "Nc3", "Bc4", "f4", "d4"]),
    // 1.e4 e5 2.Nf3
    ("rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq", &["Nc6", "Nf6", "d6", "f5"]),
    // 1.e4 e5 2.Nf3 Nc6
    ("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq", &["Bb5", "Bc4", "d4", "Nc3"]),
    // Sicilian: 1.e4 c5
    ("rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq", &["Nf3", "Nc3", "d4", "c3"]),
    // 1.e4 c5 2.Nf3
    ("rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq", &["d6", "Nc6", "e6", "g6"]),
    // French: 1.e4 e6
    ("rnbqkbnr/pppp1ppp/4p3/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq", &["d4", "Nf3", "Nc3", "d3"]),
    // 1.e4 e6 2.d4
    ("rnbqkbnr/pppp1ppp/4p3/8/3PP3/8/PPP2PPP/RNBQKBNR b KQkq", &["d5", "Nf6", "c5", "b6"]),
    // Caro-Kann: 1.e4 c6
    ("rnbqkbnr/pp1ppppp/2p5/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq", &["d4", "Nf3", "Nc3", "d3"]),
    // Pirc: 1.e4 d6
    ("rnbqkbnr/ppp1pppp/3p4/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq", &["d4", "Nf3", "Nc3", "f4"]),
    // Scandinavian: 1.e4 d5
    ("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq", &["exd5", "Nc3", "e5"]),
    // 1.d4 d5
    ("rnbqkbnr/ppp1pppp/8/3p4/3P4/8/PPP1PPPP/RNBQKBNR w KQkq", &["c4", "Nf3", "Nc3", "Bf4", "e3"]),
    // Queen's Gambit: 1.d4 d5 2.c4
    ("rnbqkbnr/ppp1pppp/8/3p4/2PP4/8/PP2PPPP/RNBQKBNR b KQkq", &["e6", "c6", "dxc4", "Nf6", "e5"]),
    // 1.d4 Nf6
    ("rnbqkb1r/pppppppp/5n2/8/3P4/8/PPP1PPPP/RNBQKBNR w KQkq", &["c4", "Nf3", "Bg5", "e3", "f3"]),
    // Indian defences: 1.d4 Nf6 2.c4
    ("rnbqkb1r/pppppppp/5n2/8/2PP4/8/PP2PPPP/RNBQKBNR b KQkq", &["g6", "e6", "c5", "d5", "c6"]),
    // Dutch: 1.d4 f5
    ("rnbqkbnr/ppppp1pp/8/5p2/3P4/8/PPP1PPPP/RNBQKBNR w KQkq", &["g3", "Nf3", "c4", "Bg5", "e3"]),
];

static BOOK: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| BOOK_LINES.iter().copied().collect());

/// Placement, side to move and castling rights of `pos`
pub fn book_key(pos: &Position) -> String {
    pos.fen().split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}

/// SAN candidates for `pos`, if the book knows it
pub fn candidates(pos: &Position) -> Option<&'static [&'static str]> {
    BOOK.get(book_key(pos).as_str()).copied()
}

/// Per-game book state: how many moves came from the book, and whether it
/// has already missed
#[derive(Debug, Clone)]
pub struct OpeningBook {
    enabled: bool,
    max_moves: u32,
    moves_played: u32,
}

impl OpeningBook {
    pub fn new(config: &BookConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_moves: config.max_moves,
            moves_played: 0,
        }
    }

    pub fn reset(&mut self) {
        self.moves_played = 0;
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.moves_played < self.max_moves
    }

    pub fn moves_played(&self) -> u32 {
        self.moves_played
    }

    /// A random book move for `pos`. The first miss closes the book for the
    /// rest of the game.
    pub fn probe<R: Rng + ?Sized>(&mut self, pos: &Position, rng: &mut R) -> Option<ChessMove> {
        if !self.is_active() {
            return None;
        }

        if let Some(list) = candidates(pos) {
            let mut shuffled = list.to_vec();
            shuffled.shuffle(rng);
            for san in shuffled {
                match pos.parse_san(san) {
                    Ok(mv) => {
                        self.moves_played += 1;
                        return Some(mv);
                    }
                    Err(err) => trace!("skipping book move {}: {}", san, err),
                }
            }
        }

        self.moves_played = self.max_moves;
        None
    }
}
