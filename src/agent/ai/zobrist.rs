// Zobrist hashing
//
// Each (color, piece, square) triple, the side to move, the castling-rights
// nibble and the en-passant file get an independent 64-bit key. A position's
// hash is the XOR of the keys of everything present in it.
//
// The hash keys the transposition table and the persisted learning store, so
// the keys must be identical across runs: they come from a Xoshiro256++
// generator with a fixed seed, whose output is fixed by its algorithm.

use std::sync::LazyLock;

use chess::{Color, ALL_PIECES};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::game_repr::Position;

const SEED: u64 = 0xDEAD_BEEF;

pub struct ZobristKeys {
    /// [color][piece][square]
    pub pieces: [[[u64; 64]; 6]; 2],
    /// XORed in when White is to move
    pub side_to_move: u64,
    /// Indexed by the rights nibble: K=1, Q=2, k=4, q=8
    pub castling: [u64; 16],
    /// [file] of an available en-passant capture
    pub en_passant: [u64; 8],
}

impl ZobristKeys {
    fn generate() -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(SEED);

        let mut pieces = [[[0u64; 64]; 6]; 2];
        for color in &mut pieces {
            for piece in color {
                for square in piece {
                    *square = rng.gen();
                }
            }
        }

        let side_to_move = rng.gen();

        let mut castling = [0u64; 16];
        for key in &mut castling {
            *key = rng.gen();
        }

        let mut en_passant = [0u64; 8];
        for key in &mut en_passant {
            *key = rng.gen();
        }

        Self {
            pieces,
            side_to_move,
            castling,
            en_passant,
        }
    }
}

pub static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::generate);

/// Castling rights packed as K=1, Q=2, k=4, q=8
pub fn castling_index(pos: &Position) -> usize {
    let mut index = 0;
    if pos.has_kingside_castling_rights(Color::White) {
        index |= 1;
    }
    if pos.has_queenside_castling_rights(Color::White) {
        index |= 2;
    }
    if pos.has_kingside_castling_rights(Color::Black) {
        index |= 4;
    }
    if pos.has_queenside_castling_rights(Color::Black) {
        index |= 8;
    }
    index
}

/// Hash of the current position
pub fn hash(pos: &Position) -> u64 {
    let keys = &*ZOBRIST;
    let mut hash = 0u64;

    for color in [Color::White, Color::Black] {
        for piece in ALL_PIECES {
            for sq in pos.pieces(piece, color) {
                hash ^= keys.pieces[color.to_index()][piece.to_index()][sq.to_index()];
            }
        }
    }

    if pos.side_to_move() == Color::White {
        hash ^= keys.side_to_move;
    }

    hash ^= keys.castling[castling_index(pos)];

    // The board only records an en-passant square when a capture is possible
    if let Some(pawn_sq) = pos.board().en_passant() {
        hash ^= keys.en_passant[pawn_sq.get_file().to_index()];
    }

    hash
}

/// Key of a single piece, exposed for tests that check the XOR structure
#[cfg(test)]
pub(crate) fn piece_key(color: Color, piece: chess::Piece, sq: chess::Square) -> u64 {
    ZOBRIST.pieces[color.to_index()][piece.to_index()][sq.to_index()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{Piece, Square};

    #[test]
    fn test_hash_is_deterministic() {
        let pos = Position::default();
        assert_eq!(hash(&pos), hash(&Position::default()));
        assert_ne!(hash(&pos), 0);
    }

    #[test]
    fn test_hash_survives_push_pop() {
        let mut pos = Position::default();
        let before = hash(&pos);
        for san in ["e4", "c5", "Nf3"] {
            pos.push_san(san).unwrap();
        }
        assert_ne!(hash(&pos), before);
        while pos.stack_depth() > 0 {
            pos.pop();
        }
        assert_eq!(hash(&pos), before);
    }

    #[test]
    fn test_transposition_gives_same_hash() {
        let mut a = Position::default();
        for san in ["Nf3", "Nf6", "Nc3"] {
            a.push_san(san).unwrap();
        }
        let mut b = Position::default();
        for san in ["Nc3", "Nf6", "Nf3"] {
            b.push_san(san).unwrap();
        }
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_side_to_move_key() {
        let white = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let black = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(hash(&white) ^ hash(&black), ZOBRIST.side_to_move);
    }

    #[test]
    fn test_castling_rights_change_hash() {
        let all = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let none = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
        assert_eq!(castling_index(&all), 15);
        assert_eq!(castling_index(&none), 0);
        assert_eq!(
            hash(&all) ^ hash(&none),
            ZOBRIST.castling[15] ^ ZOBRIST.castling[0]
        );
    }

    #[test]
    fn test_piece_keys_compose_by_xor() {
        let bare = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let with_knight = Position::from_fen("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1").unwrap();
        assert_eq!(
            hash(&bare) ^ hash(&with_knight),
            piece_key(Color::White, Piece::Knight, Square::B1)
        );
    }

    /// Persisted learning files are keyed by these hashes; a change to the
    /// seed or the generator orphans every saved position.
    #[test]
    fn test_keys_are_pinned() {
        let keys = &*ZOBRIST;
        assert_eq!(keys.pieces[0][0][0], 0x0c52_0eb8_fea9_8ede);
        assert_eq!(keys.pieces[1][5][63], 0x2690_2f98_2e3c_0ff4);
        assert_eq!(keys.side_to_move, 0xc3f4_f229_9065_22dd);
        assert_eq!(keys.castling[0], 0x24eb_e8bc_90bd_e5f4);
        assert_eq!(keys.en_passant[7], 0x6416_4a63_81f2_b15e);
        assert_eq!(hash(&Position::default()), 0x4455_4329_bc3d_4e37);
    }

    #[test]
    fn test_keys_are_distinct() {
        let keys = &*ZOBRIST;
        let mut all: Vec<u64> = keys.pieces.iter().flatten().flatten().copied().collect();
        all.push(keys.side_to_move);
        all.extend_from_slice(&keys.castling);
        all.extend_from_slice(&keys.en_passant);
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
