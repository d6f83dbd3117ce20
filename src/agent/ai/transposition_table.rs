use chess::ChessMove;

use super::evaluation::MATE_THRESHOLD;
use super::lru::LruMap;

/// Convert a root-relative mate score found `ply` plies down into one
/// relative to the node, so it stays valid wherever the node is reached again.
#[inline]
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`] for a node probed `ply` plies below the root
#[inline]
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

/// Bound kind of a stored score
///
/// This is crucial for alpha-beta pruning:
/// - Exact: the true value of the position
/// - Lower: the true value is at least the score (a beta cutoff happened)
/// - Upper: the true value is at most the score (every move failed low)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

/// Entry in the transposition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTEntry {
    /// Zobrist hash of the position
    pub hash: u64,
    /// Score from the side to move's point of view (centipawns)
    pub score: i32,
    pub bound: Bound,
    /// Remaining depth the score was searched to
    pub depth: u8,
    /// Best move found in this position
    pub best_move: Option<ChessMove>,
}

impl TTEntry {
    /// Can this entry stand in for a search of `depth`?
    #[inline]
    pub fn usable_at(&self, depth: u8) -> bool {
        self.depth >= depth
    }
}

/// Transposition table with a fixed capacity and strict LRU eviction.
///
/// Both `get` and `put` refresh recency, so positions the search keeps
/// revisiting survive while stale branches age out.
pub struct TranspositionTable {
    table: LruMap<TTEntry>,
    /// Statistics: number of successful probes
    pub hits: u64,
    /// Statistics: number of failed probes
    pub misses: u64,
}

impl TranspositionTable {
    pub const DEFAULT_CAPACITY: usize = 400_000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: LruMap::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Probe for `hash`, refreshing the entry's recency on a hit.
    pub fn get(&mut self, hash: u64) -> Option<TTEntry> {
        match self.table.get(hash) {
            Some(entry) if entry.hash == hash => {
                self.hits += 1;
                Some(*entry)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a search result, evicting the least recently used entry when full.
    pub fn put(&mut self, hash: u64, score: i32, bound: Bound, depth: u8, best_move: Option<ChessMove>) {
        self.table.insert(
            hash,
            TTEntry {
                hash,
                score,
                bound,
                depth,
                best_move,
            },
        );
    }

    /// Clear the table and its statistics
    pub fn clear(&mut self) {
        self.table.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.table.contains(hash)
    }

    /// Get hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Square;

    fn e2e4() -> ChessMove {
        ChessMove::new(Square::E2, Square::E4, None)
    }

    #[test]
    fn test_put_and_get() {
        let mut table = TranspositionTable::with_capacity(100);
        let hash = 0x1234_5678_90AB_CDEF;
        table.put(hash, 100, Bound::Exact, 5, Some(e2e4()));

        let entry = table.get(hash).unwrap();
        assert_eq!(entry.hash, hash);
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.score, 100);
        assert_eq!(entry.bound, Bound::Exact);
        assert_eq!(entry.best_move, Some(e2e4()));
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let mut table = TranspositionTable::with_capacity(100);
        table.put(7, 50, Bound::Lower, 3, None);
        table.put(7, 80, Bound::Upper, 1, None);
        let entry = table.get(7).unwrap();
        assert_eq!(entry.score, 80);
        assert_eq!(entry.bound, Bound::Upper);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_capacity_and_lru_eviction() {
        let capacity = 8;
        let mut table = TranspositionTable::with_capacity(capacity);
        for hash in 0..capacity as u64 {
            table.put(hash, 0, Bound::Exact, 1, None);
        }
        // Touch key 0 so key 1 becomes the least recently used
        assert!(table.get(0).is_some());
        table.put(capacity as u64, 0, Bound::Exact, 1, None);

        assert_eq!(table.len(), capacity);
        assert!(table.contains(0));
        assert!(!table.contains(1));
        assert!(table.contains(capacity as u64));
    }

    #[test]
    fn test_depth_usability() {
        let entry = TTEntry {
            hash: 1,
            score: 0,
            bound: Bound::Exact,
            depth: 4,
            best_move: None,
        };
        assert!(entry.usable_at(3));
        assert!(entry.usable_at(4));
        assert!(!entry.usable_at(5));
    }

    #[test]
    fn test_clear_resets_statistics() {
        let mut table = TranspositionTable::with_capacity(100);
        table.put(123, 100, Bound::Exact, 5, None);
        assert_eq!(table.len(), 1);

        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.hits, 0);
        assert_eq!(table.misses, 0);
    }

    #[test]
    fn test_hit_rate() {
        let mut table = TranspositionTable::with_capacity(100);
        table.put(123, 100, Bound::Exact, 5, None);

        // One hit
        table.get(123);
        // One miss
        table.get(456);

        assert_eq!(table.hit_rate(), 0.5);
    }

    #[test]
    fn test_mate_scores_move_with_the_node() {
        use crate::agent::ai::evaluation::{mate_bonus, MATE_SCORE};

        // Mate found 5 plies below the root, stored at a node 2 plies down
        let found = MATE_SCORE + mate_bonus(5);
        let stored = score_to_tt(found, 2);
        assert_eq!(score_from_tt(stored, 2), found);
        // Reached 4 plies down, the same node is two plies further from the
        // root and so is the mate
        assert_eq!(score_from_tt(stored, 4), MATE_SCORE + mate_bonus(7));
        assert_eq!(score_from_tt(score_to_tt(-found, 3), 1), -(MATE_SCORE + mate_bonus(3)));
        // Ordinary scores pass through untouched
        assert_eq!(score_to_tt(250, 9), 250);
        assert_eq!(score_from_tt(-250, 9), -250);
    }
}
