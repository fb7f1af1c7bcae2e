use crate::evaluation::{Score, MATE_THRESHOLD};
use crate::r#move::Move;
use crate::zob_hash::Hash;

/// Number of slots in the table; power of two so indexing is a cheap mask.
pub const TT_SIZE: usize = 1 << 20;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeType {
    Exact,
    LowerBound,
    UpperBound,
}

#[derive(Copy, Clone)]
pub struct TTEntry {
    pub key: Hash,
    pub depth: i32,
    pub score: Score,
    pub node_type: NodeType,
    pub best_move: Move,
    pub valid: bool,
}
impl Default for TTEntry {
    fn default() -> Self {
        TTEntry {
            key: 0,
            depth: 0,
            score: 0,
            node_type: NodeType::Exact,
            best_move: Move::NULL,
            valid: false,
        }
    }
}

/// A flat, fixed-size cache of search results keyed by Zobrist hash.
/// Collisions on the index are resolved by the replacement policy alone; a
/// slot with a matching key but different bounds is normal and the stored
/// score is only trusted within its node-type window.
pub struct TranspositionTable {
    entries: Vec<TTEntry>,
}

impl TranspositionTable {
    pub fn new(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        TranspositionTable {
            entries: vec![TTEntry::default(); size],
        }
    }

    fn index(&self, key: Hash) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    pub fn clear(&mut self) {
        self.entries.fill(TTEntry::default());
    }

    /// Overwrites when the slot is empty, holds the same position, or the
    /// new entry was searched at least as deep.
    pub fn store(
        &mut self,
        key: Hash,
        depth: i32,
        ply: usize,
        score: Score,
        node_type: NodeType,
        best_move: Move,
    ) {
        let index = self.index(key);
        let entry = &mut self.entries[index];

        if !entry.valid || entry.key == key || depth >= entry.depth {
            *entry = TTEntry {
                key,
                depth,
                score: to_tt_score(score, ply),
                node_type,
                best_move,
                valid: true,
            };
        }
    }

    /// Returns the stored move for ordering, plus a score when the entry is
    /// deep enough and its bound collapses the caller's window.
    pub fn probe(
        &self,
        key: Hash,
        depth: i32,
        mut alpha: Score,
        mut beta: Score,
        ply: usize,
    ) -> (Option<Move>, Option<Score>) {
        let entry = &self.entries[self.index(key)];
        if !entry.valid || entry.key != key {
            return (None, None);
        }

        let tt_score = from_tt_score(entry.score, ply);
        if entry.depth >= depth {
            match entry.node_type {
                NodeType::Exact => return (Some(entry.best_move), Some(tt_score)),
                NodeType::LowerBound => alpha = alpha.max(tt_score),
                NodeType::UpperBound => beta = beta.min(tt_score),
            }
            if alpha >= beta {
                return (Some(entry.best_move), Some(tt_score));
            }
        }

        (Some(entry.best_move), None)
    }
}

// Mate scores are stored relative to the current node rather than the root,
// so the same position reached at different root depths keeps an accurate
// distance to mate.
fn to_tt_score(score: Score, ply: usize) -> Score {
    if score >= MATE_THRESHOLD {
        score + ply as Score
    } else if score <= -MATE_THRESHOLD {
        score - ply as Score
    } else {
        score
    }
}

fn from_tt_score(score: Score, ply: usize) -> Score {
    if score >= MATE_THRESHOLD {
        score - ply as Score
    } else if score <= -MATE_THRESHOLD {
        score + ply as Score
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::MATE_VALUE;

    #[test]
    fn store_and_probe_round_trip() {
        let mut tt = TranspositionTable::new(1 << 10);
        tt.store(42, 5, 0, 120, NodeType::Exact, Move::NULL);

        let (mv, score) = tt.probe(42, 5, -1000, 1000, 0);
        assert_eq!(mv, Some(Move::NULL));
        assert_eq!(score, Some(120));

        // Shallower entries only hand back the move
        let (mv, score) = tt.probe(42, 6, -1000, 1000, 0);
        assert_eq!(mv, Some(Move::NULL));
        assert_eq!(score, None);
    }

    #[test]
    fn deeper_entries_survive_replacement() {
        let mut tt = TranspositionTable::new(1 << 10);
        let colliding = 42 + (1 << 10);
        tt.store(42, 8, 0, 50, NodeType::Exact, Move::NULL);
        tt.store(colliding, 3, 0, -50, NodeType::Exact, Move::NULL);

        assert_eq!(tt.probe(42, 1, -1000, 1000, 0).1, Some(50));
        assert_eq!(tt.probe(colliding, 1, -1000, 1000, 0), (None, None));
    }

    #[test]
    fn mate_scores_shift_with_the_ply() {
        let mut tt = TranspositionTable::new(1 << 10);
        // Mate found 4 plies below a node at ply 6
        tt.store(7, 3, 6, MATE_VALUE - 10, NodeType::Exact, Move::NULL);
        // Reaching the same node at ply 2 must see the mate 4 plies closer
        assert_eq!(tt.probe(7, 3, -40_000, 40_000, 2).1, Some(MATE_VALUE - 6));
    }
}
