//! Shared transposition table.
//!
//! Clusters of three entries, probed and stored by all search threads
//! without locks. Each entry is a pair of 64-bit atomics: the data word
//! packs move, score, static eval, depth and generation+bound; the key
//! word holds the position key XOR-folded with the data word, so a torn
//! read (key from one write, data from another) fails verification and is
//! treated as a miss.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::board::Move;
use crate::search::constants::{MATE_IN_MAX_PLY, SCORE_NONE};

/// Default table size in MB.
pub const DEFAULT_TT_MB: usize = 64;

/// Bound type of a stored score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Score is at most the stored value (fail-low).
    Upper = 1,
    /// Score is at least the stored value (fail-high).
    Lower = 2,
    /// Score is exact (PV node searched with an open window).
    Exact = 3,
}

impl Bound {
    fn from_bits(bits: u8) -> Option<Bound> {
        match bits {
            1 => Some(Bound::Upper),
            2 => Some(Bound::Lower),
            3 => Some(Bound::Exact),
            _ => None,
        }
    }
}

/// Decoded transposition entry.
#[derive(Clone, Copy, Debug)]
pub struct TtData {
    pub mv: Move,
    /// Search score, already converted back to distance-from-root.
    pub score: i32,
    pub eval: i32,
    pub depth: i32,
    pub bound: Bound,
    pub pv: bool,
}

// Data word layout, low to high:
// move(16) | score(i16) | eval(i16) | depth(u8) | gen+pv+bound(u8)
const GEN_DELTA: u8 = 8;
const GEN_MASK: u8 = 0xF8;

#[derive(Default)]
struct TtEntry {
    key: AtomicU64,
    data: AtomicU64,
}

#[repr(align(64))]
#[derive(Default)]
struct Cluster {
    entries: [TtEntry; 3],
}

fn pack(mv: Move, score: i32, eval: i32, depth: i32, gen_bound: u8) -> u64 {
    (mv.as_u16() as u64)
        | ((score.clamp(i16::MIN as i32, i16::MAX as i32) as i16 as u16 as u64) << 16)
        | ((eval.clamp(i16::MIN as i32, i16::MAX as i32) as i16 as u16 as u64) << 32)
        | ((depth.clamp(0, 255) as u64) << 48)
        | ((gen_bound as u64) << 56)
}

fn unpack_move(data: u64) -> Move {
    Move::from_u16(data as u16)
}

fn unpack_score(data: u64) -> i32 {
    (data >> 16) as u16 as i16 as i32
}

fn unpack_eval(data: u64) -> i32 {
    (data >> 32) as u16 as i16 as i32
}

fn unpack_depth(data: u64) -> i32 {
    ((data >> 48) & 0xFF) as i32
}

fn unpack_gen_bound(data: u64) -> u8 {
    (data >> 56) as u8
}

/// Mate scores are stored relative to the probing node, not the root.
fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_IN_MAX_PLY {
        score + ply as i32
    } else if score <= -MATE_IN_MAX_PLY {
        score - ply as i32
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_IN_MAX_PLY {
        score - ply as i32
    } else if score <= -MATE_IN_MAX_PLY {
        score + ply as i32
    } else {
        score
    }
}

/// The shared hash table. All methods take `&self`; concurrent racy use
/// from many threads is expected, with the XOR check rejecting torn
/// entries.
pub struct TranspositionTable {
    clusters: Vec<Cluster>,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Allocate a table of roughly `mb` megabytes.
    #[must_use]
    pub fn new(mb: usize) -> Self {
        let bytes = mb.max(1) * 1024 * 1024;
        let count = (bytes / std::mem::size_of::<Cluster>()).max(1);
        let mut clusters = Vec::with_capacity(count);
        clusters.resize_with(count, Cluster::default);
        TranspositionTable {
            clusters,
            generation: AtomicU8::new(0),
        }
    }

    /// Zero every entry and reset the generation.
    pub fn clear(&self) {
        for cluster in &self.clusters {
            for entry in &cluster.entries {
                entry.key.store(0, Ordering::Relaxed);
                entry.data.store(0, Ordering::Relaxed);
            }
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Advance the generation; called once per `go`.
    pub fn new_search(&self) {
        self.generation.fetch_add(GEN_DELTA, Ordering::Relaxed);
    }

    #[inline]
    fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed) & GEN_MASK
    }

    #[inline]
    fn cluster_index(&self, key: u64) -> usize {
        // Multiply-high maps the key uniformly without a power-of-two
        // size requirement.
        ((u128::from(key) * self.clusters.len() as u128) >> 64) as usize
    }

    /// Age of an entry in generations, scaled by 8 and wrapping mod 32.
    #[inline]
    fn relative_age(&self, gen_bound: u8) -> i32 {
        i32::from(
            (256u16 + u16::from(self.generation()) - u16::from(gen_bound & GEN_MASK)) as u8
                & GEN_MASK,
        )
    }

    /// Look up `key`. A hit refreshes the entry's generation.
    #[must_use]
    pub fn probe(&self, key: u64, ply: usize) -> Option<TtData> {
        let cluster = &self.clusters[self.cluster_index(key)];
        for entry in &cluster.entries {
            let data = entry.data.load(Ordering::Relaxed);
            let stored_key = entry.key.load(Ordering::Relaxed);
            if data == 0 || stored_key ^ data != key {
                continue;
            }
            let gen_bound = unpack_gen_bound(data);
            let bound = Bound::from_bits(gen_bound & 3)?;

            // Refresh generation so the entry survives replacement.
            let refreshed =
                (data & !((GEN_MASK as u64) << 56)) | ((self.generation() as u64) << 56);
            entry.data.store(refreshed, Ordering::Relaxed);
            entry.key.store(key ^ refreshed, Ordering::Relaxed);

            return Some(TtData {
                mv: unpack_move(data),
                score: score_from_tt(unpack_score(data), ply),
                eval: unpack_eval(data),
                depth: unpack_depth(data),
                bound,
                pv: gen_bound & 4 != 0,
            });
        }
        None
    }

    /// Store an entry for `key`.
    ///
    /// Within the cluster the victim slot is the one minimising
    /// `depth - 8 * age`. A slot already holding `key` is never replaced by
    /// shallower data unless the new bound is exact at equal depth or the
    /// old entry is from an earlier search.
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &self,
        key: u64,
        mv: Move,
        score: i32,
        eval: i32,
        depth: i32,
        bound: Bound,
        pv: bool,
        ply: usize,
    ) {
        let cluster = &self.clusters[self.cluster_index(key)];
        let generation = self.generation();

        let mut victim: Option<&TtEntry> = None;
        let mut victim_score = i32::MAX;
        let mut matching: Option<(&TtEntry, u64)> = None;

        for entry in &cluster.entries {
            let data = entry.data.load(Ordering::Relaxed);
            let stored_key = entry.key.load(Ordering::Relaxed);
            if data != 0 && stored_key ^ data == key {
                matching = Some((entry, data));
                break;
            }
            let slot_score = if data == 0 {
                i32::MIN
            } else {
                unpack_depth(data) - self.relative_age(unpack_gen_bound(data))
            };
            if slot_score < victim_score {
                victim_score = slot_score;
                victim = Some(entry);
            }
        }

        let score = score_to_tt(if score == SCORE_NONE { 0 } else { score }, ply);

        if let Some((entry, old_data)) = matching {
            let old_depth = unpack_depth(old_data);
            let old_gen_bound = unpack_gen_bound(old_data);
            let old_stale = old_gen_bound & GEN_MASK != generation;
            let overwrite = old_stale
                || depth > old_depth
                || (depth == old_depth
                    && (bound == Bound::Exact || bound as u8 >= (old_gen_bound & 3)));
            if !overwrite {
                // Keep the deeper data, but adopt a new best move if we
                // found one.
                if mv.is_some() && mv != unpack_move(old_data) {
                    let updated = (old_data & !0xFFFF) | u64::from(mv.as_u16());
                    entry.data.store(updated, Ordering::Relaxed);
                    entry.key.store(key ^ updated, Ordering::Relaxed);
                }
                return;
            }
            let kept_move = if mv.is_some() { mv } else { unpack_move(old_data) };
            let gen_bound = generation | (u8::from(pv) << 2) | bound as u8;
            let data = pack(kept_move, score, eval, depth, gen_bound);
            entry.data.store(data, Ordering::Relaxed);
            entry.key.store(key ^ data, Ordering::Relaxed);
            return;
        }

        let entry = victim.expect("cluster always has a victim slot");
        let gen_bound = generation | (u8::from(pv) << 2) | bound as u8;
        let data = pack(mv, score, eval, depth, gen_bound);
        entry.data.store(data, Ordering::Relaxed);
        entry.key.store(key ^ data, Ordering::Relaxed);
    }

    /// Approximate permille of the table filled during this search.
    #[must_use]
    pub fn hashfull(&self) -> u32 {
        let sample = self.clusters.len().min(1000);
        let generation = self.generation();
        let mut filled = 0u32;
        for cluster in &self.clusters[..sample] {
            for entry in &cluster.entries {
                let data = entry.data.load(Ordering::Relaxed);
                if data != 0 && unpack_gen_bound(data) & GEN_MASK == generation {
                    filled += 1;
                }
            }
        }
        filled * 1000 / (sample as u32 * 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Move, Square};
    use crate::search::constants::MATE;

    fn any_move() -> Move {
        Move::new(Square::new(1, 4), Square::new(3, 4))
    }

    #[test]
    fn test_store_and_probe() {
        let tt = TranspositionTable::new(1);
        let key = 0xDEAD_BEEF_1234_5678;
        tt.store(key, any_move(), 42, 17, 8, Bound::Exact, true, 0);

        let hit = tt.probe(key, 0).expect("entry should be found");
        assert_eq!(hit.mv, any_move());
        assert_eq!(hit.score, 42);
        assert_eq!(hit.eval, 17);
        assert_eq!(hit.depth, 8);
        assert_eq!(hit.bound, Bound::Exact);
        assert!(hit.pv);
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let tt = TranspositionTable::new(1);
        tt.store(1, any_move(), 0, 0, 1, Bound::Lower, false, 0);
        assert!(tt.probe(2, 0).is_none());
    }

    #[test]
    fn test_xor_rejects_corrupt_entries() {
        let tt = TranspositionTable::new(1);
        let key = 0x1111_2222_3333_4444u64;
        tt.store(key, any_move(), 10, 0, 5, Bound::Exact, false, 0);

        // Corrupt the data word without touching the key word, as a torn
        // concurrent write would.
        let idx = tt.cluster_index(key);
        for entry in &tt.clusters[idx].entries {
            let data = entry.data.load(Ordering::Relaxed);
            if data != 0 {
                entry.data.store(data ^ 0xFF00, Ordering::Relaxed);
            }
        }
        assert!(tt.probe(key, 0).is_none());
    }

    #[test]
    fn test_mate_score_normalisation() {
        let tt = TranspositionTable::new(1);
        let key = 99;
        // Mate found 5 plies from root, stored at ply 5.
        tt.store(key, any_move(), MATE - 5, 0, 10, Bound::Exact, false, 5);
        // Probing at ply 3 must see mate 2 plies later.
        let hit = tt.probe(key, 3).unwrap();
        assert_eq!(hit.score, MATE - 5 - 5 + 3);
    }

    #[test]
    fn test_same_key_not_replaced_by_shallower() {
        let tt = TranspositionTable::new(1);
        let key = 7;
        tt.store(key, any_move(), 100, 0, 12, Bound::Exact, false, 0);
        tt.store(key, Move::NONE, 50, 0, 3, Bound::Upper, false, 0);
        let hit = tt.probe(key, 0).unwrap();
        assert_eq!(hit.depth, 12);
        assert_eq!(hit.score, 100);
    }

    #[test]
    fn test_deeper_data_replaces() {
        let tt = TranspositionTable::new(1);
        let key = 7;
        tt.store(key, any_move(), 100, 0, 3, Bound::Upper, false, 0);
        tt.store(key, any_move(), 60, 0, 9, Bound::Lower, false, 0);
        let hit = tt.probe(key, 0).unwrap();
        assert_eq!(hit.depth, 9);
        assert_eq!(hit.bound, Bound::Lower);
    }

    #[test]
    fn test_clear() {
        let tt = TranspositionTable::new(1);
        tt.store(3, any_move(), 1, 0, 1, Bound::Exact, false, 0);
        tt.clear();
        assert!(tt.probe(3, 0).is_none());
    }

    #[test]
    fn test_random_keys_no_phantom_hits() {
        use rand::prelude::*;
        let tt = TranspositionTable::new(1);
        let mut rng = StdRng::seed_from_u64(7);
        let mut stored = std::collections::HashMap::new();

        for _ in 0..10_000 {
            let key: u64 = rng.gen();
            let score = rng.gen_range(-1000..1000);
            tt.store(key, Move::NONE, score, 0, rng.gen_range(0..60), Bound::Exact, false, 0);
            stored.insert(key, score);
        }
        for (key, score) in stored {
            if let Some(hit) = tt.probe(key, 0) {
                // A hit must return a value that was written for this key.
                assert_eq!(hit.score, score);
            }
        }
    }
}
