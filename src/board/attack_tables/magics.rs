//! Magic bitboards for sliding-piece attacks.
//!
//! For each square this module stores a relevant-occupancy mask, a magic
//! multiplier, a shift, and an offset into a flat attack table. A lookup is
//! then mask, multiply, shift, index - no branches and no collisions.
//!
//! Magics are found once at startup by seeded random search: sparse random
//! candidates are tested against every blocker subset of the mask
//! (enumerated with the Carry-Rippler trick) until one hashes them without
//! destructive collisions.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::board::types::{Bitboard, Square};

const ROOK_DELTAS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_DELTAS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Total flat-table entries: sum over squares of 2^relevant_bits.
const ROOK_TABLE_SIZE: usize = 102_400;
const BISHOP_TABLE_SIZE: usize = 5_248;

/// Per-square magic lookup data.
#[derive(Clone, Copy, Default)]
struct MagicEntry {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: u32,
}

impl MagicEntry {
    #[inline]
    fn index(&self, occupied: u64) -> usize {
        let hash = (occupied & self.mask).wrapping_mul(self.magic) >> self.shift;
        self.offset as usize + hash as usize
    }
}

/// Magic data plus the flat attack table for one slider kind.
pub(crate) struct SliderAttacks {
    entries: [MagicEntry; 64],
    table: Vec<u64>,
}

impl SliderAttacks {
    #[inline]
    pub(crate) fn attacks(&self, sq: Square, occupied: u64) -> u64 {
        self.table[self.entries[sq.index()].index(occupied)]
    }
}

/// Walk rays from `sq` in the given directions, stopping at blockers.
/// This is the reference oracle; the magic tables must agree with it.
pub(crate) fn sliding_attack(deltas: &[(i8, i8); 4], sq: Square, occupied: u64) -> u64 {
    let mut attacks = 0u64;
    for &(dr, df) in deltas {
        let mut rank = sq.rank() as i8 + dr;
        let mut file = sq.file() as i8 + df;
        while (0..8).contains(&rank) && (0..8).contains(&file) {
            let bit = 1u64 << (rank as usize * 8 + file as usize);
            attacks |= bit;
            if occupied & bit != 0 {
                break;
            }
            rank += dr;
            file += df;
        }
    }
    attacks
}

pub(crate) fn rook_ray_attacks(sq: Square, occupied: u64) -> u64 {
    sliding_attack(&ROOK_DELTAS, sq, occupied)
}

pub(crate) fn bishop_ray_attacks(sq: Square, occupied: u64) -> u64 {
    sliding_attack(&BISHOP_DELTAS, sq, occupied)
}

/// Board edges that are irrelevant for a square's blocker mask.
fn edges_excluding(sq: Square) -> u64 {
    let ranks = (Bitboard::RANK_1.0 | Bitboard::RANK_8.0) & !Bitboard::rank_mask(sq.rank()).0;
    let files = (Bitboard::FILE_A.0 | Bitboard::FILE_H.0) & !Bitboard::file_mask(sq.file()).0;
    ranks | files
}

fn sparse_random(rng: &mut SmallRng) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

pub(crate) fn build(deltas: &[(i8, i8); 4], table_size: usize) -> SliderAttacks {
    let mut entries = [MagicEntry::default(); 64];
    let mut table = vec![0u64; table_size];

    // Fixed seed: the chosen magics do not affect lookup speed, only
    // reproducibility of startup.
    let mut rng = SmallRng::seed_from_u64(0x9e37_79b9_7f4a_7c15);

    // Collision scratch space, reused across squares via the epoch trick.
    let mut occupancies = [0u64; 4096];
    let mut reference = [0u64; 4096];
    let mut epoch = [0u32; 4096];
    let mut generation = 0u32;

    let mut offset = 0usize;
    for idx in 0..64 {
        let sq = Square::from_index(idx);
        let mask = sliding_attack(deltas, sq, 0) & !edges_excluding(sq);
        let bits = mask.count_ones();
        let shift = 64 - bits;
        let size = 1usize << bits;

        // Carry-Rippler: enumerate every subset of the mask.
        let mut occ = 0u64;
        for i in 0..size {
            occupancies[i] = occ;
            reference[i] = sliding_attack(deltas, sq, occ);
            occ = occ.wrapping_sub(mask) & mask;
        }

        let magic = loop {
            let candidate = sparse_random(&mut rng);
            // Entropy rejection: magics whose high product bits are mostly
            // zero collide too often to be worth verifying.
            if (mask.wrapping_mul(candidate) & 0xFF00_0000_0000_0000).count_ones() < 6 {
                continue;
            }

            generation += 1;
            let mut ok = true;
            for i in 0..size {
                let hash = (occupancies[i].wrapping_mul(candidate) >> shift) as usize;
                if epoch[hash] < generation {
                    epoch[hash] = generation;
                    table[offset + hash] = reference[i];
                } else if table[offset + hash] != reference[i] {
                    ok = false;
                    break;
                }
            }
            if ok {
                break candidate;
            }
        };

        // The verification loop may have left stale entries from rejected
        // candidates; refill with the winning magic.
        for i in 0..size {
            let hash = (occupancies[i].wrapping_mul(magic) >> shift) as usize;
            table[offset + hash] = reference[i];
        }

        entries[idx] = MagicEntry {
            mask,
            magic,
            shift,
            offset: offset as u32,
        };
        offset += size;
    }

    debug_assert_eq!(offset, table_size);
    SliderAttacks { entries, table }
}

pub(crate) fn build_rook_attacks() -> SliderAttacks {
    build(&ROOK_DELTAS, ROOK_TABLE_SIZE)
}

pub(crate) fn build_bishop_attacks() -> SliderAttacks {
    build(&BISHOP_DELTAS, BISHOP_TABLE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_magic_matches_ray_walk() {
        let rooks = build_rook_attacks();
        let bishops = build_bishop_attacks();
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..10_000 {
            let sq = Square::from_index(rng.gen_range(0..64));
            let occ: u64 = rng.gen::<u64>() & rng.gen::<u64>();
            assert_eq!(rooks.attacks(sq, occ), rook_ray_attacks(sq, occ));
            assert_eq!(bishops.attacks(sq, occ), bishop_ray_attacks(sq, occ));
        }
    }

    #[test]
    fn test_corner_rook_mask_size() {
        let rooks = build_rook_attacks();
        // a1 rook: full rank + file minus edges leaves 12 relevant bits.
        assert_eq!(rooks.entries[0].mask.count_ones(), 12);
        assert_eq!(rooks.entries[0].shift, 52);
    }
}
