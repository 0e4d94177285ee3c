//! Zobrist hashing for chess positions.
//!
//! Provides incrementally-updatable 64-bit position keys for the
//! transposition table and repetition detection.

use once_cell::sync::Lazy;
use rand::prelude::*;

pub(crate) struct ZobristKeys {
    /// piece[color][piece_type][square]
    pub(crate) piece: [[[u64; 64]; 6]; 2],
    pub(crate) side: u64,
    /// One key per 4-bit castling-rights mask.
    pub(crate) castling: [u64; 16],
    /// Only the file of the en passant square matters.
    pub(crate) en_passant: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        // Fixed seed keeps keys (and thus search traces) reproducible.
        let mut rng = StdRng::seed_from_u64(0x5eed_cafe_f00d_u64);
        let mut piece = [[[0u64; 64]; 6]; 2];
        for color in &mut piece {
            for pt in color.iter_mut() {
                for key in pt.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let side = rng.gen();

        let mut castling = [0u64; 16];
        // Build the 16 composite keys from 4 per-right keys so that toggling
        // one right is a single XOR on the composite table as well.
        let rights: [u64; 4] = [rng.gen(), rng.gen(), rng.gen(), rng.gen()];
        for (mask, key) in castling.iter_mut().enumerate() {
            for (bit, right_key) in rights.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    *key ^= right_key;
                }
            }
        }

        let mut en_passant = [0u64; 8];
        for key in &mut en_passant {
            *key = rng.gen();
        }

        ZobristKeys {
            piece,
            side,
            castling,
            en_passant,
        }
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for color in &ZOBRIST.piece {
            for pt in color {
                for key in pt {
                    assert!(seen.insert(*key));
                }
            }
        }
        assert!(seen.insert(ZOBRIST.side));
    }

    #[test]
    fn test_castling_keys_compose() {
        // The composite for {WK, BQ} must be the XOR of the singles.
        assert_eq!(
            ZOBRIST.castling[0b1001],
            ZOBRIST.castling[0b0001] ^ ZOBRIST.castling[0b1000]
        );
        assert_eq!(ZOBRIST.castling[0], 0);
    }
}
