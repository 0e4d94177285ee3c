//! Precomputed attack tables and ray geometry.
//!
//! Leaper attacks (knight, king, pawn) are plain per-square tables. Sliding
//! attacks go through magic bitboards (`magics` module). The ray tables
//! `BETWEEN` and `LINE` support pin and evasion logic.

mod magics;

pub(crate) use magics::{bishop_ray_attacks, rook_ray_attacks};

use once_cell::sync::Lazy;

use super::types::{Bitboard, Color, Piece, Square};

static KNIGHT_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let deltas = [
        (2, 1),
        (1, 2),
        (-1, 2),
        (-2, 1),
        (-2, -1),
        (-1, -2),
        (1, -2),
        (2, -1),
    ];
    leaper_table(&deltas)
});

static KING_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let deltas = [
        (1, 0),
        (-1, 0),
        (0, 1),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ];
    leaper_table(&deltas)
});

static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let white = leaper_table(&[(1, -1), (1, 1)]);
    let black = leaper_table(&[(-1, -1), (-1, 1)]);
    [white, black]
});

fn leaper_table(deltas: &[(i8, i8)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    for (sq, slot) in table.iter_mut().enumerate() {
        let rank = (sq / 8) as i8;
        let file = (sq % 8) as i8;
        let mut mask = 0u64;
        for &(dr, df) in deltas {
            let nr = rank + dr;
            let nf = file + df;
            if (0..8).contains(&nr) && (0..8).contains(&nf) {
                mask |= 1u64 << (nr as usize * 8 + nf as usize);
            }
        }
        *slot = Bitboard(mask);
    }
    table
}

static ROOK_MAGICS: Lazy<magics::SliderAttacks> = Lazy::new(magics::build_rook_attacks);
static BISHOP_MAGICS: Lazy<magics::SliderAttacks> = Lazy::new(magics::build_bishop_attacks);

/// `LINE[a][b]`: the full line (both endpoints included) through collinear
/// squares a and b, empty otherwise.
static LINE: Lazy<Box<[[Bitboard; 64]; 64]>> = Lazy::new(|| {
    let mut table = Box::new([[Bitboard::EMPTY; 64]; 64]);
    for a in 0..64 {
        let sa = Square::from_index(a);
        for b in 0..64 {
            let sb = Square::from_index(b);
            if a == b {
                continue;
            }
            let b_bb = Bitboard::from_square(sb);
            if !(Bitboard(rook_ray_attacks(sa, 0)) & b_bb).is_empty() {
                table[a][b] = (Bitboard(rook_ray_attacks(sa, 0)) & Bitboard(rook_ray_attacks(sb, 0)))
                    | Bitboard::from_square(sa)
                    | b_bb;
            } else if !(Bitboard(bishop_ray_attacks(sa, 0)) & b_bb).is_empty() {
                table[a][b] = (Bitboard(bishop_ray_attacks(sa, 0))
                    & Bitboard(bishop_ray_attacks(sb, 0)))
                    | Bitboard::from_square(sa)
                    | b_bb;
            }
        }
    }
    table
});

/// `BETWEEN[a][b]`: the squares a slider must cross from a to reach b, plus
/// b itself; just `{b}` when the squares are not aligned. Doubles as the
/// block-or-capture target mask for check evasions.
static BETWEEN: Lazy<Box<[[Bitboard; 64]; 64]>> = Lazy::new(|| {
    let mut table = Box::new([[Bitboard::EMPTY; 64]; 64]);
    for a in 0..64 {
        let sa = Square::from_index(a);
        for b in 0..64 {
            let sb = Square::from_index(b);
            let b_bb = Bitboard::from_square(sb);
            let between = if !(Bitboard(rook_ray_attacks(sa, 0)) & b_bb).is_empty() {
                Bitboard(rook_ray_attacks(sa, b_bb.0)) & Bitboard(rook_ray_attacks(sb, Bitboard::from_square(sa).0))
            } else if !(Bitboard(bishop_ray_attacks(sa, 0)) & b_bb).is_empty() {
                Bitboard(bishop_ray_attacks(sa, b_bb.0))
                    & Bitboard(bishop_ray_attacks(sb, Bitboard::from_square(sa).0))
            } else {
                Bitboard::EMPTY
            };
            table[a][b] = between | b_bb;
        }
    }
    table
});

static SQUARE_DISTANCE: Lazy<Box<[[u8; 64]; 64]>> = Lazy::new(|| {
    let mut table = Box::new([[0u8; 64]; 64]);
    for a in 0..64 {
        for b in 0..64 {
            table[a][b] = Square::from_index(a).distance(Square::from_index(b)) as u8;
        }
    }
    table
});

#[inline]
#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.index()]
}

#[inline]
#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.index()]
}

#[inline]
#[must_use]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    PAWN_ATTACKS[color.index()][sq.index()]
}

#[inline]
#[must_use]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    Bitboard(ROOK_MAGICS.attacks(sq, occupied.0))
}

#[inline]
#[must_use]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    Bitboard(BISHOP_MAGICS.attacks(sq, occupied.0))
}

#[inline]
#[must_use]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

/// Attacks of a non-pawn piece type from `sq` given `occupied`.
#[inline]
#[must_use]
pub fn attacks_bb(piece: Piece, sq: Square, occupied: Bitboard) -> Bitboard {
    match piece {
        Piece::Knight => knight_attacks(sq),
        Piece::Bishop => bishop_attacks(sq, occupied),
        Piece::Rook => rook_attacks(sq, occupied),
        Piece::Queen => queen_attacks(sq, occupied),
        Piece::King => king_attacks(sq),
        Piece::Pawn => unreachable!("pawn attacks depend on color"),
    }
}

/// Squares between `a` and `b` (inclusive of `b`); `{b}` when not aligned.
#[inline]
#[must_use]
pub fn between(a: Square, b: Square) -> Bitboard {
    BETWEEN[a.index()][b.index()]
}

/// The full line through `a` and `b` if collinear, else empty.
#[inline]
#[must_use]
pub fn line(a: Square, b: Square) -> Bitboard {
    LINE[a.index()][b.index()]
}

/// True if `a`, `b` and `c` lie on one rank, file, or diagonal.
#[inline]
#[must_use]
pub fn aligned(a: Square, b: Square, c: Square) -> bool {
    line(a, b).contains(c)
}

/// Chebyshev distance between two squares.
#[inline]
#[must_use]
pub fn distance(a: Square, b: Square) -> usize {
    SQUARE_DISTANCE[a.index()][b.index()] as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knight_attacks_center_and_corner() {
        assert_eq!(knight_attacks(Square::new(3, 4)).popcount(), 8);
        assert_eq!(knight_attacks(Square::new(0, 0)).popcount(), 2);
    }

    #[test]
    fn test_king_attacks_counts() {
        assert_eq!(king_attacks(Square::new(3, 4)).popcount(), 8);
        assert_eq!(king_attacks(Square::new(0, 0)).popcount(), 3);
        assert_eq!(king_attacks(Square::new(0, 4)).popcount(), 5);
    }

    #[test]
    fn test_pawn_attacks() {
        let e4 = Square::new(3, 4);
        let white = pawn_attacks(Color::White, e4);
        assert!(white.contains(Square::new(4, 3)));
        assert!(white.contains(Square::new(4, 5)));
        assert_eq!(white.popcount(), 2);

        let a2 = Square::new(1, 0);
        assert_eq!(pawn_attacks(Color::White, a2).popcount(), 1);
        assert!(pawn_attacks(Color::White, a2).contains(Square::new(2, 1)));

        let black = pawn_attacks(Color::Black, e4);
        assert!(black.contains(Square::new(2, 3)));
        assert!(black.contains(Square::new(2, 5)));
    }

    #[test]
    fn test_rook_attacks_blockers() {
        let e4 = Square::new(3, 4);
        let blockers = Bitboard::from_square(Square::new(5, 4)) | Bitboard::from_square(Square::new(3, 2));
        let attacks = rook_attacks(e4, blockers);
        assert!(attacks.contains(Square::new(5, 4)));
        assert!(!attacks.contains(Square::new(6, 4)));
        assert!(attacks.contains(Square::new(3, 2)));
        assert!(!attacks.contains(Square::new(3, 1)));
        assert!(attacks.contains(Square::new(0, 4)));
    }

    #[test]
    fn test_between_aligned() {
        let a1 = Square::new(0, 0);
        let a8 = Square::new(7, 0);
        let span = between(a1, a8);
        assert_eq!(span.popcount(), 7);
        assert!(span.contains(a8));
        assert!(!span.contains(a1));
        assert!(span.contains(Square::new(3, 0)));
    }

    #[test]
    fn test_between_unaligned_is_target_only() {
        let a1 = Square::new(0, 0);
        let b3 = Square::new(2, 1);
        assert_eq!(between(a1, b3), Bitboard::from_square(b3));
    }

    #[test]
    fn test_line() {
        let c3 = Square::new(2, 2);
        let f6 = Square::new(5, 5);
        let diag = line(c3, f6);
        assert!(diag.contains(Square::new(0, 0)));
        assert!(diag.contains(Square::new(7, 7)));
        assert!(diag.contains(c3));
        assert!(line(c3, Square::new(3, 4)).is_empty());
    }

    #[test]
    fn test_aligned() {
        assert!(aligned(Square::new(0, 0), Square::new(7, 7), Square::new(4, 4)));
        assert!(!aligned(Square::new(0, 0), Square::new(7, 7), Square::new(4, 5)));
    }

    #[test]
    fn test_distance_table() {
        assert_eq!(distance(Square::new(0, 0), Square::new(7, 7)), 7);
        assert_eq!(distance(Square::new(3, 3), Square::new(3, 3)), 0);
        assert_eq!(distance(Square::new(0, 0), Square::new(2, 1)), 2);
    }
}
