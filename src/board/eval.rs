//! Static evaluation.
//!
//! A tapered material + piece-square evaluation, scored in centipawns from
//! the side to move's point of view. It stands in for an external
//! network evaluator behind the same `evaluate() -> Value` seam.

use super::types::{Color, Piece};
use super::Board;

const MATERIAL_MG: [i32; 6] = [100, 320, 330, 500, 900, 0];
const MATERIAL_EG: [i32; 6] = [120, 320, 330, 530, 950, 0];

/// Phase contribution per piece type; 24 at full material.
const PHASE_WEIGHTS: [i32; 6] = [0, 1, 1, 2, 4, 0];
const MAX_PHASE: i32 = 24;

const TEMPO: i32 = 10;

/// Piece-square tables from White's point of view, rank 1 first.
#[rustfmt::skip]
const PST_PAWN: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10, -20, -20,  10,  10,   5,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,   5,  10,  25,  25,  10,   5,   5,
     10,  10,  20,  30,  30,  20,  10,  10,
     50,  50,  50,  50,  50,  50,  50,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const PST_KNIGHT: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const PST_BISHOP: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const PST_ROOK: [i32; 64] = [
      0,   0,   0,   5,   5,   0,   0,   0,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      5,  10,  10,  10,  10,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const PST_QUEEN: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -10,   5,   5,   5,   5,   5,   0, -10,
      0,   0,   5,   5,   5,   5,   0,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,   0,   5,   5,   5,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const PST_KING_MG: [i32; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];

#[rustfmt::skip]
const PST_KING_EG: [i32; 64] = [
    -50, -30, -30, -30, -30, -30, -30, -50,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -50, -40, -30, -20, -20, -30, -40, -50,
];

#[inline]
fn pst(piece: Piece, sq: usize, endgame: bool) -> i32 {
    match piece {
        Piece::Pawn => PST_PAWN[sq],
        Piece::Knight => PST_KNIGHT[sq],
        Piece::Bishop => PST_BISHOP[sq],
        Piece::Rook => PST_ROOK[sq],
        Piece::Queen => PST_QUEEN[sq],
        Piece::King => {
            if endgame {
                PST_KING_EG[sq]
            } else {
                PST_KING_MG[sq]
            }
        }
    }
}

impl Board {
    /// Static evaluation in centipawns, positive when the side to move is
    /// better.
    #[must_use]
    pub fn evaluate(&self) -> i32 {
        let mut mg = [0i32; 2];
        let mut eg = [0i32; 2];
        let mut phase = 0i32;

        for sq in self.occupied() {
            let (color, piece) = self.piece_at(sq).expect("occupied square has a piece");
            let c = color.index();
            let p = piece.index();
            // Tables are from White's point of view; mirror for Black.
            let pst_sq = if color == Color::White {
                sq.index()
            } else {
                sq.flip_vertical().index()
            };
            mg[c] += MATERIAL_MG[p] + pst(piece, pst_sq, false);
            eg[c] += MATERIAL_EG[p] + pst(piece, pst_sq, true);
            phase += PHASE_WEIGHTS[p];
        }

        let us = self.stm.index();
        let them = self.stm.opponent().index();
        let phase = phase.min(MAX_PHASE);
        let mg_score = mg[us] - mg[them];
        let eg_score = eg[us] - eg[them];
        (mg_score * phase + eg_score * (MAX_PHASE - phase)) / MAX_PHASE + TEMPO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_is_balanced() {
        let board = Board::new();
        // Symmetric position: only the tempo bonus remains.
        assert_eq!(board.evaluate(), TEMPO);
    }

    #[test]
    fn test_eval_flips_with_side_to_move() {
        let white_up = Board::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        let same_black = Board::from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 1");
        assert_eq!(white_up.evaluate(), -same_black.evaluate() + 2 * TEMPO);
        assert!(white_up.evaluate() > 0);
        assert!(same_black.evaluate() < 0);
    }

    #[test]
    fn test_material_dominates() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/QQQQK3 w - - 0 1");
        assert!(board.evaluate() > 2000);
    }

    #[test]
    fn test_mirrored_position_is_symmetric() {
        let board = Board::from_fen("r3k3/pp6/8/8/8/8/PP6/R3K3 w - - 0 1");
        let mirror = Board::from_fen("r3k3/pp6/8/8/8/8/PP6/R3K3 b - - 0 1");
        assert_eq!(board.evaluate(), mirror.evaluate());
    }

    #[test]
    fn test_eval_is_bounded() {
        let board = Board::from_fen("QQQQQQQQ/QQQQQQ1Q/8/3k4/8/8/8/4K3 w - - 0 1");
        assert!(board.evaluate().abs() < 20000);
    }

    #[test]
    fn test_pst_encourages_center_knights() {
        let centered = Board::from_fen("4k3/8/8/8/4N3/8/8/4K3 w - - 0 1");
        let cornered = Board::from_fen("4k3/8/8/8/8/8/8/N3K3 w - - 0 1");
        assert!(centered.evaluate() > cornered.evaluate());
    }
}
