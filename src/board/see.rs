//! Static Exchange Evaluation.
//!
//! Simulates the sequence of least-valuable-attacker captures on a move's
//! destination square, with x-ray attackers revealed as pieces come off.

use super::attack_tables::{bishop_attacks, rook_attacks};
use super::types::{Bitboard, Move, MoveKind, Piece};
use super::Board;

/// Exchange values; the king never appears in a gain term.
const SEE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 0];

#[inline]
fn see_value(piece: Piece) -> i32 {
    SEE_VALUES[piece.index()]
}

impl Board {
    /// True iff the exchange started by `mv` nets at least `threshold`
    /// centipawns for the side to move.
    #[must_use]
    pub fn see_ge(&self, mv: Move, threshold: i32) -> bool {
        // Castling moves no material onto a contested square.
        if mv.is_castling() {
            return threshold <= 0;
        }

        let from = mv.from();
        let to = mv.to();
        let attacker = self.piece_on(from).expect("see_ge from an empty square");

        let mut occupied =
            self.occupied() ^ Bitboard::from_square(from) ^ Bitboard::from_square(to);

        // Seed the exchange: what the move wins outright, and which piece
        // of ours then stands on the target square for the opponent to
        // win back.
        let mut gain = self.piece_on(to).map_or(0, see_value);
        let mut stands = attacker;
        match mv.kind() {
            MoveKind::EnPassant => {
                let cap_sq = Self::ep_captured_square(mv);
                occupied ^= Bitboard::from_square(cap_sq);
                gain = see_value(Piece::Pawn);
            }
            MoveKind::Promotion => {
                let promo = mv.promotion_piece().expect("promotion move has a piece");
                gain += see_value(promo) - see_value(Piece::Pawn);
                stands = promo;
            }
            _ => {}
        }

        let mut swap = gain - threshold;
        if swap < 0 {
            return false;
        }
        swap = see_value(stands) - swap;
        if swap <= 0 {
            return true;
        }

        let mut stm = self.stm;
        let mut attackers = self.attackers_to(to, occupied) & occupied;
        let mut winning = true;

        let bishops_queens = self.piece_bb(Piece::Bishop) | self.piece_bb(Piece::Queen);
        let rooks_queens = self.piece_bb(Piece::Rook) | self.piece_bb(Piece::Queen);

        loop {
            stm = stm.opponent();
            attackers &= occupied;

            let stm_attackers = attackers & self.pieces_of(stm);
            if stm_attackers.is_empty() {
                break;
            }

            winning = !winning;

            // Capture with the least valuable attacker; removing it may
            // reveal an x-ray attacker behind it.
            let mut captured = None;
            for piece in [
                Piece::Pawn,
                Piece::Knight,
                Piece::Bishop,
                Piece::Rook,
                Piece::Queen,
            ] {
                let candidates = stm_attackers & self.piece_bb(piece);
                if !candidates.is_empty() {
                    captured = Some((piece, candidates.lsb()));
                    break;
                }
            }

            let Some((piece, sq)) = captured else {
                // Only the king can capture. It may do so only if the
                // opponent has no attacker left to take it back.
                let opponent_attackers = attackers & !self.pieces_of(stm);
                return if opponent_attackers.is_empty() {
                    winning
                } else {
                    !winning
                };
            };

            swap = see_value(piece) - swap;
            if swap < i32::from(winning) {
                break;
            }

            occupied ^= Bitboard::from_square(sq);
            match piece {
                Piece::Pawn | Piece::Bishop => {
                    attackers |= bishop_attacks(to, occupied) & bishops_queens;
                }
                Piece::Rook => {
                    attackers |= rook_attacks(to, occupied) & rooks_queens;
                }
                Piece::Queen => {
                    attackers |= (bishop_attacks(to, occupied) & bishops_queens)
                        | (rook_attacks(to, occupied) & rooks_queens);
                }
                _ => {}
            }
        }

        winning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(board: &Board, uci: &str) -> Move {
        board.parse_move(uci).unwrap()
    }

    #[test]
    fn test_winning_capture() {
        // Knight takes an undefended pawn.
        let board = Board::from_fen("4k3/8/8/8/3p4/1N6/8/4K3 w - - 0 1");
        let capture = mv(&board, "b3d4");
        assert!(board.see_ge(capture, 0));
        assert!(board.see_ge(capture, 100));
        assert!(!board.see_ge(capture, 101));
    }

    #[test]
    fn test_losing_capture() {
        // Queen takes a pawn defended by a pawn.
        let board = Board::from_fen("4k3/8/2p5/3p4/8/8/3Q4/4K3 w - - 0 1");
        let capture = mv(&board, "d2d5");
        assert!(!board.see_ge(capture, 0));
        // Losing the queen for a pawn: 100 - 900.
        assert!(board.see_ge(capture, 100 - 900));
    }

    #[test]
    fn test_equal_exchange() {
        // Rook takes rook, recaptured by rook.
        let board = Board::from_fen("3rk3/3r4/8/8/8/8/3R4/4K3 w - - 0 1");
        let capture = mv(&board, "d2d7");
        assert!(board.see_ge(capture, 0));
        assert!(!board.see_ge(capture, 1));
    }

    #[test]
    fn test_battery_wins_the_exchange() {
        // Doubled rooks against a defended rook: the second attacker turns
        // an even trade into a win.
        let board = Board::from_fen("3r1k2/3r4/8/8/8/8/3R4/3RK3 w - - 0 1");
        let capture = mv(&board, "d2d7");
        assert!(board.see_ge(capture, 500));
        assert!(!board.see_ge(capture, 501));
    }

    #[test]
    fn test_xray_recapture_counts() {
        // Bxe5 looks safe but the pawn recaptures; behind-the-piece rook
        // support keeps the exchange level for the defender.
        let board = Board::from_fen("4k3/8/5p2/4p3/8/2B5/8/4K3 w - - 0 1");
        let capture = mv(&board, "c3e5");
        // Bishop (330) takes pawn (100), pawn recaptures: net -230.
        assert!(!board.see_ge(capture, 0));
        assert!(board.see_ge(capture, -230));
        assert!(!board.see_ge(capture, -229));
    }

    #[test]
    fn test_quiet_move_into_defended_square() {
        // Moving a queen to a square attacked by a pawn loses material.
        let board = Board::from_fen("4k3/8/2p5/8/8/8/3Q4/4K3 w - - 0 1");
        let quiet = mv(&board, "d2d5");
        assert!(!board.see_ge(quiet, 0));
    }

    #[test]
    fn test_castling_never_trades() {
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let castle = mv(&board, "e1g1");
        assert!(board.see_ge(castle, 0));
        assert!(!board.see_ge(castle, 1));
    }

    #[test]
    fn test_en_passant_wins_the_pawn() {
        // Black just pushed d7d5; exd6 wins an undefended pawn.
        let board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let ep = mv(&board, "e5d6");
        assert!(ep.is_en_passant());
        assert!(board.see_ge(ep, 100));
        assert!(!board.see_ge(ep, 101));
    }

    #[test]
    fn test_en_passant_with_recapture_is_even() {
        // The en passant square is covered by the c7 pawn, so the
        // capture trades pawn for pawn.
        let board = Board::from_fen("4k3/2p5/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let ep = mv(&board, "e5d6");
        assert!(board.see_ge(ep, 0));
        assert!(!board.see_ge(ep, 1));
    }

    #[test]
    fn test_quiet_promotion_gains_the_upgrade() {
        // Promoting on an empty, unwatched square nets queen minus pawn.
        let board = Board::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promo = mv(&board, "a7a8q");
        assert!(board.see_ge(promo, 800));
        assert!(!board.see_ge(promo, 801));
    }

    #[test]
    fn test_capture_promotion_with_recapture() {
        // axb8=Q wins the knight and the upgrade, but the rook takes the
        // new queen straight back: 320 + 800 - 900.
        let board = Board::from_fen("rn2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promo = mv(&board, "a7b8q");
        assert!(promo.is_promotion());
        assert!(board.see_ge(promo, 220));
        assert!(!board.see_ge(promo, 221));
    }
}
