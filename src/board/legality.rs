//! Move legality and check detection.
//!
//! `is_legal` upgrades a pseudo-legal move to a legal one using the cached
//! pin information; only en passant needs a full attack re-test.
//! `is_pseudo_legal` validates arbitrary 16-bit moves (from the TT or
//! killer slots) against the current position.

use super::attack_tables::{
    aligned, attacks_bb, bishop_attacks, between, pawn_attacks, rook_attacks,
};
use super::types::{Bitboard, Color, Move, MoveKind, Piece, Square};
use super::Board;

impl Board {
    /// Full legality test for a pseudo-legal move.
    #[must_use]
    pub fn is_legal(&self, mv: Move) -> bool {
        let us = self.stm;
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();
        let ksq = self.king_square(us);
        let occupied = self.occupied();

        if mv.is_en_passant() {
            // Both the capturing and the captured pawn leave their rays;
            // re-test slider attacks with the post-capture occupancy.
            let cap_sq = Self::ep_captured_square(mv);
            let occ_after = (occupied
                ^ Bitboard::from_square(from)
                ^ Bitboard::from_square(cap_sq))
                | Bitboard::from_square(to);
            let their_rooks =
                (self.piece_bb(Piece::Rook) | self.piece_bb(Piece::Queen)) & self.pieces_of(them);
            let their_bishops = (self.piece_bb(Piece::Bishop) | self.piece_bb(Piece::Queen))
                & self.pieces_of(them);
            return (rook_attacks(ksq, occ_after) & their_rooks).is_empty()
                && (bishop_attacks(ksq, occ_after) & their_bishops).is_empty();
        }

        if mv.is_castling() {
            let (king_from, king_to, rook_from, _) = Self::castling_squares(mv);
            // Every square the king crosses, destination included, must be
            // safe. The rook is ignored while testing (it may shield the
            // king in Chess960).
            let occ_no_rook = occupied ^ Bitboard::from_square(rook_from);
            for sq in between(king_from, king_to) {
                if self.attacked_by(them, sq, occ_no_rook) {
                    return false;
                }
            }
            return !self.attacked_by(them, king_from, occ_no_rook);
        }

        if self.piece_on(from) == Some(Piece::King) {
            // King steps: retest the destination with the king off its ray.
            return !self.attacked_by(them, to, occupied ^ Bitboard::from_square(from));
        }

        // Everything else is legal unless absolutely pinned off its ray.
        !self.blockers_for_king(us).contains(from) || aligned(from, to, ksq)
    }

    /// Validate an arbitrary 16-bit move against this position.
    ///
    /// Used to sanity-check transposition-table and killer moves before
    /// trusting them; a `true` result means the move could have been
    /// emitted by the generator.
    #[must_use]
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        if !mv.is_some() {
            return false;
        }
        let us = self.stm;
        let from = mv.from();
        let to = mv.to();

        let Some((color, piece)) = self.piece_at(from) else {
            return false;
        };
        if color != us {
            return false;
        }

        let ok = match mv.kind() {
            MoveKind::Castling => {
                return piece == Piece::King && !self.in_check() && self.castling_is_pseudo_legal(mv)
            }
            MoveKind::EnPassant => {
                piece == Piece::Pawn
                    && self.ep_square == Some(to)
                    && pawn_attacks(us, from).contains(to)
            }
            MoveKind::Promotion => {
                piece == Piece::Pawn
                    && Bitboard::promotion_rank(us).contains(to)
                    && self.pawn_move_shape_ok(us, from, to)
            }
            MoveKind::Normal => {
                if piece == Piece::Pawn {
                    !Bitboard::promotion_rank(us).contains(to)
                        && self.pawn_move_shape_ok(us, from, to)
                } else {
                    attacks_bb(piece, from, self.occupied()).contains(to)
                        && !self.pieces_of(us).contains(to)
                }
            }
        };
        if !ok {
            return false;
        }

        // While in check, a non-king move must address the check.
        if self.in_check() && piece != Piece::King {
            if self.checkers.more_than_one() {
                return false;
            }
            let checker = self.checkers.lsb();
            let ksq = self.king_square(us);
            let resolves = between(ksq, checker).contains(to)
                || (mv.is_en_passant() && Self::ep_captured_square(mv) == checker);
            if !resolves {
                return false;
            }
        }
        true
    }

    /// Pawn push/capture geometry shared by normal and promotion moves.
    fn pawn_move_shape_ok(&self, us: Color, from: Square, to: Square) -> bool {
        let from_bb = Bitboard::from_square(from);
        let to_bb = Bitboard::from_square(to);
        let empty = !self.occupied();

        // Single push.
        if from_bb.shift_forward(us) == to_bb {
            return self.is_empty_square(to);
        }
        // Double push from the start rank.
        let start_rank = match us {
            Color::White => Bitboard::RANK_2,
            Color::Black => Bitboard::RANK_7,
        };
        if (from_bb & start_rank).shift_forward(us).shift_forward(us) == to_bb {
            let mid = from_bb.shift_forward(us);
            return !(mid & empty).is_empty() && self.is_empty_square(to);
        }
        // Capture.
        pawn_attacks(us, from).contains(to) && self.pieces_of(us.opponent()).contains(to)
    }

    /// Castling-shape validation for `is_pseudo_legal`: the right must
    /// still exist and the path must be clear. Attack safety is `is_legal`'s
    /// concern.
    fn castling_is_pseudo_legal(&self, mv: Move) -> bool {
        let us = self.stm;
        for right in Self::castling_right_range(us) {
            if self.castling.has_index(right)
                && self.castling_rooks[right] == Some(mv.to())
                && self.king_square(us) == mv.from()
            {
                return self.castling_path_clear(right);
            }
        }
        false
    }

    pub(crate) fn castling_right_range(color: Color) -> std::ops::Range<usize> {
        match color {
            Color::White => 0..2,
            Color::Black => 2..4,
        }
    }

    /// All squares between the movers and their destinations are empty
    /// (the king and the castling rook themselves excepted).
    pub(crate) fn castling_path_clear(&self, right: usize) -> bool {
        let color = if right < 2 { Color::White } else { Color::Black };
        let king_from = self.king_square(color);
        let rook_from = self.castling_rooks[right].expect("right implies rook square");
        let mv = Move::castling(king_from, rook_from);
        let (_, king_to, _, rook_to) = Self::castling_squares(mv);

        let movers = Bitboard::from_square(king_from) | Bitboard::from_square(rook_from);
        let path = (between(king_from, king_to) | between(rook_from, rook_to)) & !movers;
        (path & self.occupied()).is_empty()
    }

    /// Cheap test whether a move gives check, without making it.
    #[must_use]
    pub fn gives_check(&self, mv: Move) -> bool {
        let us = self.stm;
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();
        let ksq = self.king_square(them);
        let occupied = self.occupied();
        let from_bb = Bitboard::from_square(from);
        let to_bb = Bitboard::from_square(to);

        match mv.kind() {
            MoveKind::Castling => {
                let (king_from, king_to, rook_from, rook_to) = Self::castling_squares(mv);
                let occ_after = (occupied
                    ^ Bitboard::from_square(king_from)
                    ^ Bitboard::from_square(rook_from))
                    | Bitboard::from_square(king_to)
                    | Bitboard::from_square(rook_to);
                rook_attacks(rook_to, occ_after).contains(ksq)
            }
            MoveKind::EnPassant => {
                let cap_sq = Self::ep_captured_square(mv);
                let occ_after =
                    (occupied ^ from_bb ^ Bitboard::from_square(cap_sq)) | to_bb;
                if pawn_attacks(us, to).contains(ksq) {
                    return true;
                }
                let our_rooks =
                    (self.piece_bb(Piece::Rook) | self.piece_bb(Piece::Queen)) & self.pieces_of(us);
                let our_bishops = (self.piece_bb(Piece::Bishop) | self.piece_bb(Piece::Queen))
                    & self.pieces_of(us);
                !(rook_attacks(ksq, occ_after) & our_rooks).is_empty()
                    || !(bishop_attacks(ksq, occ_after) & our_bishops).is_empty()
            }
            MoveKind::Promotion | MoveKind::Normal => {
                let piece = self.piece_on(from).expect("gives_check on an empty square");
                let placed = mv.promotion_piece().unwrap_or(piece);
                let occ_after = (occupied ^ from_bb) | to_bb;

                // Direct check from the destination square.
                let direct = if placed == Piece::Pawn {
                    pawn_attacks(us, to).contains(ksq)
                } else {
                    attacks_bb(placed, to, occ_after).contains(ksq)
                };
                if direct {
                    return true;
                }

                // Discovered check: the mover was shielding the enemy king
                // and leaves the shared ray.
                self.blockers_for_king(them).contains(from) && !aligned(from, to, ksq)
            }
        }
    }
}
