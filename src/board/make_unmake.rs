//! Incremental make/unmake of moves.

use crate::zobrist::ZOBRIST;

use super::attack_tables::pawn_attacks;
use super::state::{NullMoveInfo, UnmakeInfo};
use super::types::{Bitboard, Color, Move, Piece, Square};
use super::Board;

impl Board {
    /// Destination squares of king and rook for a castling move encoded
    /// king-from / rook-from.
    pub(crate) fn castling_squares(mv: Move) -> (Square, Square, Square, Square) {
        let king_from = mv.from();
        let rook_from = mv.to();
        let rank = king_from.rank();
        let kingside = rook_from.file() > king_from.file();
        let (king_to, rook_to) = if kingside {
            (Square::new(rank, 6), Square::new(rank, 5))
        } else {
            (Square::new(rank, 2), Square::new(rank, 3))
        };
        (king_from, king_to, rook_from, rook_to)
    }

    /// The square of the pawn captured by an en passant move.
    #[inline]
    pub(crate) fn ep_captured_square(mv: Move) -> Square {
        Square::new(mv.from().rank(), mv.to().file())
    }

    /// Keep a FEN-supplied en passant square only if the pushed pawn is
    /// there and a capture is actually possible.
    pub(crate) fn validate_ep_square(&self, ep: Square) -> Option<Square> {
        let us = self.stm;
        let them = us.opponent();
        let pushed = if us == Color::White {
            Square::new(ep.rank() - 1, ep.file())
        } else {
            Square::new(ep.rank() + 1, ep.file())
        };
        let capturable = self.pieces(them, Piece::Pawn).contains(pushed)
            && !(pawn_attacks(them, ep) & self.pieces(us, Piece::Pawn)).is_empty();
        capturable.then_some(ep)
    }

    /// Make a move, returning the frame needed to unmake it.
    ///
    /// `mv` must be legal. Bitboards, mailbox, Zobrist key, castling
    /// rights, clocks and check information are all updated incrementally.
    pub fn make_move(&mut self, mv: Move) -> UnmakeInfo {
        let us = self.stm;
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();

        let mut info = UnmakeInfo {
            captured: None,
            prev_ep_square: self.ep_square,
            prev_castling: self.castling,
            prev_key: self.key,
            prev_halfmove_clock: self.halfmove_clock,
            prev_checkers: self.checkers,
            prev_blockers: self.blockers_for_king,
            prev_pinners: self.pinners,
            made_key: 0,
            prev_repetition_count: 0,
        };

        let mut key = self.key ^ ZOBRIST.side;
        if let Some(ep) = self.ep_square {
            key ^= ZOBRIST.en_passant[ep.file()];
        }
        self.ep_square = None;

        let (_, piece) = self.piece_at(from).expect("make_move from an empty square");
        debug_assert_eq!(self.piece_at(from).map(|(c, _)| c), Some(us));

        if mv.is_castling() {
            let (king_from, king_to, rook_from, rook_to) = Self::castling_squares(mv);
            // Remove both movers first: in Chess960 the king may land on
            // the rook's start square or vice versa.
            self.remove_piece(king_from, us, Piece::King);
            self.remove_piece(rook_from, us, Piece::Rook);
            self.set_piece(king_to, us, Piece::King);
            self.set_piece(rook_to, us, Piece::Rook);
            key ^= ZOBRIST.piece[us.index()][Piece::King.index()][king_from.index()]
                ^ ZOBRIST.piece[us.index()][Piece::King.index()][king_to.index()]
                ^ ZOBRIST.piece[us.index()][Piece::Rook.index()][rook_from.index()]
                ^ ZOBRIST.piece[us.index()][Piece::Rook.index()][rook_to.index()];
        } else {
            if mv.is_en_passant() {
                let cap_sq = Self::ep_captured_square(mv);
                info.captured = Some((them, Piece::Pawn));
                self.remove_piece(cap_sq, them, Piece::Pawn);
                key ^= ZOBRIST.piece[them.index()][Piece::Pawn.index()][cap_sq.index()];
            } else if let Some((cap_color, cap_piece)) = self.piece_at(to) {
                debug_assert_eq!(cap_color, them);
                debug_assert_ne!(cap_piece, Piece::King);
                info.captured = Some((cap_color, cap_piece));
                self.remove_piece(to, cap_color, cap_piece);
                key ^= ZOBRIST.piece[cap_color.index()][cap_piece.index()][to.index()];
            }

            self.remove_piece(from, us, piece);
            let placed = mv.promotion_piece().unwrap_or(piece);
            self.set_piece(to, us, placed);
            key ^= ZOBRIST.piece[us.index()][piece.index()][from.index()]
                ^ ZOBRIST.piece[us.index()][placed.index()][to.index()];

            // A double pawn push may create an en passant square; keep it
            // only when an enemy pawn can use it, so equal positions hash
            // equally.
            if piece == Piece::Pawn && from.rank().abs_diff(to.rank()) == 2 {
                let ep = Square::new((from.rank() + to.rank()) / 2, from.file());
                if !(pawn_attacks(us, ep) & self.pieces(them, Piece::Pawn)).is_empty() {
                    self.ep_square = Some(ep);
                    key ^= ZOBRIST.en_passant[ep.file()];
                }
            }
        }

        let lost = self.castling_mask[from.index()] | self.castling_mask[to.index()];
        if lost != 0 && (self.castling.as_usize() as u8) & lost != 0 {
            key ^= ZOBRIST.castling[self.castling.as_usize()];
            self.castling.discard(lost);
            key ^= ZOBRIST.castling[self.castling.as_usize()];
        }

        if piece == Piece::Pawn || info.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.stm = them;
        self.key = key;
        self.update_check_info();

        info.made_key = key;
        info.prev_repetition_count = self.repetitions.get(key);
        self.repetitions.increment(key);

        #[cfg(debug_assertions)]
        self.assert_consistent();

        info
    }

    /// Undo a move made with `make_move`. All cached state is restored
    /// from the frame; nothing is recomputed.
    pub fn unmake_move(&mut self, mv: Move, info: UnmakeInfo) {
        self.repetitions
            .set(info.made_key, info.prev_repetition_count);

        self.stm = self.stm.opponent();
        let us = self.stm;
        let them = us.opponent();

        self.ep_square = info.prev_ep_square;
        self.castling = info.prev_castling;
        self.key = info.prev_key;
        self.halfmove_clock = info.prev_halfmove_clock;
        self.checkers = info.prev_checkers;
        self.blockers_for_king = info.prev_blockers;
        self.pinners = info.prev_pinners;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }

        if mv.is_castling() {
            let (king_from, king_to, rook_from, rook_to) = Self::castling_squares(mv);
            self.remove_piece(king_to, us, Piece::King);
            self.remove_piece(rook_to, us, Piece::Rook);
            self.set_piece(king_from, us, Piece::King);
            self.set_piece(rook_from, us, Piece::Rook);
        } else {
            let (_, placed) = self
                .piece_at(mv.to())
                .expect("unmake_move: destination square is empty");
            self.remove_piece(mv.to(), us, placed);
            let original = if mv.is_promotion() { Piece::Pawn } else { placed };
            self.set_piece(mv.from(), us, original);

            if mv.is_en_passant() {
                self.set_piece(Self::ep_captured_square(mv), them, Piece::Pawn);
            } else if let Some((cap_color, cap_piece)) = info.captured {
                self.set_piece(mv.to(), cap_color, cap_piece);
            }
        }

        #[cfg(debug_assertions)]
        self.assert_consistent();
    }

    /// Pass the move. Must not be called while in check.
    pub fn make_null_move(&mut self) -> NullMoveInfo {
        debug_assert!(!self.in_check());

        let info = NullMoveInfo {
            prev_ep_square: self.ep_square,
            prev_key: self.key,
            prev_blockers: self.blockers_for_king,
            prev_pinners: self.pinners,
        };

        let mut key = self.key ^ ZOBRIST.side;
        if let Some(ep) = self.ep_square {
            key ^= ZOBRIST.en_passant[ep.file()];
        }
        self.ep_square = None;
        self.stm = self.stm.opponent();
        self.key = key;
        self.update_check_info();

        info
    }

    pub fn unmake_null_move(&mut self, info: NullMoveInfo) {
        self.stm = self.stm.opponent();
        self.ep_square = info.prev_ep_square;
        self.key = info.prev_key;
        self.blockers_for_king = info.prev_blockers;
        self.pinners = info.prev_pinners;
        // Null moves are only made outside of check.
        self.checkers = Bitboard::EMPTY;
    }
}
