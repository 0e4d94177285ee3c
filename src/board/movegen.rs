//! Staged pseudo-legal move generation.
//!
//! Each [`GenKind`] fills a caller-provided buffer with one class of
//! pseudo-legal moves; `generate_legal` combines the right stages and
//! filters through `is_legal`. Pawns are generated set-wise with shifts,
//! the other pieces through the attack oracle.

use super::attack_tables::{attacks_bb, between, king_attacks, line, pawn_attacks};
use super::types::{Bitboard, Color, Move, MoveList, Piece, Square};
use super::Board;

/// Move-generation stages.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenKind {
    /// Captures and queen promotions.
    Captures,
    /// Non-captures: quiet moves, under-promotions, castling.
    Quiets,
    /// Check evasions; the only stage allowed while in check.
    Evasions,
    /// Quiet moves that give direct or discovered check (qsearch).
    QuietChecks,
}

impl Board {
    /// Append all pseudo-legal moves of one stage to `list`.
    pub fn generate(&self, kind: GenKind, list: &mut MoveList) {
        debug_assert_eq!(kind == GenKind::Evasions, self.in_check());

        if kind == GenKind::QuietChecks {
            self.gen_quiet_checks(list);
            return;
        }

        let us = self.stm;
        let them = us.opponent();
        let ksq = self.king_square(us);

        if kind == GenKind::Evasions {
            // King steps are always candidates; anything else only when a
            // single checker can be captured or blocked.
            let king_targets = king_attacks(ksq) & !self.pieces_of(us);
            for to in king_targets {
                list.push(Move::new(ksq, to));
            }
            if self.checkers.more_than_one() {
                return;
            }
            let checker = self.checkers.lsb();
            let target = between(ksq, checker);
            self.gen_pawn_moves(kind, target, list);
            self.gen_piece_moves(target, list);
            return;
        }

        let target = match kind {
            GenKind::Captures => self.pieces_of(them),
            GenKind::Quiets => !self.occupied(),
            _ => unreachable!(),
        };

        self.gen_pawn_moves(kind, target, list);
        self.gen_piece_moves(target, list);

        for to in king_attacks(ksq) & target {
            list.push(Move::new(ksq, to));
        }
        if kind == GenKind::Quiets {
            self.gen_castling(list);
        }
    }

    /// All legal moves in the position.
    #[must_use]
    pub fn generate_legal(&self) -> MoveList {
        let mut moves = MoveList::new();
        if self.in_check() {
            self.generate(GenKind::Evasions, &mut moves);
        } else {
            self.generate(GenKind::Captures, &mut moves);
            self.generate(GenKind::Quiets, &mut moves);
        }
        moves.retain(|mv| self.is_legal(mv));
        moves
    }

    fn gen_pawn_moves(&self, kind: GenKind, target: Bitboard, list: &mut MoveList) {
        let us = self.stm;
        let them = us.opponent();
        let up: i8 = if us == Color::White { 8 } else { -8 };

        let pawns = self.pieces(us, Piece::Pawn);
        let rank7 = Bitboard::pre_promotion_rank(us);
        let pawns_on7 = pawns & rank7;
        let pawns_not7 = pawns & !rank7;
        let empty = !self.occupied();
        // In evasions only the checker may be captured.
        let enemies = match kind {
            GenKind::Evasions => self.pieces_of(them) & self.checkers,
            _ => self.pieces_of(them),
        };

        // Single and double pushes (no promotions here).
        if matches!(kind, GenKind::Quiets | GenKind::Evasions) {
            let third_rank = match us {
                Color::White => Bitboard::RANK_3,
                Color::Black => Bitboard::RANK_6,
            };
            let singles = pawns_not7.shift_forward(us) & empty;
            let doubles = (singles & third_rank).shift_forward(us) & empty;
            for to in singles & target {
                list.push(Move::new(to.offset(-up), to));
            }
            for to in doubles & target {
                list.push(Move::new(to.offset(-2 * up), to));
            }
        }

        // Ordinary captures.
        if matches!(kind, GenKind::Captures | GenKind::Evasions) {
            for to in pawns_not7.shift_forward_east(us) & enemies {
                list.push(Move::new(to.offset(-(up + 1)), to));
            }
            for to in pawns_not7.shift_forward_west(us) & enemies {
                list.push(Move::new(to.offset(-(up - 1)), to));
            }

            if let Some(ep) = self.ep_square {
                // An en passant capture can never block a check, only
                // remove a checking pawn.
                let cap_sq = Square::new((ep.rank() as i8 - up / 8) as usize, ep.file());
                let ep_ok = kind != GenKind::Evasions || self.checkers.contains(cap_sq);
                if ep_ok {
                    for from in pawns_not7 & pawn_attacks(them, ep) {
                        list.push(Move::en_passant(from, ep));
                    }
                }
            }
        }

        // Promotions.
        if !pawns_on7.is_empty() {
            let push_target = match kind {
                GenKind::Evasions => target,
                _ => Bitboard::ALL,
            };
            for to in pawns_on7.shift_forward(us) & empty & push_target {
                self.make_promotions(kind, to.offset(-up), to, list);
            }
            for to in pawns_on7.shift_forward_east(us) & enemies {
                self.make_promotions(kind, to.offset(-(up + 1)), to, list);
            }
            for to in pawns_on7.shift_forward_west(us) & enemies {
                self.make_promotions(kind, to.offset(-(up - 1)), to, list);
            }
        }
    }

    /// Queen promotions count as tactical, under-promotions as quiet.
    fn make_promotions(&self, kind: GenKind, from: Square, to: Square, list: &mut MoveList) {
        if matches!(kind, GenKind::Captures | GenKind::Evasions) {
            list.push(Move::promotion(from, to, Piece::Queen));
        }
        if matches!(kind, GenKind::Quiets | GenKind::Evasions) {
            for promo in [Piece::Rook, Piece::Bishop, Piece::Knight] {
                list.push(Move::promotion(from, to, promo));
            }
        }
    }

    fn gen_piece_moves(&self, target: Bitboard, list: &mut MoveList) {
        let us = self.stm;
        let occupied = self.occupied();
        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
            for from in self.pieces(us, piece) {
                for to in attacks_bb(piece, from, occupied) & target {
                    list.push(Move::new(from, to));
                }
            }
        }
    }

    fn gen_castling(&self, list: &mut MoveList) {
        let us = self.stm;
        for right in Self::castling_right_range(us) {
            if self.castling.has_index(right) && self.castling_path_clear(right) {
                let rook = self.castling_rooks[right].expect("right implies rook square");
                list.push(Move::castling(self.king_square(us), rook));
            }
        }
    }

    /// Quiet moves that give check, for the quiescence search.
    fn gen_quiet_checks(&self, list: &mut MoveList) {
        let us = self.stm;
        let them = us.opponent();
        let their_ksq = self.king_square(them);
        let occupied = self.occupied();
        let empty = !occupied;
        let discovered = self.blockers_for_king(them) & self.pieces_of(us);

        // Pawn pushes: direct checks plus discovered checks off the ray.
        let pawns = self.pieces(us, Piece::Pawn) & !Bitboard::pre_promotion_rank(us);
        let third_rank = match us {
            Color::White => Bitboard::RANK_3,
            Color::Black => Bitboard::RANK_6,
        };
        let up: i8 = if us == Color::White { 8 } else { -8 };
        let singles = pawns.shift_forward(us) & empty;
        let doubles = (singles & third_rank).shift_forward(us) & empty;
        let pawn_check_sqs = pawn_attacks(them, their_ksq);
        for (pushes, delta) in [(singles, up), (doubles, 2 * up)] {
            for to in pushes {
                let from = to.offset(-delta);
                let direct = pawn_check_sqs.contains(to);
                let disc = discovered.contains(from) && !line(from, their_ksq).contains(to);
                if direct || disc {
                    list.push(Move::new(from, to));
                }
            }
        }

        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
            let check_sqs = attacks_bb(piece, their_ksq, occupied);
            for from in self.pieces(us, piece) {
                let quiets = attacks_bb(piece, from, occupied) & empty;
                let targets = if discovered.contains(from) {
                    // Off the shared ray every move discovers check; on it
                    // only direct checks count.
                    (quiets & !line(from, their_ksq)) | (quiets & check_sqs)
                } else {
                    quiets & check_sqs
                };
                for to in targets {
                    list.push(Move::new(from, to));
                }
            }
        }

        // The king can only ever deliver a discovered check.
        let ksq = self.king_square(us);
        if discovered.contains(ksq) {
            for to in king_attacks(ksq) & empty & !line(ksq, their_ksq) {
                list.push(Move::new(ksq, to));
            }
        }
    }

    // =====================================================================
    // Game-state queries built on the legal generator
    // =====================================================================

    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        self.in_check() && self.generate_legal().is_empty()
    }

    #[must_use]
    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && self.generate_legal().is_empty()
    }

    /// Count leaf nodes of the legal move tree to `depth`. The ground
    /// truth for generator correctness.
    #[must_use]
    pub fn perft(&mut self, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.generate_legal();
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut nodes = 0;
        for &mv in &moves {
            let info = self.make_move(mv);
            nodes += self.perft(depth - 1);
            self.unmake_move(mv, info);
        }
        nodes
    }
}
