//! Quiescence search: resolve captures (and entry-ply checks) so the
//! static evaluation is only ever trusted in quiet positions.

use crate::board::{Move, MAX_PLY};
use crate::tt::Bound;

use super::constants::{
    mated_in, DRAW, MATE_IN_MAX_PLY, QS_CHECKS_DEPTH, QS_MAX_DEPTH, SCORE_INFINITE, SCORE_NONE,
};
use super::movepick::MovePicker;
use super::Searcher;

impl Searcher<'_> {
    /// `qs_depth` starts at 0 and decreases; quiet checks are only
    /// generated at the entry ply.
    pub(crate) fn qsearch<const PV: bool>(
        &mut self,
        mut alpha: i32,
        beta: i32,
        ply: usize,
        qs_depth: i32,
    ) -> i32 {
        debug_assert!(PV || alpha + 1 == beta);

        self.count_node();
        if self.stopped() {
            return 0;
        }
        if PV && ply as u32 + 1 > self.seldepth {
            self.seldepth = ply as u32 + 1;
        }

        if self.board.has_repeated()
            || self.board.halfmove_clock() >= 100
            || self.board.is_insufficient_material()
        {
            return DRAW;
        }

        let in_check = self.board.in_check();
        if ply >= MAX_PLY || qs_depth <= QS_MAX_DEPTH {
            return if in_check { DRAW } else { self.board.evaluate() };
        }

        let tt_hit = self.tt.probe(self.board.key(), ply);
        if let Some(hit) = &tt_hit {
            if !PV {
                let cutoff = match hit.bound {
                    Bound::Exact => true,
                    Bound::Lower => hit.score >= beta,
                    Bound::Upper => hit.score <= alpha,
                };
                if cutoff {
                    return hit.score;
                }
            }
        }
        let tt_move = tt_hit.as_ref().map_or(Move::NONE, |hit| hit.mv);

        // Stand pat: outside check the static eval bounds the score from
        // below, since the side to move can usually decline all captures.
        let eval;
        let mut best;
        if in_check {
            eval = SCORE_NONE;
            best = -SCORE_INFINITE;
        } else {
            eval = match &tt_hit {
                Some(hit) if hit.eval != SCORE_NONE => hit.eval,
                _ => self.board.evaluate(),
            };
            best = eval;
            if best >= beta {
                if tt_hit.is_none() {
                    self.tt.store(
                        self.board.key(),
                        Move::NONE,
                        best,
                        eval,
                        0,
                        Bound::Lower,
                        false,
                        ply,
                    );
                }
                return best;
            }
            if best > alpha {
                alpha = best;
            }
        }
        let futility_base = if in_check {
            -SCORE_INFINITE
        } else {
            eval + self.params.qs_futility_margin
        };

        let gen_checks = qs_depth >= QS_CHECKS_DEPTH;
        let mut picker = MovePicker::new_qsearch(self.board, tt_move, gen_checks);
        let trail = self.trail(ply);

        let mut best_move = Move::NONE;
        let mut move_count = 0;

        while let Some(mv) = picker.next_move(self.board, self.tables, &trail, ply, false) {
            if !self.board.is_legal(mv) {
                continue;
            }
            move_count += 1;

            if !in_check && best > -MATE_IN_MAX_PLY {
                // Futility (delta) pruning: even winning this victim with
                // a margin cannot raise alpha.
                if self.board.is_capture(mv) && !mv.is_promotion() && !self.board.gives_check(mv)
                {
                    let victim = self
                        .board
                        .piece_on(mv.to())
                        .map_or(100, crate::board::Piece::value);
                    let bound = futility_base + victim;
                    if bound <= alpha {
                        best = best.max(bound);
                        continue;
                    }
                }
                // Losing exchanges are not worth resolving.
                if !self.board.see_ge(mv, 0) {
                    continue;
                }
            }

            let info = self.make_and_track(mv, ply);
            let value = -self.qsearch::<PV>(-beta, -alpha, ply + 1, qs_depth - 1);
            self.board.unmake_move(mv, info);

            if self.stopped() {
                return 0;
            }

            if value > best {
                best = value;
                if value > alpha {
                    best_move = mv;
                    if PV && value < beta {
                        alpha = value;
                    } else {
                        break;
                    }
                }
            }
        }

        // Every evasion was generated, so no move means mate.
        if in_check && move_count == 0 {
            return mated_in(ply);
        }

        if !self.stopped() {
            let bound = if best >= beta {
                Bound::Lower
            } else {
                Bound::Upper
            };
            self.tt.store(
                self.board.key(),
                best_move,
                best,
                eval,
                0,
                bound,
                false,
                ply,
            );
        }

        best
    }
}
