//! The per-thread searcher: iterative deepening, aspiration windows, and
//! the principal-variation alpha-beta recursion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;

use crate::board::{Bitboard, Board, Move, Piece, Square, MAX_PLY};
use crate::tt::{Bound, TranspositionTable};

use super::constants::{
    mate_in, mated_in, stat_bonus, DRAW, MATE, MATE_IN_MAX_PLY, SCORE_INFINITE, SCORE_NONE,
};
use super::history::ThreadTables;
use super::movepick::{ContinuationTrail, MovePicker};
use super::params::SearchParams;
use super::{InfoCallback, SearchLimits, SearchReport};

/// Base late-move reductions, indexed by depth and move count.
static LMR_TABLE: Lazy<[[i32; 64]; 64]> = Lazy::new(|| {
    let mut table = [[0; 64]; 64];
    for (depth, row) in table.iter_mut().enumerate().skip(1) {
        for (count, slot) in row.iter_mut().enumerate().skip(1) {
            let value = 0.75 + (depth as f64).ln() * (count as f64).ln() / 2.25;
            *slot = value as i32;
        }
    }
    table
});

#[inline]
fn lmr_base(depth: i32, move_count: usize) -> i32 {
    LMR_TABLE[(depth as usize).min(63)][move_count.min(63)]
}

#[derive(Clone, Copy)]
struct StackFrame {
    static_eval: i32,
    current_move: Move,
    /// (piece, destination) of `current_move`, for continuation history.
    moved: Option<(Piece, Square)>,
    mate_threat: bool,
}

impl Default for StackFrame {
    fn default() -> Self {
        StackFrame {
            static_eval: SCORE_NONE,
            current_move: Move::NONE,
            moved: None,
            mate_threat: false,
        }
    }
}

/// A single search thread's full state.
pub(crate) struct Searcher<'a> {
    pub board: &'a mut Board,
    pub(crate) tt: &'a TranspositionTable,
    pub tables: &'a mut ThreadTables,
    pub(crate) params: &'a SearchParams,
    stop: &'a AtomicBool,
    limits: SearchLimits,
    start: Instant,
    /// Hard deadline; polled every 1024 nodes.
    hard_deadline: Option<Instant>,
    /// Soft per-move budget in ms, checked between iterations.
    optimum_ms: Option<u64>,
    info: Option<InfoCallback>,
    /// Root moves this thread is allowed to play (MultiPV exclusions).
    root_moves: Vec<Move>,
    main_thread: bool,

    pub nodes: u64,
    pub seldepth: u32,
    pub root_best: Move,
    pub root_score: i32,
    pub completed_depth: i32,
    /// 1-based PV index reported in info lines (MultiPV).
    pub multipv_index: u32,
    stack: Vec<StackFrame>,
    nmp_min_ply: usize,
}

impl<'a> Searcher<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        board: &'a mut Board,
        tt: &'a TranspositionTable,
        tables: &'a mut ThreadTables,
        params: &'a SearchParams,
        stop: &'a AtomicBool,
        limits: SearchLimits,
        start: Instant,
        hard_deadline: Option<Instant>,
        optimum_ms: Option<u64>,
        info: Option<InfoCallback>,
        root_moves: Vec<Move>,
        main_thread: bool,
    ) -> Self {
        let root_best = root_moves.first().copied().unwrap_or(Move::NONE);
        Searcher {
            board,
            tt,
            tables,
            params,
            stop,
            limits,
            start,
            hard_deadline,
            optimum_ms,
            info,
            root_moves,
            main_thread,
            nodes: 0,
            seldepth: 0,
            root_best,
            root_score: -SCORE_INFINITE,
            completed_depth: 0,
            multipv_index: 1,
            stack: vec![StackFrame::default(); MAX_PLY + 8],
            nmp_min_ply: 0,
        }
    }

    // =====================================================================
    // Iterative deepening
    // =====================================================================

    /// Run iterative deepening until the depth limit, the soft time
    /// budget, or the stop flag ends the search.
    pub(crate) fn iterate(&mut self, max_depth: i32) {
        let mut prev_score = self.board.evaluate();
        let mut stability = 0u32;
        let mut prev_best = Move::NONE;
        let mut best_move_changes = 0u32;

        for depth in 1..=max_depth {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }

            let score = self.aspiration(depth, prev_score);
            if self.stop.load(Ordering::Relaxed) && self.completed_depth > 0 {
                // The in-flight iteration is unreliable; keep the last
                // completed one.
                break;
            }

            self.completed_depth = depth;
            if self.root_best == prev_best {
                stability = stability.saturating_add(1);
            } else {
                stability = 0;
                best_move_changes += 1;
            }

            if self.main_thread {
                self.report_iteration(depth, score);
            }

            // Mate-in-N limit from `go mate N`.
            if let Some(mate) = self.limits.mate {
                if score >= MATE - 2 * mate as i32 {
                    break;
                }
            }

            if self.main_thread
                && self.soft_limit_reached(score, prev_score, stability, best_move_changes)
            {
                self.stop.store(true, Ordering::Relaxed);
                break;
            }

            // Instability decays once accounted for.
            if depth % 4 == 0 {
                best_move_changes = best_move_changes.saturating_sub(1);
            }
            prev_best = self.root_best;
            prev_score = score;
        }
    }

    /// One iteration with an aspiration window around the previous score.
    fn aspiration(&mut self, depth: i32, prev_score: i32) -> i32 {
        let params = self.params;
        let mut delta = params
            .aspiration_base
            .max(prev_score.abs() / params.aspiration_score_div);

        let (mut alpha, mut beta) = if depth >= 4 {
            (
                (prev_score - delta).max(-SCORE_INFINITE),
                (prev_score + delta).min(SCORE_INFINITE),
            )
        } else {
            (-SCORE_INFINITE, SCORE_INFINITE)
        };

        loop {
            let score = self.alphabeta::<true>(depth, alpha, beta, 0, false, Move::NONE);
            if self.stop.load(Ordering::Relaxed) {
                return score;
            }
            if score <= alpha {
                beta = (alpha + beta) / 2;
                alpha = (score - delta).max(-SCORE_INFINITE);
            } else if score >= beta {
                beta = (score + delta).min(SCORE_INFINITE);
            } else {
                return score;
            }
            delta += delta / params.aspiration_growth_div + params.aspiration_growth_add;
        }
    }

    /// Scale the soft budget by best-move instability and eval trend, then
    /// compare against elapsed time.
    fn soft_limit_reached(
        &self,
        score: i32,
        prev_score: i32,
        stability: u32,
        best_move_changes: u32,
    ) -> bool {
        let Some(optimum) = self.optimum_ms else {
            return false;
        };
        let elapsed = self.start.elapsed().as_millis() as u64;

        let mut budget = optimum;
        // Unstable best move: think longer.
        budget += budget * 25 * u64::from(best_move_changes.min(8)) / 100;
        // Falling eval: think longer.
        if score < prev_score - 20 {
            budget = budget * 130 / 100;
        }
        // A long-stable best move can release time early.
        if stability >= 8 {
            budget = budget * 80 / 100;
        }
        elapsed >= budget
    }

    fn report_iteration(&mut self, depth: i32, score: i32) {
        let Some(callback) = self.info.clone() else {
            return;
        };
        let elapsed = self.start.elapsed().as_millis() as u64;
        let nps = if elapsed > 0 {
            self.nodes * 1000 / elapsed
        } else {
            0
        };
        let mate_in = if score.abs() >= MATE_IN_MAX_PLY {
            let plies = MATE - score.abs();
            let moves = (plies + 1) / 2;
            Some(if score > 0 { moves } else { -moves })
        } else {
            None
        };
        let pv = self.extract_pv(depth as usize);
        let report = SearchReport {
            multipv: self.multipv_index,
            depth,
            seldepth: self.seldepth,
            score,
            mate_in,
            nodes: self.nodes,
            nps,
            time_ms: elapsed,
            hashfull: self.tt.hashfull(),
            pv,
        };
        callback(&report);
    }

    /// Walk TT best moves from the root to rebuild the PV, verifying each
    /// move and guarding against hash cycles.
    fn extract_pv(&mut self, max_len: usize) -> String {
        let mut pv: Vec<Move> = Vec::new();
        let mut undo = Vec::new();
        let mut seen = Vec::new();

        if self.root_best.is_some() {
            pv.push(self.root_best);
            seen.push(self.board.key());
            undo.push((self.root_best, self.board.make_move(self.root_best)));
        }

        while pv.len() < max_len {
            if seen.contains(&self.board.key()) {
                break;
            }
            seen.push(self.board.key());
            let Some(hit) = self.tt.probe(self.board.key(), 0) else {
                break;
            };
            let mv = hit.mv;
            if !mv.is_some() || !self.board.is_pseudo_legal(mv) || !self.board.is_legal(mv) {
                break;
            }
            pv.push(mv);
            undo.push((mv, self.board.make_move(mv)));
        }

        for (mv, info) in undo.into_iter().rev() {
            self.board.unmake_move(mv, info);
        }

        pv.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    // =====================================================================
    // Node guts
    // =====================================================================

    /// Bump the node counter and poll the hard limits every 1024 nodes.
    #[inline]
    pub(crate) fn count_node(&mut self) {
        self.nodes += 1;
        if self.nodes & 1023 == 0 {
            if let Some(deadline) = self.hard_deadline {
                if Instant::now() >= deadline {
                    self.stop.store(true, Ordering::Relaxed);
                }
            }
            if let Some(limit) = self.limits.nodes {
                if self.nodes >= limit {
                    self.stop.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    #[inline]
    pub(crate) fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Draw score with a tiny ply-parity dither to avoid blind repetition.
    #[inline]
    fn draw_score(&self) -> i32 {
        DRAW + 1 - (self.nodes as i32 & 2)
    }

    pub(crate) fn trail(&self, ply: usize) -> ContinuationTrail {
        let prev = |offset: usize| {
            if ply >= offset {
                self.stack[ply - offset].moved
            } else {
                None
            }
        };
        [prev(1), prev(2), prev(4), prev(6)]
    }

    pub(crate) fn make_and_track(&mut self, mv: Move, ply: usize) -> crate::board::UnmakeInfo {
        let piece = self
            .board
            .piece_on(mv.from())
            .expect("search move has a mover");
        self.stack[ply].current_move = mv;
        self.stack[ply].moved = Some((piece, mv.to()));
        self.tables.killers.clear_ply(ply + 2);
        self.board.make_move(mv)
    }

    /// The principal-variation search. `PV` selects the node type at
    /// compile time; non-PV nodes always run a zero-width window.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn alphabeta<const PV: bool>(
        &mut self,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
        cut_node: bool,
        excluded: Move,
    ) -> i32 {
        debug_assert!(PV || alpha + 1 == beta);

        if depth <= 0 {
            return self.qsearch::<PV>(alpha, beta, ply, 0);
        }

        self.count_node();
        if self.stopped() {
            return 0;
        }

        let root = ply == 0;
        let in_check = self.board.in_check();
        let excluded_active = excluded.is_some();

        if PV && ply as u32 + 1 > self.seldepth {
            self.seldepth = ply as u32 + 1;
        }

        if !root {
            // Draws and horizon.
            if self.board.has_repeated()
                || self.board.halfmove_clock() >= 100
                || self.board.is_insufficient_material()
            {
                return self.draw_score();
            }
            if ply >= MAX_PLY {
                return if in_check { DRAW } else { self.board.evaluate() };
            }

            // Mate-distance pruning: no line from here can beat an
            // already-found shorter mate.
            alpha = alpha.max(mated_in(ply));
            beta = beta.min(mate_in(ply + 1));
            if alpha >= beta {
                return alpha;
            }
        }

        // Transposition-table probe. Skipped entirely during a singular
        // verification: the exclusion makes the stored data incomparable.
        let tt_hit = if excluded_active {
            None
        } else {
            self.tt.probe(self.board.key(), ply)
        };
        let (tt_move, tt_pv) = match &tt_hit {
            Some(hit) if self.board.is_pseudo_legal(hit.mv) => (hit.mv, hit.pv),
            Some(hit) => (Move::NONE, hit.pv),
            None => (Move::NONE, false),
        };

        if let Some(hit) = &tt_hit {
            if !PV && !root && hit.depth >= depth {
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

        // Static evaluation; in check the position has no usable eval.
        let eval = if in_check {
            SCORE_NONE
        } else {
            match &tt_hit {
                Some(hit) if hit.eval != SCORE_NONE => hit.eval,
                _ => self.board.evaluate(),
            }
        };
        self.stack[ply].static_eval = eval;
        self.stack[ply].mate_threat = false;

        let improving = !in_check
            && match () {
                () if ply >= 2 && self.stack[ply - 2].static_eval != SCORE_NONE => {
                    eval > self.stack[ply - 2].static_eval
                }
                () if ply >= 4 && self.stack[ply - 4].static_eval != SCORE_NONE => {
                    eval > self.stack[ply - 4].static_eval
                }
                () => true,
            };

        let params = self.params;

        if !PV && !in_check && !excluded_active && !root {
            // Razoring: hopeless nodes drop straight into quiescence.
            if depth <= params.razor_depth
                && eval + params.razor_base + params.razor_depth_mul * depth <= alpha
            {
                return self.qsearch::<false>(alpha, beta, ply, 0);
            }

            // Reverse futility: eval is so far above beta that a quiet
            // defence will hold.
            if depth <= params.rfp_depth
                && eval - params.rfp_margin * (depth - i32::from(improving)) >= beta
                && eval.abs() < MATE_IN_MAX_PLY
            {
                return eval;
            }

            // Null-move pruning with verification at high depth.
            if depth >= params.null_min_depth
                && eval >= beta
                && self.stack[ply - 1].current_move != Move::NULL
                && self.board.has_non_pawn_material(self.board.side_to_move())
                && beta > -MATE_IN_MAX_PLY
                && (self.nmp_min_ply == 0 || ply >= self.nmp_min_ply)
            {
                let r = params.null_base_reduction
                    + depth / params.null_depth_div
                    + ((eval - beta) / params.null_eval_div).min(3);
                let reduced = (depth - r).max(1);

                self.stack[ply].current_move = Move::NULL;
                self.stack[ply].moved = None;
                let info = self.board.make_null_move();
                let null_score =
                    -self.alphabeta::<false>(reduced, -beta, -beta + 1, ply + 1, !cut_node, Move::NONE);
                self.board.unmake_null_move(info);

                if self.stopped() {
                    return 0;
                }

                if null_score >= beta {
                    // Do not trust unproven mates out of a null search.
                    let score = null_score.min(MATE_IN_MAX_PLY - 1);
                    if depth < params.null_verify_depth || self.nmp_min_ply != 0 {
                        return score;
                    }
                    // Verification: re-search this node without the null
                    // move, disabling further nulls near the root of the
                    // verification subtree.
                    self.nmp_min_ply = ply + 3 * reduced as usize / 4;
                    let verified =
                        self.alphabeta::<false>(reduced, beta - 1, beta, ply, false, Move::NONE);
                    self.nmp_min_ply = 0;
                    if verified >= beta {
                        return score;
                    }
                } else if null_score <= -MATE_IN_MAX_PLY {
                    // Passing loses to a forced mate: extend defences.
                    self.stack[ply].mate_threat = true;
                }
            }

            // ProbCut: a good capture that beats beta by a margin at
            // reduced depth will almost surely beat it at full depth.
            let probcut_beta = beta + params.probcut_margin;
            if depth >= params.probcut_depth && beta.abs() < MATE_IN_MAX_PLY {
                let threshold = probcut_beta - eval;
                let mut picker = MovePicker::new_probcut(self.board, tt_move, threshold);
                let trail = self.trail(ply);
                while let Some(mv) =
                    picker.next_move(self.board, self.tables, &trail, ply, false)
                {
                    if mv == excluded || !self.board.is_legal(mv) {
                        continue;
                    }
                    let info = self.make_and_track(mv, ply);
                    let mut value =
                        -self.qsearch::<false>(-probcut_beta, -probcut_beta + 1, ply + 1, 0);
                    if value >= probcut_beta {
                        value = -self.alphabeta::<false>(
                            depth - 4,
                            -probcut_beta,
                            -probcut_beta + 1,
                            ply + 1,
                            !cut_node,
                            Move::NONE,
                        );
                    }
                    self.board.unmake_move(mv, info);
                    if self.stopped() {
                        return 0;
                    }
                    if value >= probcut_beta {
                        self.tt.store(
                            self.board.key(),
                            mv,
                            value,
                            eval,
                            depth - 3,
                            Bound::Lower,
                            tt_pv,
                            ply,
                        );
                        return value;
                    }
                }
            }
        }

        // Internal iterative reduction: a PV or cut node without a hash
        // move is cheaper to search one ply shallower first.
        let depth = if (PV || cut_node)
            && depth >= params.iir_min_depth
            && tt_move == Move::NONE
            && !excluded_active
        {
            depth - 1
        } else {
            depth
        };

        // =================================================================
        // Move loop
        // =================================================================

        let killers = self.tables.killers.get(ply);
        let prev_moved = if ply >= 1 { self.stack[ply - 1].moved } else { None };
        let counter = match prev_moved {
            Some((piece, to)) => self.tables.counters.get(piece, to),
            None => Move::NONE,
        };
        let mut picker = MovePicker::new_main(self.board, tt_move, killers, counter);
        let trail = self.trail(ply);

        let tt_capture = tt_move.is_some() && self.board.is_capture(tt_move);

        let mut best_score = -SCORE_INFINITE;
        let mut best_move = Move::NONE;
        let mut move_count = 0usize;
        let mut skip_quiets = false;
        let mut quiets_tried: Vec<Move> = Vec::with_capacity(32);
        let mut captures_tried: Vec<Move> = Vec::with_capacity(16);

        while let Some(mv) =
            picker.next_move(self.board, self.tables, &trail, ply, skip_quiets)
        {
            if mv == excluded {
                continue;
            }
            if root && !self.root_moves.contains(&mv) {
                continue;
            }
            if !self.board.is_legal(mv) {
                continue;
            }

            move_count += 1;
            let is_quiet = !self.board.is_tactical(mv);
            let gives_check = self.board.gives_check(mv);

            // Shallow-depth pruning of late moves, once something holds.
            if !root
                && best_score > -MATE_IN_MAX_PLY
                && self.board.has_non_pawn_material(self.board.side_to_move())
            {
                if is_quiet {
                    if move_count >= params.lmp_threshold(depth, improving) {
                        skip_quiets = true;
                    }
                    // Futility: a quiet move cannot repair a hopeless eval.
                    if !in_check
                        && !gives_check
                        && depth <= params.futility_depth
                        && eval + params.futility_base + params.futility_margin * depth <= alpha
                    {
                        continue;
                    }
                    if depth <= 8 && !self.board.see_ge(mv, -params.see_quiet_mul * depth * depth)
                    {
                        continue;
                    }
                } else if depth <= 8
                    && !self.board.see_ge(mv, -params.see_capture_mul * depth)
                {
                    continue;
                }
            }

            // Extensions.
            let mut extension = 0;
            let mut singular_extended = false;
            let singular_candidate = !root
                && !excluded_active
                && mv == tt_move
                && depth >= params.singular_min_depth
                && tt_hit.as_ref().is_some_and(|hit| {
                    hit.score.abs() < MATE_IN_MAX_PLY
                        && hit.bound != Bound::Upper
                        && hit.depth >= depth - 3
                });
            if singular_candidate {
                let hit = tt_hit.as_ref().expect("singular candidate has a TT hit");
                let singular_beta = hit.score - params.singular_margin_mul * depth;
                let singular_depth = (depth - 1) / 2;
                let value = self.alphabeta::<false>(
                    singular_depth,
                    singular_beta - 1,
                    singular_beta,
                    ply,
                    cut_node,
                    mv,
                );
                if value < singular_beta {
                    extension = 1;
                    singular_extended = true;
                    // Everything else fails by a wide margin: trust the
                    // hash move twice over.
                    if !PV && value < singular_beta - params.singular_double_margin {
                        extension = 2;
                    }
                } else if singular_beta >= beta {
                    // Multi-cut: even with the best move excluded this
                    // node fails high.
                    return singular_beta;
                }
            } else if gives_check {
                extension = 1;
            } else if self.stack[ply].mate_threat && depth <= 4 {
                extension = 1;
            } else if is_quiet
                && depth <= 4
                && self.board.piece_on(mv.from()) == Some(Piece::Pawn)
                && Bitboard::pre_promotion_rank(self.board.side_to_move()).contains(mv.to())
            {
                // A pawn reaching the seventh rank deserves a full look.
                extension = 1;
            }

            let new_depth = depth - 1 + extension;
            let info = self.make_and_track(mv, ply);

            let mut value;
            if depth >= params.lmr_min_depth
                && move_count > params.lmr_move_threshold + usize::from(root)
                && (is_quiet || cut_node)
            {
                // Late-move reduction.
                let mut r = lmr_base(depth, move_count);
                if cut_node {
                    r += 1;
                }
                if tt_capture {
                    r += 1;
                }
                if tt_pv {
                    r -= 1;
                }
                if PV {
                    r -= 1;
                }
                if singular_extended {
                    r -= 1;
                }
                if is_quiet {
                    // History statistic, tapered in with depth.
                    let stat = super::movepick::quiet_stat(self.board, self.tables, &trail, mv);
                    let taper = depth.min(12);
                    r -= (stat - params.lmr_stat_delta) * taper / (params.lmr_hist_div * 12);
                }
                let r = r.clamp(0, (new_depth - 1).max(0));
                let reduced = (new_depth - r).max(1);

                value =
                    -self.alphabeta::<false>(reduced, -alpha - 1, -alpha, ply + 1, true, Move::NONE);
                if value > alpha && reduced < new_depth {
                    value = -self.alphabeta::<false>(
                        new_depth,
                        -alpha - 1,
                        -alpha,
                        ply + 1,
                        !cut_node,
                        Move::NONE,
                    );
                }
            } else if !PV || move_count > 1 {
                value = -self.alphabeta::<false>(
                    new_depth,
                    -alpha - 1,
                    -alpha,
                    ply + 1,
                    !cut_node,
                    Move::NONE,
                );
            } else {
                value = alpha + 1; // Force the PV search below.
            }

            if PV && (move_count == 1 || (value > alpha && (root || value < beta))) {
                value =
                    -self.alphabeta::<true>(new_depth, -beta, -alpha, ply + 1, false, Move::NONE);
            }

            self.board.unmake_move(mv, info);

            if self.stopped() {
                return 0;
            }

            if value > best_score {
                best_score = value;
                if value > alpha {
                    best_move = mv;
                    if root {
                        self.root_best = mv;
                        self.root_score = value;
                    }
                    if PV && value < beta {
                        alpha = value;
                    } else {
                        break; // Beta cutoff.
                    }
                }
            }

            if mv != best_move {
                if is_quiet && quiets_tried.len() < 48 {
                    quiets_tried.push(mv);
                } else if !is_quiet && captures_tried.len() < 24 {
                    captures_tried.push(mv);
                }
            }
        }

        // Checkmate, stalemate, or an all-excluded singular search.
        if move_count == 0 {
            return if excluded_active {
                alpha
            } else if in_check {
                mated_in(ply)
            } else {
                DRAW
            };
        }

        if best_score >= beta {
            self.update_stats(best_move, &quiets_tried, &captures_tried, depth, ply);
        }

        if !excluded_active && !self.stopped() {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if PV && best_move.is_some() {
                Bound::Exact
            } else {
                Bound::Upper
            };
            self.tt.store(
                self.board.key(),
                best_move,
                best_score,
                eval,
                depth,
                bound,
                tt_pv || PV,
                ply,
            );
        }

        best_score
    }

    /// History bookkeeping after a beta cutoff: gravity bonus for the move
    /// that cut, symmetric malus for everything tried before it.
    fn update_stats(
        &mut self,
        best_move: Move,
        quiets_tried: &[Move],
        captures_tried: &[Move],
        depth: i32,
        ply: usize,
    ) {
        let bonus = stat_bonus(depth);
        let us = self.board.side_to_move();
        let trail = self.trail(ply);

        if !self.board.is_tactical(best_move) {
            self.tables.butterfly.update(us, best_move, bonus);
            self.tables.low_ply.update(ply, best_move, bonus);
            self.tables.killers.update(ply, best_move);

            if let Some(piece) = self.board.piece_on(best_move.from()) {
                continuation_update(self.tables, &trail, piece, best_move.to(), bonus);
            }
            if ply >= 1 {
                if let Some((prev_piece, prev_to)) = self.stack[ply - 1].moved {
                    self.tables.counters.set(prev_piece, prev_to, best_move);
                }
            }

            for &quiet in quiets_tried {
                self.tables.butterfly.update(us, quiet, -bonus);
                self.tables.low_ply.update(ply, quiet, -bonus);
                if let Some(piece) = self.board.piece_on(quiet.from()) {
                    continuation_update(self.tables, &trail, piece, quiet.to(), -bonus);
                }
            }
        } else if let Some(piece) = self.board.piece_on(best_move.from()) {
            let victim = capture_victim(self.board, best_move);
            self.tables
                .capture
                .update(piece, best_move.to(), victim, bonus);
        }

        for &capture in captures_tried {
            if let Some(piece) = self.board.piece_on(capture.from()) {
                let victim = capture_victim(self.board, capture);
                self.tables.capture.update(piece, capture.to(), victim, -bonus);
            }
        }
    }
}

fn capture_victim(board: &Board, mv: Move) -> Piece {
    if mv.is_en_passant() {
        Piece::Pawn
    } else {
        board.piece_on(mv.to()).unwrap_or(Piece::Pawn)
    }
}

fn continuation_update(
    tables: &mut ThreadTables,
    trail: &ContinuationTrail,
    piece: Piece,
    to: Square,
    value: i32,
) {
    for prev in trail.iter().flatten() {
        tables.continuation.update(prev.0, prev.1, piece, to, value);
    }
}
