//! Staged move picker.
//!
//! An explicit state machine: each call to `next_move` resumes the
//! current stage, generating and scoring moves lazily so that a beta
//! cutoff on the hash move costs no generation work at all.
//!
//! Main-search order: TT move, winning captures, killers, counter move,
//! quiets by history, losing captures. Evasion, quiescence and ProbCut
//! searches run reduced stage sets.

use crate::board::{Board, GenKind, Move, MoveList, Piece, ScoredMoveList, Square};

use super::history::ThreadTables;


const CAPTURE_VICTIM_MUL: i32 = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Stage {
    TtMove,
    CapturesInit,
    GoodCaptures,
    Killer0,
    Killer1,
    Counter,
    QuietsInit,
    Quiets,
    BadCaptures,
    EvasionsInit,
    Evasions,
    QCapturesInit,
    QCaptures,
    QChecksInit,
    QChecks,
    ProbCutInit,
    ProbCutCaptures,
    Done,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mode {
    Main,
    QSearch { gen_checks: bool },
    ProbCut { threshold: i32 },
}

/// Previous-move context for continuation-history scoring: the (piece,
/// destination) of the moves made one, two, four and six plies up the
/// line.
pub(crate) type ContinuationTrail = [Option<(Piece, Square)>; 4];

pub(crate) struct MovePicker {
    stage: Stage,
    mode: Mode,
    tt_move: Move,
    killers: [Move; 2],
    counter: Move,
    list: ScoredMoveList,
    bad_captures: ScoredMoveList,
    idx: usize,
    bad_idx: usize,
}

impl MovePicker {
    /// Picker for the main alpha-beta search.
    pub(crate) fn new_main(
        board: &Board,
        tt_move: Move,
        killers: [Move; 2],
        counter: Move,
    ) -> Self {
        let tt_move = if tt_move.is_some() && board.is_pseudo_legal(tt_move) {
            tt_move
        } else {
            Move::NONE
        };
        MovePicker {
            stage: Stage::TtMove,
            mode: Mode::Main,
            tt_move,
            killers,
            counter,
            list: ScoredMoveList::new(),
            bad_captures: ScoredMoveList::new(),
            idx: 0,
            bad_idx: 0,
        }
    }

    /// Picker for the quiescence search. `gen_checks` adds quiet checks
    /// after the captures.
    pub(crate) fn new_qsearch(board: &Board, tt_move: Move, gen_checks: bool) -> Self {
        let tt_ok = tt_move.is_some()
            && board.is_pseudo_legal(tt_move)
            && (board.in_check() || gen_checks || board.is_tactical(tt_move));
        MovePicker {
            stage: Stage::TtMove,
            mode: Mode::QSearch { gen_checks },
            tt_move: if tt_ok { tt_move } else { Move::NONE },
            killers: [Move::NONE; 2],
            counter: Move::NONE,
            list: ScoredMoveList::new(),
            bad_captures: ScoredMoveList::new(),
            idx: 0,
            bad_idx: 0,
        }
    }

    /// Picker for ProbCut: only captures expected to gain at least
    /// `threshold`.
    pub(crate) fn new_probcut(board: &Board, tt_move: Move, threshold: i32) -> Self {
        let tt_ok = tt_move.is_some()
            && board.is_pseudo_legal(tt_move)
            && board.is_capture(tt_move)
            && board.see_ge(tt_move, threshold);
        MovePicker {
            stage: Stage::TtMove,
            mode: Mode::ProbCut { threshold },
            tt_move: if tt_ok { tt_move } else { Move::NONE },
            killers: [Move::NONE; 2],
            counter: Move::NONE,
            list: ScoredMoveList::new(),
            bad_captures: ScoredMoveList::new(),
            idx: 0,
            bad_idx: 0,
        }
    }

    fn stage_after_tt(&self, board: &Board) -> Stage {
        if board.in_check() {
            return Stage::EvasionsInit;
        }
        match self.mode {
            Mode::Main => Stage::CapturesInit,
            Mode::QSearch { .. } => Stage::QCapturesInit,
            Mode::ProbCut { .. } => Stage::ProbCutInit,
        }
    }

    /// Produce the next move, or `None` when every stage is exhausted.
    /// `skip_quiets` drops the killer, counter and quiet stages; it may
    /// start holding mid-enumeration (late-move pruning).
    pub(crate) fn next_move(
        &mut self,
        board: &Board,
        tables: &ThreadTables,
        trail: &ContinuationTrail,
        ply: usize,
        skip_quiets: bool,
    ) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = self.stage_after_tt(board);
                    if self.tt_move.is_some() {
                        return Some(self.tt_move);
                    }
                }

                Stage::CapturesInit => {
                    let mut moves = MoveList::new();
                    board.generate(GenKind::Captures, &mut moves);
                    self.score_captures(board, tables, &moves);
                    self.idx = 0;
                    self.stage = Stage::GoodCaptures;
                }

                Stage::GoodCaptures => match self.list.pick_best(self.idx) {
                    Some(scored) => {
                        self.idx += 1;
                        if scored.mv == self.tt_move {
                            continue;
                        }
                        if board.see_ge(scored.mv, 0) {
                            return Some(scored.mv);
                        }
                        self.bad_captures.push(scored.mv, scored.score);
                    }
                    None => self.stage = Stage::Killer0,
                },

                Stage::Killer0 => {
                    self.stage = Stage::Killer1;
                    let killer = self.killers[0];
                    if !skip_quiets && self.is_viable_quiet(board, killer) {
                        return Some(killer);
                    }
                }

                Stage::Killer1 => {
                    self.stage = Stage::Counter;
                    let killer = self.killers[1];
                    if !skip_quiets && killer != self.killers[0] && self.is_viable_quiet(board, killer)
                    {
                        return Some(killer);
                    }
                }

                Stage::Counter => {
                    self.stage = Stage::QuietsInit;
                    let counter = self.counter;
                    if !skip_quiets
                        && counter != self.killers[0]
                        && counter != self.killers[1]
                        && self.is_viable_quiet(board, counter)
                    {
                        return Some(counter);
                    }
                }

                Stage::QuietsInit => {
                    if skip_quiets {
                        self.stage = Stage::BadCaptures;
                        continue;
                    }
                    let mut moves = MoveList::new();
                    board.generate(GenKind::Quiets, &mut moves);
                    self.list.clear();
                    self.score_quiets(board, tables, trail, ply, &moves);
                    self.idx = 0;
                    self.stage = Stage::Quiets;
                }

                Stage::Quiets => {
                    if skip_quiets {
                        self.stage = Stage::BadCaptures;
                        continue;
                    }
                    match self.list.pick_best(self.idx) {
                        Some(scored) => {
                            self.idx += 1;
                            let mv = scored.mv;
                            if mv == self.tt_move
                                || mv == self.killers[0]
                                || mv == self.killers[1]
                                || mv == self.counter
                            {
                                continue;
                            }
                            return Some(mv);
                        }
                        None => self.stage = Stage::BadCaptures,
                    }
                }

                Stage::BadCaptures => match self.bad_captures.pick_best(self.bad_idx) {
                    Some(scored) => {
                        self.bad_idx += 1;
                        return Some(scored.mv);
                    }
                    None => self.stage = Stage::Done,
                },

                Stage::EvasionsInit => {
                    let mut moves = MoveList::new();
                    board.generate(GenKind::Evasions, &mut moves);
                    self.score_evasions(board, tables, trail, ply, &moves);
                    self.idx = 0;
                    self.stage = Stage::Evasions;
                }

                Stage::Evasions => match self.list.pick_best(self.idx) {
                    Some(scored) => {
                        self.idx += 1;
                        if scored.mv == self.tt_move {
                            continue;
                        }
                        return Some(scored.mv);
                    }
                    None => self.stage = Stage::Done,
                },

                Stage::QCapturesInit => {
                    let mut moves = MoveList::new();
                    board.generate(GenKind::Captures, &mut moves);
                    self.score_captures(board, tables, &moves);
                    self.idx = 0;
                    self.stage = Stage::QCaptures;
                }

                Stage::QCaptures => match self.list.pick_best(self.idx) {
                    Some(scored) => {
                        self.idx += 1;
                        if scored.mv == self.tt_move {
                            continue;
                        }
                        return Some(scored.mv);
                    }
                    None => {
                        let gen_checks = matches!(self.mode, Mode::QSearch { gen_checks: true });
                        self.stage = if gen_checks {
                            Stage::QChecksInit
                        } else {
                            Stage::Done
                        };
                    }
                },

                Stage::QChecksInit => {
                    let mut moves = MoveList::new();
                    board.generate(GenKind::QuietChecks, &mut moves);
                    self.list.clear();
                    for &mv in &moves {
                        self.list.push(mv, 0);
                    }
                    self.idx = 0;
                    self.stage = Stage::QChecks;
                }

                Stage::QChecks => match self.list.pick_best(self.idx) {
                    Some(scored) => {
                        self.idx += 1;
                        if scored.mv == self.tt_move {
                            continue;
                        }
                        return Some(scored.mv);
                    }
                    None => self.stage = Stage::Done,
                },

                Stage::ProbCutInit => {
                    let mut moves = MoveList::new();
                    board.generate(GenKind::Captures, &mut moves);
                    self.score_captures(board, tables, &moves);
                    self.idx = 0;
                    self.stage = Stage::ProbCutCaptures;
                }

                Stage::ProbCutCaptures => {
                    let Mode::ProbCut { threshold } = self.mode else {
                        unreachable!("probcut stage outside probcut mode");
                    };
                    match self.list.pick_best(self.idx) {
                        Some(scored) => {
                            self.idx += 1;
                            if scored.mv == self.tt_move || !board.see_ge(scored.mv, threshold) {
                                continue;
                            }
                            return Some(scored.mv);
                        }
                        None => self.stage = Stage::Done,
                    }
                }

                Stage::Done => return None,
            }
        }
    }

    /// A killer or counter move is only tried if it is a quiet,
    /// pseudo-legal move distinct from the TT move.
    fn is_viable_quiet(&self, board: &Board, mv: Move) -> bool {
        mv.is_some()
            && mv != self.tt_move
            && !board.is_capture(mv)
            && board.is_pseudo_legal(mv)
    }

    fn capture_victim(board: &Board, mv: Move) -> Piece {
        if mv.is_en_passant() {
            Piece::Pawn
        } else {
            board.piece_on(mv.to()).unwrap_or(Piece::Pawn)
        }
    }

    fn score_captures(&mut self, board: &Board, tables: &ThreadTables, moves: &MoveList) {
        self.list.clear();
        for &mv in moves {
            let victim = Self::capture_victim(board, mv);
            let piece = board.piece_on(mv.from()).expect("capture has a mover");
            let score = victim.value() * CAPTURE_VICTIM_MUL
                + tables.capture.get(piece, mv.to(), victim);
            self.list.push(mv, score);
        }
    }

    fn quiet_score(
        board: &Board,
        tables: &ThreadTables,
        trail: &ContinuationTrail,
        ply: usize,
        mv: Move,
    ) -> i32 {
        quiet_stat(board, tables, trail, mv) + tables.low_ply.get(ply, mv)
    }

    fn score_quiets(
        &mut self,
        board: &Board,
        tables: &ThreadTables,
        trail: &ContinuationTrail,
        ply: usize,
        moves: &MoveList,
    ) {
        for &mv in moves {
            let score = Self::quiet_score(board, tables, trail, ply, mv);
            self.list.push(mv, score);
        }
    }

    /// In check, captures of the checker come first by victim value,
    /// then quiet interpositions by history.
    fn score_evasions(
        &mut self,
        board: &Board,
        tables: &ThreadTables,
        trail: &ContinuationTrail,
        ply: usize,
        moves: &MoveList,
    ) {
        const CAPTURE_BONUS: i32 = 1 << 24;
        self.list.clear();
        for &mv in moves {
            let score = if board.is_capture(mv) {
                CAPTURE_BONUS + Self::capture_victim(board, mv).value() * CAPTURE_VICTIM_MUL
            } else {
                Self::quiet_score(board, tables, trail, ply, mv)
            };
            self.list.push(mv, score);
        }
    }
}

/// Butterfly plus continuation history of a quiet move; shared with the
/// late-move-reduction statistic in the search.
pub(crate) fn quiet_stat(
    board: &Board,
    tables: &ThreadTables,
    trail: &ContinuationTrail,
    mv: Move,
) -> i32 {
    let piece = board.piece_on(mv.from()).expect("quiet move has a mover");
    let mut score = tables.butterfly.get(board.side_to_move(), mv);
    for prev in trail.iter().flatten() {
        score += tables.continuation.entry(prev.0, prev.1)[piece.index()][mv.to().index()];
    }
    score
}
