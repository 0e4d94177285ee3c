//! Move-ordering statistics.
//!
//! Five history tables plus killers, all per thread. Every numeric table
//! uses the gravity update `h += v - h*|v|/MAX`, which saturates smoothly
//! at its ceiling and decays stale values as new evidence arrives.

use crate::board::{Color, Move, Piece, Square, MAX_PLY};

use super::constants::{
    BUTTERFLY_HISTORY_MAX, CAPTURE_HISTORY_MAX, CONTINUATION_HISTORY_MAX, LOW_PLY_HISTORY_MAX,
};

#[inline]
fn gravity(slot: &mut i32, bonus: i32, max: i32) {
    let clamped = bonus.clamp(-max, max);
    *slot += clamped - *slot * clamped.abs() / max;
}

/// Quiet-move history indexed by side to move and from/to squares.
pub struct ButterflyHistory {
    table: Box<[[i32; 4096]; 2]>,
}

impl ButterflyHistory {
    #[must_use]
    pub fn new() -> Self {
        ButterflyHistory {
            table: Box::new([[0; 4096]; 2]),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, color: Color, mv: Move) -> i32 {
        self.table[color.index()][mv.from_to()]
    }

    #[inline]
    pub fn update(&mut self, color: Color, mv: Move, bonus: i32) {
        gravity(
            &mut self.table[color.index()][mv.from_to()],
            bonus,
            BUTTERFLY_HISTORY_MAX,
        );
    }

    pub fn clear(&mut self) {
        *self.table = [[0; 4096]; 2];
    }
}

/// Capture history indexed by moving piece, destination, and victim type.
pub struct CaptureHistory {
    table: Box<[[[i32; 6]; 64]; 6]>,
}

impl CaptureHistory {
    #[must_use]
    pub fn new() -> Self {
        CaptureHistory {
            table: Box::new([[[0; 6]; 64]; 6]),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, piece: Piece, to: Square, victim: Piece) -> i32 {
        self.table[piece.index()][to.index()][victim.index()]
    }

    #[inline]
    pub fn update(&mut self, piece: Piece, to: Square, victim: Piece, bonus: i32) {
        gravity(
            &mut self.table[piece.index()][to.index()][victim.index()],
            bonus,
            CAPTURE_HISTORY_MAX,
        );
    }

    pub fn clear(&mut self) {
        *self.table = [[[0; 6]; 64]; 6];
    }
}

/// One piece-to table: the follow-up scores of (piece, to) pairs.
pub type PieceToHistory = [[i32; 64]; 6];

/// Continuation history: for each previous (piece, to) pair, a full
/// piece-to table scoring the moves that tend to follow it. Chained
/// through the move trail one, two, four and six plies back.
pub struct ContinuationHistory {
    table: Box<[[PieceToHistory; 64]; 6]>,
}

impl ContinuationHistory {
    #[must_use]
    pub fn new() -> Self {
        // Heap-allocate via Vec: the table is ~2.3 MB, too large for the
        // stack of a test thread.
        let table: Box<[[PieceToHistory; 64]; 6]> = vec![[[[0; 64]; 6]; 64]; 6]
            .into_boxed_slice()
            .try_into()
            .map_err(|_| ())
            .expect("continuation table has exactly six outer entries");
        ContinuationHistory { table }
    }

    /// The follow-up table for a previous move's (piece, to).
    #[inline]
    #[must_use]
    pub fn entry(&self, prev_piece: Piece, prev_to: Square) -> &PieceToHistory {
        &self.table[prev_piece.index()][prev_to.index()]
    }

    #[inline]
    pub fn update(
        &mut self,
        prev_piece: Piece,
        prev_to: Square,
        piece: Piece,
        to: Square,
        bonus: i32,
    ) {
        gravity(
            &mut self.table[prev_piece.index()][prev_to.index()][piece.index()][to.index()],
            bonus,
            CONTINUATION_HISTORY_MAX,
        );
    }

    pub fn clear(&mut self) {
        for outer in self.table.iter_mut() {
            for table in outer.iter_mut() {
                *table = [[0; 64]; 6];
            }
        }
    }
}

/// Plies close to the root that get the extra low-ply weighting.
const LOW_PLY_SPAN: usize = 4;

/// Extra weight for quiets near the root, where ordering matters most.
pub struct LowPlyHistory {
    table: Box<[[i32; 4096]; LOW_PLY_SPAN]>,
}

impl LowPlyHistory {
    #[must_use]
    pub fn new() -> Self {
        LowPlyHistory {
            table: Box::new([[0; 4096]; LOW_PLY_SPAN]),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, ply: usize, mv: Move) -> i32 {
        if ply < LOW_PLY_SPAN {
            self.table[ply][mv.from_to()]
        } else {
            0
        }
    }

    #[inline]
    pub fn update(&mut self, ply: usize, mv: Move, bonus: i32) {
        if ply < LOW_PLY_SPAN {
            gravity(&mut self.table[ply][mv.from_to()], bonus, LOW_PLY_HISTORY_MAX);
        }
    }

    pub fn clear(&mut self) {
        *self.table = [[0; 4096]; LOW_PLY_SPAN];
    }
}

/// The quiet move that most recently refuted a move arriving on (piece, to).
pub struct CounterMoves {
    table: Box<[[Move; 64]; 6]>,
}

impl CounterMoves {
    #[must_use]
    pub fn new() -> Self {
        CounterMoves {
            table: Box::new([[Move::NONE; 64]; 6]),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, prev_piece: Piece, prev_to: Square) -> Move {
        self.table[prev_piece.index()][prev_to.index()]
    }

    #[inline]
    pub fn set(&mut self, prev_piece: Piece, prev_to: Square, mv: Move) {
        self.table[prev_piece.index()][prev_to.index()] = mv;
    }

    pub fn clear(&mut self) {
        *self.table = [[Move::NONE; 64]; 6];
    }
}

/// Two killer slots per ply.
pub struct KillerTable {
    table: [[Move; 2]; MAX_PLY],
}

impl KillerTable {
    #[must_use]
    pub fn new() -> Self {
        KillerTable {
            table: [[Move::NONE; 2]; MAX_PLY],
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, ply: usize) -> [Move; 2] {
        if ply < MAX_PLY {
            self.table[ply]
        } else {
            [Move::NONE; 2]
        }
    }

    #[inline]
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply < MAX_PLY && self.table[ply][0] != mv {
            self.table[ply][1] = self.table[ply][0];
            self.table[ply][0] = mv;
        }
    }

    /// Children's killers are cleared as the search descends so stale
    /// moves from sibling subtrees are not preferred.
    #[inline]
    pub fn clear_ply(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.table[ply] = [Move::NONE; 2];
        }
    }

    pub fn clear(&mut self) {
        self.table = [[Move::NONE; 2]; MAX_PLY];
    }
}

/// All per-thread move-ordering state.
pub struct ThreadTables {
    pub butterfly: ButterflyHistory,
    pub capture: CaptureHistory,
    pub continuation: ContinuationHistory,
    pub low_ply: LowPlyHistory,
    pub counters: CounterMoves,
    pub killers: KillerTable,
}

impl ThreadTables {
    #[must_use]
    pub fn new() -> Self {
        ThreadTables {
            butterfly: ButterflyHistory::new(),
            capture: CaptureHistory::new(),
            continuation: ContinuationHistory::new(),
            low_ply: LowPlyHistory::new(),
            counters: CounterMoves::new(),
            killers: KillerTable::new(),
        }
    }

    /// Forget tactical helpers between searches; numeric histories keep
    /// their (decaying) knowledge.
    pub fn new_search(&mut self) {
        self.killers.clear();
        self.counters.clear();
        self.low_ply.clear();
    }

    pub fn clear(&mut self) {
        self.butterfly.clear();
        self.capture.clear();
        self.continuation.clear();
        self.low_ply.clear();
        self.counters.clear();
        self.killers.clear();
    }
}

impl Default for ThreadTables {
    fn default() -> Self {
        ThreadTables::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;

    fn mv(from: usize, to: usize) -> Move {
        Move::new(Square::from_index(from), Square::from_index(to))
    }

    #[test]
    fn test_gravity_saturates() {
        let mut history = ButterflyHistory::new();
        let m = mv(12, 28);
        for _ in 0..200 {
            history.update(Color::White, m, 1594);
        }
        let score = history.get(Color::White, m);
        assert!(score <= BUTTERFLY_HISTORY_MAX);
        assert!(score > BUTTERFLY_HISTORY_MAX / 2);
    }

    #[test]
    fn test_gravity_malus_pulls_down() {
        let mut history = ButterflyHistory::new();
        let m = mv(12, 28);
        history.update(Color::White, m, 1000);
        let high = history.get(Color::White, m);
        history.update(Color::White, m, -1000);
        assert!(history.get(Color::White, m) < high);
    }

    #[test]
    fn test_butterfly_is_per_color() {
        let mut history = ButterflyHistory::new();
        let m = mv(12, 28);
        history.update(Color::White, m, 500);
        assert_eq!(history.get(Color::Black, m), 0);
    }

    #[test]
    fn test_killer_shift() {
        let mut killers = KillerTable::new();
        let a = mv(0, 1);
        let b = mv(0, 2);
        killers.update(3, a);
        assert_eq!(killers.get(3), [a, Move::NONE]);
        killers.update(3, b);
        assert_eq!(killers.get(3), [b, a]);
        // Re-inserting the primary killer must not duplicate it.
        killers.update(3, b);
        assert_eq!(killers.get(3), [b, a]);
    }

    #[test]
    fn test_killer_out_of_range_ply() {
        let mut killers = KillerTable::new();
        killers.update(MAX_PLY + 10, mv(0, 1));
        assert_eq!(killers.get(MAX_PLY + 10), [Move::NONE; 2]);
    }

    #[test]
    fn test_counter_moves() {
        let mut counters = CounterMoves::new();
        let reply = mv(50, 42);
        counters.set(Piece::Knight, Square::from_index(20), reply);
        assert_eq!(counters.get(Piece::Knight, Square::from_index(20)), reply);
        assert_eq!(counters.get(Piece::Knight, Square::from_index(21)), Move::NONE);
    }

    #[test]
    fn test_continuation_entry_updates() {
        let mut cont = ContinuationHistory::new();
        let prev_to = Square::from_index(28);
        cont.update(Piece::Pawn, prev_to, Piece::Knight, Square::from_index(45), 800);
        let entry = cont.entry(Piece::Pawn, prev_to);
        assert!(entry[Piece::Knight.index()][45] > 0);
        assert_eq!(entry[Piece::Knight.index()][44], 0);
    }

    #[test]
    fn test_low_ply_window() {
        let mut low = LowPlyHistory::new();
        let m = mv(12, 28);
        low.update(2, m, 700);
        assert!(low.get(2, m) > 0);
        low.update(10, m, 700);
        assert_eq!(low.get(10, m), 0);
    }
}
