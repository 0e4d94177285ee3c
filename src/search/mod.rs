//! Search: iterative-deepening principal-variation alpha-beta.
//!
//! One searcher per thread drives the recursion; the Lazy SMP workers
//! share the transposition table and a stop flag, nothing else.

pub mod constants;
mod history;
mod movepick;
mod params;
mod quiescence;
mod searcher;
mod smp;

pub use history::ThreadTables;
pub use params::SearchParams;
pub use smp::start_search;

pub(crate) use searcher::Searcher;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::board::Move;
use crate::tt::{TranspositionTable, DEFAULT_TT_MB};

/// Persistent engine-side search state: the shared hash table, the main
/// thread's histories, and the tuning parameters.
pub struct SearchState {
    pub tt: Arc<TranspositionTable>,
    pub tables: ThreadTables,
    pub params: SearchParams,
}

impl SearchState {
    #[must_use]
    pub fn new(tt_mb: usize) -> Self {
        SearchState {
            tt: Arc::new(TranspositionTable::new(tt_mb)),
            tables: ThreadTables::new(),
            params: SearchParams::default(),
        }
    }

    /// Reallocate the hash table (UCI `Hash` option).
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = Arc::new(TranspositionTable::new(mb));
    }

    /// Forget everything learned from previous games.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.tables.clear();
    }
}

impl Default for SearchState {
    fn default() -> Self {
        SearchState::new(DEFAULT_TT_MB)
    }
}

/// Limits for one `go` command.
#[derive(Clone, Debug, Default)]
pub struct SearchLimits {
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub movetime: Option<u64>,
    /// Remaining clock per color, milliseconds.
    pub time: [Option<u64>; 2],
    /// Increment per color, milliseconds.
    pub inc: [u64; 2],
    pub movestogo: Option<u64>,
    pub mate: Option<u32>,
    pub infinite: bool,
    pub ponder: bool,
}

impl SearchLimits {
    #[must_use]
    pub fn depth(depth: i32) -> Self {
        SearchLimits {
            depth: Some(depth),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn movetime(ms: u64) -> Self {
        SearchLimits {
            movetime: Some(ms),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn nodes(nodes: u64) -> Self {
        SearchLimits {
            nodes: Some(nodes),
            ..Default::default()
        }
    }

    /// True when the clock governs the search.
    #[must_use]
    pub fn use_time_management(&self) -> bool {
        self.time.iter().any(Option::is_some)
    }
}

/// Outcome of a search.
#[derive(Debug, Clone, Copy)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub ponder_move: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub nodes: u64,
}

/// One iteration's worth of `info` data.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// PV line index, 1-based (MultiPV).
    pub multipv: u32,
    pub depth: i32,
    pub seldepth: u32,
    pub score: i32,
    /// Moves until mate (negative: being mated), when the score is a mate
    /// score.
    pub mate_in: Option<i32>,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u64,
    pub hashfull: u32,
    pub pv: String,
}

/// Callback invoked after every completed iteration on the main worker.
pub type InfoCallback = Arc<dyn Fn(&SearchReport) + Send + Sync>;

/// Extra knobs that accompany the limits but come from UCI options.
#[derive(Clone)]
pub struct SearchOptions {
    pub threads: usize,
    pub move_overhead_ms: u64,
    pub multi_pv: u32,
    pub info: Option<InfoCallback>,
    pub stop: Arc<AtomicBool>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            threads: 1,
            move_overhead_ms: 10,
            multi_pv: 1,
            info: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}
