//! Lazy SMP parallel search.
//!
//! Workers search the same position independently on private boards and
//! histories; the shared transposition table is the only coordination.
//! Helper threads perturb their depth horizon so move ordering diverges,
//! which is where the parallel speedup comes from. The main worker's
//! result is authoritative; helpers only fill the table.

use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use crate::board::{Board, Move, MAX_PLY};
use crate::engine::TimeManager;
use crate::search_trace;
use crate::tt::TranspositionTable;

use super::{
    SearchLimits, SearchOptions, SearchResult, SearchState, Searcher, ThreadTables,
};

/// Worker stacks must fit MAX_PLY recursion frames comfortably.
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

struct WorkerResult {
    best_move: Move,
    score: i32,
    depth: i32,
    nodes: u64,
}

/// Run a search for the given limits and return the best move.
///
/// Blocks until the search finishes; `options.stop` may be raised from
/// another thread (UCI `stop`) to end it early.
#[must_use]
pub fn start_search(
    board: &Board,
    state: &mut SearchState,
    limits: &SearchLimits,
    options: &SearchOptions,
) -> SearchResult {
    let start = Instant::now();
    let root_moves: Vec<Move> = board.generate_legal().iter().copied().collect();

    if root_moves.is_empty() {
        return SearchResult {
            best_move: None,
            ponder_move: None,
            score: 0,
            depth: 0,
            nodes: 0,
        };
    }

    state.tt.new_search();
    state.tables.new_search();

    let time = TimeManager::new(limits, board.side_to_move(), options.move_overhead_ms);
    let hard_deadline = time.maximum_ms.map(|ms| start + Duration::from_millis(ms));
    let max_depth = limits
        .depth
        .unwrap_or(MAX_PLY as i32 - 1)
        .clamp(1, MAX_PLY as i32 - 1);

    let multi_pv = (options.multi_pv as usize).min(root_moves.len());
    if multi_pv > 1 {
        return multipv_search(
            board, state, limits, options, &root_moves, start, hard_deadline, &time, max_depth,
        );
    }

    let threads = options.threads.max(1);
    search_trace!("go: {} thread(s), max depth {}", threads, max_depth);

    let mut helper_results: Vec<WorkerResult> = Vec::new();

    let main_result = thread::scope(|scope| {
        let mut handles = Vec::new();
        for worker_id in 1..threads {
            let tt: &TranspositionTable = &state.tt;
            let params = &state.params;
            let stop: &std::sync::atomic::AtomicBool = &options.stop;
            // Only the main worker enforces the node budget, so the total
            // across workers cannot overshoot it N times.
            let mut helper_limits = limits.clone();
            helper_limits.nodes = None;
            let helper_root_moves = root_moves.clone();
            let mut helper_board = board.clone();
            // Helpers alternate a one-ply deeper horizon; their diverging
            // move ordering populates the shared table for the main line.
            let helper_depth = (max_depth + (worker_id % 2) as i32).min(MAX_PLY as i32 - 1);

            let builder = thread::Builder::new()
                .name(format!("search-{worker_id}"))
                .stack_size(WORKER_STACK_SIZE);
            let handle = builder
                .spawn_scoped(scope, move || {
                    let mut tables = ThreadTables::new();
                    let mut searcher = Searcher::new(
                        &mut helper_board,
                        tt,
                        &mut tables,
                        params,
                        stop,
                        helper_limits,
                        start,
                        hard_deadline,
                        None,
                        None,
                        helper_root_moves,
                        false,
                    );
                    searcher.iterate(helper_depth);
                    WorkerResult {
                        best_move: searcher.root_best,
                        score: searcher.root_score,
                        depth: searcher.completed_depth,
                        nodes: searcher.nodes,
                    }
                })
                .expect("failed to spawn search worker");
            handles.push(handle);
        }

        let mut main_board = board.clone();
        let mut searcher = Searcher::new(
            &mut main_board,
            &state.tt,
            &mut state.tables,
            &state.params,
            &options.stop,
            limits.clone(),
            start,
            hard_deadline,
            time.optimum_ms,
            options.info.clone(),
            root_moves.clone(),
            true,
        );
        searcher.iterate(max_depth);
        let main = WorkerResult {
            best_move: searcher.root_best,
            score: searcher.root_score,
            depth: searcher.completed_depth,
            nodes: searcher.nodes,
        };

        // The main worker is done: release the helpers and gather them.
        options.stop.store(true, Ordering::Relaxed);
        for handle in handles {
            if let Ok(result) = handle.join() {
                helper_results.push(result);
            }
        }
        main
    });

    let total_nodes =
        main_result.nodes + helper_results.iter().map(|r| r.nodes).sum::<u64>();

    // Prefer the main worker; fall back to the deepest, highest-scoring
    // helper only if the main worker produced nothing.
    let (best_move, score, depth) = if main_result.best_move.is_some() {
        (main_result.best_move, main_result.score, main_result.depth)
    } else {
        helper_results
            .iter()
            .filter(|r| r.best_move.is_some())
            .max_by_key(|r| (r.depth, r.score))
            .map_or((root_moves[0], 0, 0), |r| (r.best_move, r.score, r.depth))
    };

    let ponder_move = extract_ponder(board, &state.tt, best_move);

    SearchResult {
        best_move: Some(best_move),
        ponder_move,
        score,
        depth,
        nodes: total_nodes,
    }
}

/// MultiPV runs one sequential search per line, excluding the previous
/// best moves at the root. Parallel workers are not used here.
#[allow(clippy::too_many_arguments)]
fn multipv_search(
    board: &Board,
    state: &mut SearchState,
    limits: &SearchLimits,
    options: &SearchOptions,
    root_moves: &[Move],
    start: Instant,
    hard_deadline: Option<Instant>,
    time: &TimeManager,
    max_depth: i32,
) -> SearchResult {
    let lines = (options.multi_pv as usize).min(root_moves.len());
    let mut excluded: Vec<Move> = Vec::new();
    let mut first: Option<WorkerResult> = None;
    let mut total_nodes = 0;

    for pv_index in 1..=lines {
        if options.stop.load(Ordering::Relaxed) && pv_index > 1 {
            break;
        }
        let allowed: Vec<Move> = root_moves
            .iter()
            .copied()
            .filter(|mv| !excluded.contains(mv))
            .collect();

        let mut line_board = board.clone();
        let mut searcher = Searcher::new(
            &mut line_board,
            &state.tt,
            &mut state.tables,
            &state.params,
            &options.stop,
            limits.clone(),
            start,
            hard_deadline,
            if pv_index == 1 { time.optimum_ms } else { None },
            options.info.clone(),
            allowed,
            pv_index == 1,
        );
        searcher.multipv_index = pv_index as u32;
        searcher.iterate(max_depth);
        total_nodes += searcher.nodes;

        excluded.push(searcher.root_best);
        if pv_index == 1 {
            first = Some(WorkerResult {
                best_move: searcher.root_best,
                score: searcher.root_score,
                depth: searcher.completed_depth,
                nodes: searcher.nodes,
            });
        }
    }

    let first = first.expect("at least one MultiPV line runs");
    let ponder_move = extract_ponder(board, &state.tt, first.best_move);
    SearchResult {
        best_move: Some(first.best_move),
        ponder_move,
        score: first.score,
        depth: first.depth,
        nodes: total_nodes,
    }
}

/// Expected opponent reply: make the best move and ask the hash table.
fn extract_ponder(
    board: &Board,
    tt: &TranspositionTable,
    best_move: Move,
) -> Option<Move> {
    if !best_move.is_some() {
        return None;
    }
    let mut scratch = board.clone();
    scratch.make_move(best_move);
    let reply = tt.probe(scratch.key(), 0).map(|hit| hit.mv)?;
    (reply.is_some() && scratch.is_pseudo_legal(reply) && scratch.is_legal(reply))
        .then_some(reply)
}
