//! Universal Chess Interface front end.
//!
//! One thread reads stdin and dispatches; `go` hands the position to a
//! background search thread which prints `info` lines and the final
//! `bestmove` itself, so `stop` and `quit` stay responsive.

mod command;
mod options;

pub use command::{parse_command, parse_go_limits, parse_setoption, UciCommand};
pub use options::{OptionAction, UciOptions};

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crate::board::{Board, Move};
use crate::search::{start_search, InfoCallback, SearchOptions, SearchReport, SearchState};

/// Render a move for UCI output. Standard castling prints the king's
/// destination; Chess960 prints king-takes-rook.
#[must_use]
pub fn format_move(mv: Move, chess960: bool) -> String {
    if chess960 && mv.is_castling() {
        format!("{}{}", mv.from(), mv.to())
    } else {
        mv.to_string()
    }
}

fn print_report(report: &SearchReport) {
    let score = match report.mate_in {
        Some(mate) => format!("mate {mate}"),
        None => format!("cp {}", report.score),
    };
    println!(
        "info depth {} seldepth {} multipv {} score {} nodes {} nps {} hashfull {} time {} pv {}",
        report.depth,
        report.seldepth,
        report.multipv,
        score,
        report.nodes,
        report.nps,
        report.hashfull,
        report.time_ms,
        report.pv,
    );
}

struct Engine {
    board: Board,
    state: Option<SearchState>,
    search: Option<JoinHandle<SearchState>>,
    stop: Arc<AtomicBool>,
    options: UciOptions,
}

impl Engine {
    fn new() -> Self {
        let options = UciOptions::default();
        Engine {
            board: Board::new(),
            state: Some(SearchState::new(options.hash_mb)),
            search: None,
            stop: Arc::new(AtomicBool::new(false)),
            options,
        }
    }

    /// Wait for a running search to finish and take its state back.
    fn ensure_idle(&mut self) {
        if let Some(handle) = self.search.take() {
            self.stop.store(true, Ordering::Relaxed);
            match handle.join() {
                Ok(state) => self.state = Some(state),
                Err(_) => {
                    eprintln!("info string search thread panicked, state reset");
                    self.state = Some(SearchState::new(self.options.hash_mb));
                }
            }
        }
    }

    fn state_mut(&mut self) -> &mut SearchState {
        self.ensure_idle();
        self.state.as_mut().expect("engine state present while idle")
    }

    /// `position [startpos|fen ...] [moves ...]`
    ///
    /// A bad FEN refuses the whole command; an illegal move stops the
    /// move list there, keeping the prefix.
    fn handle_position(&mut self, parts: &[String]) {
        let mut i = 1;
        let mut board = if parts.get(i).map(String::as_str) == Some("startpos") {
            i += 1;
            Board::new()
        } else if parts.get(i).map(String::as_str) == Some("fen") {
            let fen_end = parts[i + 1..]
                .iter()
                .position(|p| p == "moves")
                .map_or(parts.len(), |offset| i + 1 + offset);
            let fen = parts[i + 1..fen_end].join(" ");
            i = fen_end;
            match Board::try_from_fen(&fen) {
                Ok(board) => board,
                Err(err) => {
                    eprintln!("info string rejected position: {err}");
                    return;
                }
            }
        } else {
            return;
        };
        board.set_chess960(self.options.chess960);

        if parts.get(i).map(String::as_str) == Some("moves") {
            for uci in &parts[i + 1..] {
                match board.make_move_uci(uci) {
                    Ok(_) => {}
                    Err(err) => {
                        eprintln!("info string stopped applying moves: {err}");
                        break;
                    }
                }
            }
        }
        self.board = board;
    }

    fn handle_go(&mut self, parts: &[String]) {
        self.ensure_idle();
        self.stop.store(false, Ordering::Relaxed);

        let str_parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        let limits = parse_go_limits(&str_parts);

        let mut board = self.board.clone();
        board.set_chess960(self.options.chess960);
        let mut state = self.state.take().expect("engine state present while idle");
        let stop = Arc::clone(&self.stop);
        let chess960 = self.options.chess960;
        let search_options = SearchOptions {
            threads: self.options.threads,
            move_overhead_ms: self.options.move_overhead_ms,
            multi_pv: self.options.multi_pv,
            info: Some(Arc::new(print_report) as InfoCallback),
            stop,
        };

        let handle = std::thread::Builder::new()
            .name("search-main".to_string())
            .spawn(move || {
                let result = start_search(&board, &mut state, &limits, &search_options);
                match result.best_move {
                    Some(best) => {
                        let best_str = format_move(best, chess960);
                        match result.ponder_move {
                            Some(ponder) => println!(
                                "bestmove {best_str} ponder {}",
                                format_move(ponder, chess960)
                            ),
                            None => println!("bestmove {best_str}"),
                        }
                    }
                    None => println!("bestmove 0000"),
                }
                state
            })
            .expect("failed to spawn search thread");
        self.search = Some(handle);
    }

    fn handle_perft(&mut self, depth: usize) {
        self.ensure_idle();
        let mut board = self.board.clone();
        let start = Instant::now();
        let nodes = board.perft(depth);
        let elapsed = start.elapsed();
        let nps = if elapsed.as_micros() > 0 {
            (nodes as u128 * 1_000_000 / elapsed.as_micros()) as u64
        } else {
            0
        };
        println!(
            "info string perft({depth}) = {nodes} in {}ms ({nps} nps)",
            elapsed.as_millis()
        );
    }

    /// Handle a command; `false` means quit.
    fn handle(&mut self, cmd: UciCommand) -> bool {
        match cmd {
            UciCommand::Uci => {
                let params = self.state_mut().params.clone();
                self.options.print(&params);
            }
            UciCommand::IsReady => {
                println!("readyok");
            }
            UciCommand::UciNewGame => {
                self.state_mut().new_game();
                self.board = Board::new();
            }
            UciCommand::Position(parts) => {
                self.ensure_idle();
                self.handle_position(&parts);
            }
            UciCommand::Go(parts) => {
                self.handle_go(&parts);
            }
            UciCommand::SetOption(parts) => {
                let str_parts: Vec<&str> = parts.iter().map(String::as_str).collect();
                if let Some((name, value)) = parse_setoption(&str_parts) {
                    self.ensure_idle();
                    let mut options = std::mem::take(&mut self.options);
                    let action =
                        options.apply(&name, value.as_deref(), self.state_mut());
                    self.options = options;
                    match action {
                        Some(OptionAction::ResizeHash(mb)) => self.state_mut().resize_tt(mb),
                        Some(OptionAction::ClearHash) => self.state_mut().tt.clear(),
                        None => {}
                    }
                }
            }
            UciCommand::Perft(depth) => self.handle_perft(depth),
            UciCommand::Display => {
                self.ensure_idle();
                println!("info string fen {}", self.board.to_fen());
            }
            UciCommand::Stop => {
                self.ensure_idle();
            }
            UciCommand::PonderHit => {
                // Pondering searches share the normal time controls here;
                // the hit simply lets the current search run on.
            }
            UciCommand::Debug(_) | UciCommand::Unknown(_) => {
                // Silently ignored per protocol.
            }
            UciCommand::Quit => {
                self.ensure_idle();
                return false;
            }
        }
        true
    }
}

/// Read UCI commands from stdin until `quit`.
pub fn run() {
    let mut engine = Engine::new();
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if let Some(cmd) = parse_command(&line) {
            if !engine.handle(cmd) {
                break;
            }
        }
    }
    engine.ensure_idle();
}
