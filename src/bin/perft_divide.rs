//! Perft divide: per-root-move node counts for generator debugging.
//!
//! Usage: perft_divide <depth> [fen...]

use rampart::board::Board;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let depth: usize = args
        .first()
        .and_then(|d| d.parse().ok())
        .unwrap_or(4);
    let board = if args.len() > 1 {
        match Board::try_from_fen(&args[1..].join(" ")) {
            Ok(board) => board,
            Err(err) => {
                eprintln!("bad FEN: {err}");
                std::process::exit(1);
            }
        }
    } else {
        Board::new()
    };

    let mut total = 0u64;
    for &mv in &board.generate_legal() {
        let mut child = board.clone();
        child.make_move(mv);
        let nodes = if depth > 1 { child.perft(depth - 1) } else { 1 };
        total += nodes;
        println!("{mv}: {nodes}");
    }
    println!("\ntotal: {total}");
}
