//! UCI protocol-layer tests (parsing and move formatting).

use rampart::board::Board;
use rampart::uci::{format_move, parse_command, parse_go_limits, parse_setoption, UciCommand};

#[test]
fn test_command_dispatch() {
    assert!(matches!(parse_command("uci"), Some(UciCommand::Uci)));
    assert!(matches!(
        parse_command("position startpos moves e2e4"),
        Some(UciCommand::Position(_))
    ));
    assert!(matches!(
        parse_command("go wtime 1000 btime 1000"),
        Some(UciCommand::Go(_))
    ));
    assert!(matches!(
        parse_command("setoption name Hash value 64"),
        Some(UciCommand::SetOption(_))
    ));
    assert!(matches!(parse_command("perft 3"), Some(UciCommand::Perft(3))));
    // Unknown input parses as Unknown and is ignored downstream.
    assert!(matches!(
        parse_command("joke knock knock"),
        Some(UciCommand::Unknown(_))
    ));
}

#[test]
fn test_go_limit_parsing() {
    let parts: Vec<&str> = "go movetime 250 nodes 5000".split_whitespace().collect();
    let limits = parse_go_limits(&parts);
    assert_eq!(limits.movetime, Some(250));
    assert_eq!(limits.nodes, Some(5000));
    assert!(!limits.infinite);
}

#[test]
fn test_setoption_with_spaces_in_name() {
    let parts: Vec<&str> = "setoption name Move Overhead value 80"
        .split_whitespace()
        .collect();
    let (name, value) = parse_setoption(&parts).unwrap();
    assert_eq!(name, "Move Overhead");
    assert_eq!(value.as_deref(), Some("80"));
}

#[test]
fn test_castling_move_formatting() {
    let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let castle = board.parse_move("e1g1").unwrap();
    // Standard output: king destination. Chess960 output: king takes rook.
    assert_eq!(format_move(castle, false), "e1g1");
    assert_eq!(format_move(castle, true), "e1h1");
}

#[test]
fn test_promotion_move_formatting() {
    let board = Board::from_fen("8/P3k3/8/8/8/8/4K3/8 w - - 0 1");
    let promo = board.parse_move("a7a8n").unwrap();
    assert_eq!(format_move(promo, false), "a7a8n");
}
