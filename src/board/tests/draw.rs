//! Draw detection: repetition, 50-move rule, insufficient material.

use crate::board::Board;

#[test]
fn test_threefold_repetition() {
    let mut board = Board::new();
    assert!(!board.is_draw());

    // Shuffle knights back and forth; the start position recurs twice.
    for _ in 0..2 {
        board.make_move_uci("g1f3").unwrap();
        board.make_move_uci("g8f6").unwrap();
        board.make_move_uci("f3g1").unwrap();
        board.make_move_uci("f6g8").unwrap();
    }
    assert!(board.is_draw());
}

#[test]
fn test_twofold_is_not_a_game_draw() {
    let mut board = Board::new();
    board.make_move_uci("g1f3").unwrap();
    board.make_move_uci("g8f6").unwrap();
    board.make_move_uci("f3g1").unwrap();
    board.make_move_uci("f6g8").unwrap();
    // Second occurrence of the start position: repeated, but not a draw.
    assert!(board.has_repeated());
    assert!(!board.is_draw());
}

#[test]
fn test_unmake_unwinds_repetition_counts() {
    let mut board = Board::new();
    let mut history = Vec::new();
    for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
        let mv = board.parse_move(uci).unwrap();
        history.push((mv, board.make_move(mv)));
    }
    assert!(board.has_repeated());
    for (mv, info) in history.into_iter().rev() {
        board.unmake_move(mv, info);
    }
    assert!(!board.has_repeated());
}

#[test]
fn test_fifty_move_rule() {
    let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80");
    assert!(board.is_draw());
    let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80");
    assert!(!board.is_draw());
}

#[test]
fn test_insufficient_material() {
    // Bare kings.
    assert!(Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").is_insufficient_material());
    // A lone minor piece.
    assert!(Board::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").is_insufficient_material());
    assert!(Board::from_fen("4k3/8/8/8/8/8/8/2N1K3 w - - 0 1").is_insufficient_material());
    // Same-colored bishops cannot force mate (b8 and c1 are both dark).
    assert!(Board::from_fen("1b2k3/8/8/8/8/8/8/2B1K3 w - - 0 1").is_insufficient_material());
    // Opposite-colored bishops can.
    assert!(!Board::from_fen("2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1").is_insufficient_material());
    // Any pawn, rook, or queen is enough.
    assert!(!Board::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").is_insufficient_material());
    assert!(!Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").is_insufficient_material());
    // Two knights are not auto-drawn (a helpmate exists).
    assert!(!Board::from_fen("4k3/8/8/8/8/8/8/1NN1K3 w - - 0 1").is_insufficient_material());
}

#[test]
fn test_checkmate_and_stalemate() {
    let mated = Board::from_fen("4k3/4Q3/4K3/8/8/8/8/8 b - - 0 1");
    assert!(mated.is_checkmate());
    assert!(!mated.is_stalemate());

    let stalemated = Board::from_fen("7k/5Q2/5K2/8/8/8/8/8 b - - 0 1");
    assert!(stalemated.is_stalemate());
    assert!(!stalemated.is_checkmate());
}
