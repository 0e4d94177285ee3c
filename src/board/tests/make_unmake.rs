//! Make/unmake round-trip tests.

use crate::board::{Board, MoveKind};

fn assert_round_trip(fen: &str) {
    let mut board = Board::from_fen(fen);
    let before_fen = board.to_fen();
    let before_key = board.key();

    for mv in &board.clone().generate_legal() {
        let info = board.make_move(*mv);
        assert_eq!(
            board.key(),
            board.calculate_key(),
            "incremental key diverged after {mv} in {fen}"
        );
        board.unmake_move(*mv, info);
        assert_eq!(board.to_fen(), before_fen, "state not restored after {mv}");
        assert_eq!(board.key(), before_key, "key not restored after {mv}");
    }
}

#[test]
fn test_round_trip_startpos() {
    assert_round_trip("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
}

#[test]
fn test_round_trip_kiwipete() {
    assert_round_trip("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
}

#[test]
fn test_round_trip_tactical() {
    assert_round_trip("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8");
}

#[test]
fn test_round_trip_en_passant() {
    assert_round_trip("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
}

#[test]
fn test_castling_round_trip_moves_both_pieces() {
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let castle = board.parse_move("e1g1").unwrap();
    assert_eq!(castle.kind(), MoveKind::Castling);

    let info = board.make_move(castle);
    assert!(board.to_fen().starts_with("r3k2r/8/8/8/8/8/8/R4RK1"));
    board.unmake_move(castle, info);
    assert_eq!(board.to_fen(), "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
}

#[test]
fn test_castling_clears_rights() {
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    board.make_move_uci("e1g1").unwrap();
    assert!(!board.castling_rights().has_any(crate::board::Color::White));
    assert!(board.castling_rights().has_any(crate::board::Color::Black));
}

#[test]
fn test_rook_capture_clears_opponent_right() {
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    board.make_move_uci("a1a8").unwrap();
    assert!(!board
        .castling_rights()
        .has(crate::board::Color::Black, false));
    assert!(board.castling_rights().has(crate::board::Color::Black, true));
}

#[test]
fn test_promotion_make_unmake() {
    let mut board = Board::from_fen("8/P3k3/8/8/8/8/4K3/8 w - - 0 1");
    let promo = board.parse_move("a7a8q").unwrap();
    let info = board.make_move(promo);
    assert!(board.to_fen().starts_with("Q7/4k3"));
    board.unmake_move(promo, info);
    assert_eq!(board.to_fen(), "8/P3k3/8/8/8/8/4K3/8 w - - 0 1");
}

#[test]
fn test_en_passant_capture_removes_pawn() {
    let mut board =
        Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
    let ep = board.parse_move("e5f6").unwrap();
    assert!(ep.is_en_passant());
    let info = board.make_move(ep);
    // The f5 pawn is gone, the e5 pawn now sits on f6.
    assert!(board.piece_at("f5".parse().unwrap()).is_none());
    assert!(board.piece_at("f6".parse().unwrap()).is_some());
    board.unmake_move(ep, info);
    assert!(board.piece_at("f5".parse().unwrap()).is_some());
}

#[test]
fn test_null_move_round_trip() {
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    let key = board.key();
    let fen = board.to_fen();

    let info = board.make_null_move();
    assert_ne!(board.key(), key);
    assert_eq!(board.side_to_move(), crate::board::Color::Black);
    assert_eq!(board.key(), board.calculate_key());
    board.unmake_null_move(info);
    assert_eq!(board.key(), key);
    assert_eq!(board.to_fen(), fen);
}

#[test]
fn test_halfmove_clock_resets() {
    let mut board = Board::new();
    board.make_move_uci("g1f3").unwrap();
    assert_eq!(board.halfmove_clock(), 1);
    board.make_move_uci("d7d5").unwrap();
    assert_eq!(board.halfmove_clock(), 0);
    board.make_move_uci("f3e5").unwrap();
    assert_eq!(board.halfmove_clock(), 1);
    board.make_move_uci("b8c6").unwrap();
    assert_eq!(board.halfmove_clock(), 2);
    board.make_move_uci("e5f7").unwrap(); // capture resets
    assert_eq!(board.halfmove_clock(), 0);
}

#[test]
fn test_fullmove_number_counts() {
    let mut board = Board::new();
    assert_eq!(board.fullmove_number(), 1);
    board.make_move_uci("e2e4").unwrap();
    assert_eq!(board.fullmove_number(), 1);
    board.make_move_uci("e7e5").unwrap();
    assert_eq!(board.fullmove_number(), 2);
}
