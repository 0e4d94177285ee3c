//! Legality, pseudo-legality, and check-detection tests.

use crate::board::{Board, GenKind, Move, MoveList, Square};

#[test]
fn test_generator_output_is_pseudo_legal() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        "4k3/8/8/8/8/8/4r3/4K3 w - - 0 1",
    ];
    for fen in fens {
        let board = Board::from_fen(fen);
        let mut moves = MoveList::new();
        if board.in_check() {
            board.generate(GenKind::Evasions, &mut moves);
        } else {
            board.generate(GenKind::Captures, &mut moves);
            board.generate(GenKind::Quiets, &mut moves);
        }
        for &mv in &moves {
            assert!(
                board.is_pseudo_legal(mv),
                "generated move {mv} rejected by is_pseudo_legal in {fen}"
            );
        }
    }
}

#[test]
fn test_random_moves_mostly_rejected() {
    // A 16-bit move validator must reject garbage: check every encoding
    // of kind Normal against the start position.
    let board = Board::new();
    let legal: Vec<Move> = board.generate_legal().iter().copied().collect();
    for from in 0..64 {
        for to in 0..64 {
            let mv = Move::new(Square::from_index(from), Square::from_index(to));
            if board.is_pseudo_legal(mv) && board.is_legal(mv) {
                assert!(
                    legal.contains(&mv),
                    "{mv} accepted but not generated"
                );
            }
        }
    }
}

#[test]
fn test_pinned_piece_may_slide_along_the_pin() {
    // The d2 rook is pinned by the d8 rook; it may move on the d-file
    // but never off it.
    let board = Board::from_fen("3rk3/8/8/8/8/8/3R4/3K4 w - - 0 1");
    let along = board.parse_move("d2d5");
    assert!(along.is_ok());
    let off = Move::new("d2".parse().unwrap(), "e2".parse().unwrap());
    assert!(board.is_pseudo_legal(off));
    assert!(!board.is_legal(off));
}

#[test]
fn test_king_cannot_step_into_attack() {
    let board = Board::from_fen("4k3/8/8/8/8/8/r7/4K3 w - - 0 1");
    let into_attack = Move::new("e1".parse().unwrap(), "e2".parse().unwrap());
    assert!(board.is_pseudo_legal(into_attack));
    assert!(!board.is_legal(into_attack));
    // Stepping backwards along the rank the rook controls is also out.
    let legal_moves = board.generate_legal();
    for mv in &legal_moves {
        assert_ne!(mv.to().rank(), 1, "king walked onto the attacked rank");
    }
}

#[test]
fn test_en_passant_discovered_check_is_illegal() {
    // Capturing en passant would clear the rank and expose the black
    // king to the h-file queen.
    let board = Board::from_fen("8/8/8/8/k2Pp2Q/8/8/3K4 b - d3 0 1");
    let moves = board.generate_legal();
    let ep = moves.iter().find(|mv| mv.is_en_passant());
    assert!(ep.is_none(), "en passant should be pinned here");
}

#[test]
fn test_gives_check_direct() {
    let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
    let check = board.parse_move("a1a8").unwrap();
    assert!(board.gives_check(check));
    let quiet = board.parse_move("a1b1").unwrap();
    assert!(!board.gives_check(quiet));
}

#[test]
fn test_gives_check_discovered() {
    // The d4 bishop shields the d-file; any bishop move discovers the
    // rook's check.
    let board = Board::from_fen("3k4/8/8/8/3B4/8/8/3RK3 w - - 0 1");
    let discover = board.parse_move("d4f6").unwrap();
    assert!(board.gives_check(discover));
    // Every bishop move leaves the d-file, so all of them discover.
    let sideways = board.parse_move("d4c5").unwrap();
    assert!(board.gives_check(sideways));
}

#[test]
fn test_gives_check_promotion() {
    let board = Board::from_fen("k7/4P3/8/8/8/8/8/4K3 w - - 0 1");
    let queen_promo = board.parse_move("e7e8q").unwrap();
    assert!(board.gives_check(queen_promo));
    let knight_promo = board.parse_move("e7e8n").unwrap();
    assert!(!board.gives_check(knight_promo));
}

#[test]
fn test_gives_check_matches_make_move() {
    let fens = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ];
    for fen in fens {
        let mut board = Board::from_fen(fen);
        for mv in &board.clone().generate_legal() {
            let predicted = board.gives_check(*mv);
            let info = board.make_move(*mv);
            let actual = board.in_check();
            board.unmake_move(*mv, info);
            assert_eq!(
                predicted, actual,
                "gives_check disagreed with make_move for {mv} in {fen}"
            );
        }
    }
}

#[test]
fn test_quiet_checks_all_give_check() {
    let board = Board::from_fen("4k3/8/8/8/8/8/8/R3KB2 w - - 0 1");
    let mut moves = MoveList::new();
    board.generate(GenKind::QuietChecks, &mut moves);
    assert!(!moves.is_empty());
    for &mv in &moves {
        assert!(!board.is_capture(mv));
        if board.is_legal(mv) {
            assert!(board.gives_check(mv), "{mv} does not give check");
        }
    }
}
