//! FEN parsing and emission, plus UCI move parsing.

use std::str::FromStr;

use super::error::{FenError, MoveParseError};
use super::types::{
    file_to_index, rank_to_index, Bitboard, CastlingRights, Color, Move, Piece, Square,
};
use super::Board;

impl Board {
    /// Parse a board position from FEN notation.
    ///
    /// Castling accepts standard `KQkq` letters as well as X-FEN file
    /// letters for Chess960 rook placements.
    pub fn try_from_fen(fen: &str) -> Result<Self, FenError> {
        let mut board = Board::empty();
        let parts: Vec<&str> = fen.split_whitespace().collect();

        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidRankCount { found: ranks.len() });
        }
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    let color = if c.is_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if file >= 8 {
                        return Err(FenError::TooManyFiles { rank });
                    }
                    board.set_piece(Square::new(rank, file), color, piece);
                    file += 1;
                }
            }
            if file > 8 {
                return Err(FenError::TooManyFiles { rank });
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board.pieces(color, Piece::King).popcount();
            if kings != 1 {
                return Err(FenError::BadKingCount {
                    color: color.to_string(),
                    found: kings,
                });
            }
        }

        board.stm = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        };

        for c in parts[2].chars() {
            if c == '-' {
                continue;
            }
            board.add_castling_right(c)?;
        }
        board.rebuild_castling_mask();

        board.ep_square = if parts[3] == "-" {
            None
        } else {
            let sq = Square::from_str(parts[3]).map_err(|_| FenError::InvalidEnPassant {
                found: parts[3].to_string(),
            })?;
            let expected_rank = if board.stm == Color::White { 5 } else { 2 };
            if sq.rank() != expected_rank {
                return Err(FenError::InvalidEnPassant {
                    found: parts[3].to_string(),
                });
            }
            // Keep the square only when a capture is actually possible, so
            // that otherwise-identical positions hash identically.
            board.validate_ep_square(sq)
        };

        if parts.len() >= 5 {
            board.halfmove_clock = parts[4].parse().unwrap_or(0);
        }
        if parts.len() >= 6 {
            board.fullmove_number = parts[5].parse().unwrap_or(1);
        }

        board.update_check_info();

        // The king of the side that just moved may not be capturable.
        let them = board.stm.opponent();
        let their_king = board.king_square(them);
        if board.attacked_by(board.stm, their_king, board.occupied()) {
            return Err(FenError::SideNotToMoveInCheck);
        }

        board.key = board.calculate_key();
        board.repetitions.set(board.key, 1);
        Ok(board)
    }

    /// Parse a FEN, panicking on failure. Use `try_from_fen` in fallible paths.
    #[must_use]
    pub fn from_fen(fen: &str) -> Self {
        Self::try_from_fen(fen).expect("invalid FEN string")
    }

    fn add_castling_right(&mut self, c: char) -> Result<(), FenError> {
        let color = if c.is_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let back_rank = if color == Color::White { 0 } else { 7 };
        let king_file = self.king_square(color).file();
        let rooks = self.pieces(color, Piece::Rook) & Bitboard::rank_mask(back_rank);

        let rook = match c.to_ascii_lowercase() {
            'k' => rooks
                .iter()
                .filter(|sq| sq.file() > king_file)
                .max_by_key(|sq| sq.file()),
            'q' => rooks
                .iter()
                .filter(|sq| sq.file() < king_file)
                .min_by_key(|sq| sq.file()),
            f @ 'a'..='h' => {
                let sq = Square::new(back_rank, file_to_index(f));
                rooks.contains(sq).then_some(sq)
            }
            _ => return Err(FenError::InvalidCastling { char: c }),
        };
        let Some(rook) = rook else {
            return Err(FenError::InvalidCastling { char: c });
        };

        let kingside = rook.file() > king_file;
        let right = CastlingRights::right_index(color, kingside);
        self.castling.set_index(right);
        self.castling_rooks[right] = Some(rook);
        if self.king_square(color).rank() != back_rank {
            return Err(FenError::InvalidCastling { char: c });
        }
        Ok(())
    }

    /// Rebuild the per-square castling-rights mask from the current rights.
    pub(crate) fn rebuild_castling_mask(&mut self) {
        self.castling_mask = [0; 64];
        for right in 0..4 {
            if !self.castling.has_index(right) {
                continue;
            }
            let color = if right < 2 { Color::White } else { Color::Black };
            let king = self.king_square(color);
            let rook = self.castling_rooks[right].expect("right implies rook square");
            self.castling_mask[king.index()] |= 1 << right;
            self.castling_mask[rook.index()] |= 1 << right;
        }
    }

    /// Convert the board position to FEN notation.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut rows: Vec<String> = Vec::new();
        for rank in (0..8).rev() {
            let mut row = String::new();
            let mut empty = 0;
            for file in 0..8 {
                if let Some((color, piece)) = self.piece_at(Square::new(rank, file)) {
                    if empty > 0 {
                        row.push_str(&empty.to_string());
                        empty = 0;
                    }
                    row.push(piece.to_fen_char(color));
                } else {
                    empty += 1;
                }
            }
            if empty > 0 {
                row.push_str(&empty.to_string());
            }
            rows.push(row);
        }

        let mut castling = String::new();
        for (right, standard, file_letter) in [
            (super::types::WHITE_KINGSIDE, 'K', true),
            (super::types::WHITE_QUEENSIDE, 'Q', false),
            (super::types::BLACK_KINGSIDE, 'k', true),
            (super::types::BLACK_QUEENSIDE, 'q', false),
        ] {
            if !self.castling.has_index(right) {
                continue;
            }
            let rook = self.castling_rooks[right].expect("right implies rook square");
            let classical_file = if file_letter { 7 } else { 0 };
            if rook.file() == classical_file {
                castling.push(standard);
            } else {
                // X-FEN file letter for displaced Chess960 rooks.
                let letter = (b'a' + rook.file() as u8) as char;
                castling.push(if right < 2 {
                    letter.to_ascii_uppercase()
                } else {
                    letter
                });
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = self
            .ep_square
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());

        format!(
            "{} {} {} {} {} {}",
            rows.join("/"),
            if self.stm == Color::White { "w" } else { "b" },
            castling,
            ep,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Parse a move in UCI long algebraic notation and return the matching
    /// legal move. Castling is accepted both as the standard king
    /// destination ("e1g1") and as king-takes-rook ("e1h1", Chess960).
    pub fn parse_move(&self, uci: &str) -> Result<Move, MoveParseError> {
        if uci.len() < 4 || uci.len() > 5 {
            return Err(MoveParseError::InvalidLength { len: uci.len() });
        }

        let chars: Vec<char> = uci.chars().collect();
        if !('a'..='h').contains(&chars[0])
            || !('1'..='8').contains(&chars[1])
            || !('a'..='h').contains(&chars[2])
            || !('1'..='8').contains(&chars[3])
        {
            return Err(MoveParseError::InvalidSquare {
                notation: uci.to_string(),
            });
        }

        let from = Square::new(rank_to_index(chars[1]), file_to_index(chars[0]));
        let to = Square::new(rank_to_index(chars[3]), file_to_index(chars[2]));

        let promotion = if uci.len() == 5 {
            let piece = Piece::from_char(chars[4]).ok_or(MoveParseError::InvalidPromotion {
                char: chars[4],
            })?;
            if matches!(piece, Piece::Pawn | Piece::King) {
                return Err(MoveParseError::InvalidPromotion { char: chars[4] });
            }
            Some(piece)
        } else {
            None
        };

        for mv in &self.generate_legal() {
            if mv.from() != from || mv.promotion_piece() != promotion {
                continue;
            }
            let matches = if mv.is_castling() {
                // Internal encoding is king-from/rook-from; accept either
                // spelling on input.
                mv.to() == to || mv.to_string() == uci
            } else {
                mv.to() == to
            };
            if matches {
                return Ok(*mv);
            }
        }

        Err(MoveParseError::IllegalMove {
            notation: uci.to_string(),
        })
    }

    /// Parse a UCI move and make it on the board in one call.
    pub fn make_move_uci(&mut self, uci: &str) -> Result<Move, MoveParseError> {
        let mv = self.parse_move(uci)?;
        self.make_move(mv);
        Ok(mv)
    }
}

impl FromStr for Board {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::try_from_fen(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::state::START_FEN;

    #[test]
    fn test_startpos_roundtrip() {
        let board = Board::new();
        assert_eq!(board.to_fen(), START_FEN);
    }

    #[test]
    fn test_fen_roundtrip_kiwipete() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board = Board::from_fen(fen);
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn test_fen_errors() {
        assert!(matches!(
            Board::try_from_fen("8/8/8/8 w - -"),
            Err(FenError::BadKingCount { .. })
        ));
        assert!(matches!(
            Board::try_from_fen("bad fen"),
            Err(FenError::TooFewParts { .. })
        ));
        assert!(matches!(
            Board::try_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenError::InvalidSideToMove { .. })
        ));
        // White to move but the black king is attacked.
        assert!(matches!(
            Board::try_from_fen("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::SideNotToMoveInCheck)
        ));
    }

    #[test]
    fn test_ep_square_kept_only_when_capturable() {
        // Black pawn on d4 can take e3 en passant.
        let board = Board::from_fen(
            "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3",
        );
        assert_eq!(board.en_passant_square(), Some("e3".parse().unwrap()));

        // No black pawn is adjacent; the square is dropped.
        let board = Board::from_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        );
        assert_eq!(board.en_passant_square(), None);
    }

    #[test]
    fn test_parse_move() {
        let board = Board::new();
        let mv = board.parse_move("e2e4").unwrap();
        assert_eq!(mv.to_string(), "e2e4");
        assert!(board.parse_move("e2e5").is_err());
        assert!(board.parse_move("xx11").is_err());
        assert!(board.parse_move("e2").is_err());
    }

    #[test]
    fn test_parse_castling_both_spellings() {
        let board =
            Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let standard = board.parse_move("e1g1").unwrap();
        assert!(standard.is_castling());
        let xfen = board.parse_move("e1h1").unwrap();
        assert_eq!(standard, xfen);
    }

    #[test]
    fn test_make_move_uci() {
        let mut board = Board::new();
        board.make_move_uci("e2e4").unwrap();
        board.make_move_uci("c7c5").unwrap();
        assert!(board.to_fen().starts_with("rnbqkbnr/pp1ppppp/8/2p5/4P3/8"));
    }
}
