//! Chess board representation and game logic.
//!
//! Bitboards back the move generator and evaluation; a mailbox mirrors
//! them for square lookups. Full rules are supported, including castling
//! (standard and Chess960), en passant, promotions, and draw detection.
//!
//! # Example
//! ```
//! use rampart::board::Board;
//!
//! let board = Board::new();
//! let moves = board.generate_legal();
//! assert_eq!(moves.len(), 20);
//! ```

pub mod attack_tables;
mod error;
mod eval;
mod fen;
mod legality;
mod make_unmake;
mod movegen;
mod see;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use error::{FenError, MoveParseError, SquareError};
pub use movegen::GenKind;
pub use state::{Board, NullMoveInfo, UnmakeInfo};
pub use types::{
    Bitboard, CastlingRights, Color, Move, MoveKind, MoveList, Piece, ScoredMove, ScoredMoveList,
    Square, MAX_PLY,
};
