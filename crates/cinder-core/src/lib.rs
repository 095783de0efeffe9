//! Core chess types: bitboards and attack tables, Zobrist keys, board
//! representation, legal move generation and game history.
//!
//! Call [`init`] once before touching attacks, boards or move generation.

pub mod attacks;
mod bitboard;
mod board;
mod castle_rights;
mod chess_move;
mod color;
mod error;
mod fen;
mod game;
pub mod movegen;
mod perft;
mod piece_kind;
mod prng;
mod square;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use board::{Board, PrettyBoard};
pub use castle_rights::{CastleRights, CastleSide};
pub use chess_move::{Move, MoveKind};
pub use color::Color;
pub use error::{BoardError, FenError};
pub use fen::STARTING_FEN;
pub use game::{Game, GameSnapshot};
pub use movegen::MoveList;
pub use perft::{divide, perft};
pub use piece_kind::PieceKind;
pub use square::Square;

/// Build every precomputed table. Idempotent; safe to call from several threads.
pub fn init() {
    attacks::init();
}
