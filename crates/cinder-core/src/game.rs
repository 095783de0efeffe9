//! A game: a root position plus the stack of positions reached from it.

use crate::board::Board;
use crate::chess_move::Move;
use crate::movegen::{self, MoveList};

/// Opaque mark of a game's length, taken by [`Game::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSnapshot(usize);

/// Position history with draw detection. The root position is never popped.
#[derive(Debug, Clone)]
pub struct Game {
    boards: Vec<Board>,
    moves: Vec<Move>,
}

impl Game {
    pub fn new(root: Board) -> Game {
        Game { boards: vec![root], moves: Vec::new() }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        // `boards` always holds the root.
        &self.boards[self.boards.len() - 1]
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.board().key()
    }

    /// Moves played since the root.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Play a legal move.
    pub fn play(&mut self, mv: Move) {
        debug_assert!(self.is_legal(mv), "illegal move {mv} in {}", self.board());
        let next = self.board().play(mv);
        self.boards.push(next);
        self.moves.push(mv);
    }

    /// Take back the last move, `None` at the root.
    pub fn undo(&mut self) -> Option<Move> {
        let mv = self.moves.pop()?;
        self.boards.pop();
        Some(mv)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot(self.moves.len())
    }

    /// Undo every move played after `snapshot` was taken.
    pub fn restore(&mut self, snapshot: GameSnapshot) {
        self.moves.truncate(snapshot.0);
        self.boards.truncate(snapshot.0 + 1);
    }

    pub fn legal_moves(&self) -> MoveList {
        movegen::generate_legal_moves(self.board())
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        movegen::is_legal(self.board(), mv)
    }

    /// The current position occurred before, within the reach of the halfmove clock.
    pub fn is_repetition(&self) -> bool {
        let current = self.board();
        self.boards
            .iter()
            .rev()
            .skip(1)
            .take(current.halfmove_clock() as usize)
            .skip(1)
            .step_by(2)
            .any(|earlier| earlier.key() == current.key())
    }

    /// Repetition, the fifty-move rule, or insufficient material.
    pub fn is_draw(&self) -> bool {
        let board = self.board();
        board.halfmove_clock() >= 100 || board.is_insufficient_material() || self.is_repetition()
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new(Board::starting_position())
    }
}

impl From<Board> for Game {
    fn from(root: Board) -> Self {
        Game::new(root)
    }
}
