//! Principal-variation reconstruction from the transposition table.

use std::ops::{Deref, DerefMut};

use cinder_core::{Game, GameSnapshot, Move};

use crate::tt::TranspositionTable;

/// What PV reconstruction needs from a board.
pub trait PvBoard {
    type Snapshot;

    fn key(&self) -> u64;
    /// Table moves may come from a colliding position; they are only played when
    /// this returns `true`.
    fn is_legal(&self, mv: Move) -> bool;
    fn play(&mut self, mv: Move);
    /// Repetition, the fifty-move rule or insufficient material.
    fn is_draw(&self) -> bool;
    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: Self::Snapshot);
}

impl PvBoard for Game {
    type Snapshot = GameSnapshot;

    fn key(&self) -> u64 {
        Game::key(self)
    }

    fn is_legal(&self, mv: Move) -> bool {
        Game::is_legal(self, mv)
    }

    fn play(&mut self, mv: Move) {
        Game::play(self, mv);
    }

    fn is_draw(&self) -> bool {
        Game::is_draw(self)
    }

    fn snapshot(&self) -> GameSnapshot {
        Game::snapshot(self)
    }

    fn restore(&mut self, snapshot: GameSnapshot) {
        Game::restore(self, snapshot);
    }
}

/// Exclusive access to a board that is put back the way it was on drop.
pub struct Rollback<'a, B: PvBoard> {
    board: &'a mut B,
    snapshot: Option<B::Snapshot>,
}

impl<'a, B: PvBoard> Rollback<'a, B> {
    pub fn new(board: &'a mut B) -> Self {
        let snapshot = Some(board.snapshot());
        Rollback { board, snapshot }
    }
}

impl<B: PvBoard> Deref for Rollback<'_, B> {
    type Target = B;
    fn deref(&self) -> &B {
        &*self.board
    }
}

impl<B: PvBoard> DerefMut for Rollback<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut *self.board
    }
}

impl<B: PvBoard> Drop for Rollback<'_, B> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.board.restore(snapshot);
        }
    }
}

impl TranspositionTable {
    /// Follow stored best moves from `board`'s position for at most `max_plies`.
    ///
    /// The walk stops on a miss, an entry without a move, a move that is illegal in
    /// the explored position, or a move leading to a drawn position; the latter
    /// also cuts repetition cycles short. `board` is left as it was.
    pub fn get_pv<B: PvBoard>(&self, board: &mut B, max_plies: usize) -> Vec<Move> {
        let mut explore = Rollback::new(board);
        let mut pv = Vec::new();

        while pv.len() < max_plies {
            let Some(entry) = self.probe(explore.key()) else {
                break;
            };
            if entry.mv.is_null() || !explore.is_legal(entry.mv) {
                break;
            }
            explore.play(entry.mv);
            if explore.is_draw() {
                break;
            }
            pv.push(entry.mv);
        }

        pv
    }
}
