//! Legal move generation: pseudo-legal generation filtered by king safety.

use crate::attacks;
use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::castle_rights::CastleSide;
use crate::chess_move::Move;
use crate::color::Color;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// Stack-allocated move buffer; 256 covers the known maximum of 218 legal moves.
pub struct MoveList {
    moves: [Move; 256],
    len: usize,
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList { moves: [Move::NULL; 256], len: 0 }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < self.moves.len());
        self.moves[self.len] = mv;
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    fn retain(&mut self, mut keep: impl FnMut(Move) -> bool) {
        let mut kept = 0;
        for i in 0..self.len {
            let mv = self.moves[i];
            if keep(mv) {
                self.moves[kept] = mv;
                kept += 1;
            }
        }
        self.len = kept;
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;
    #[inline]
    fn index(&self, index: usize) -> &Move {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

const PROMOTIONS: [PieceKind; 4] = [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

fn push_targets(list: &mut MoveList, from: Square, targets: Bitboard) {
    for to in targets {
        list.push(Move::new(from, to));
    }
}

fn push_pawn_move(list: &mut MoveList, from: Square, to: Square, color: Color) {
    if to.relative_rank(color) == 7 {
        for promo in PROMOTIONS {
            list.push(Move::new_promotion(from, to, promo));
        }
    } else {
        list.push(Move::new(from, to));
    }
}

fn gen_pawns(board: &Board, list: &mut MoveList) {
    let us = board.side_to_move();
    let them_bb = board.side(us.flip());
    let empty = !board.occupied();

    for from in board.pieces_of(us, PieceKind::Pawn) {
        let push = from.forward(us);
        if empty.contains(push) {
            push_pawn_move(list, from, push, us);
            if from.relative_rank(us) == 1 {
                let double = push.forward(us);
                if empty.contains(double) {
                    list.push(Move::new(from, double));
                }
            }
        }
        for to in attacks::pawn_attacks(us, from) & them_bb {
            push_pawn_move(list, from, to, us);
        }
        if let Some(ep) = board.en_passant() {
            if attacks::pawn_attacks(us, from).contains(ep) {
                list.push(Move::new_en_passant(from, ep));
            }
        }
    }
}

fn gen_castling(board: &Board, list: &mut MoveList) {
    let us = board.side_to_move();
    let them = us.flip();
    if board.in_check() {
        return;
    }
    for side in CastleSide::ALL {
        if !board.castling().has(us, side) || !board.can_castle_with_pieces(us, side) {
            continue;
        }
        let (king_from, king_to) = side.king_squares(us);
        let (rook_from, _) = side.rook_squares(us);
        // Everything strictly between king and rook must be empty.
        let between = attacks::segment_between(king_from, rook_from).without(rook_from);
        if (between & board.occupied()).is_nonempty() {
            continue;
        }
        // The king may not pass through an attacked square; its destination is
        // covered by the legality filter.
        let passed = attacks::segment_between(king_from, king_to).without(king_to);
        if passed.into_iter().any(|sq| board.is_attacked(sq, them)) {
            continue;
        }
        list.push(Move::new_castle(king_from, king_to));
    }
}

/// Moves obeying piece movement rules, possibly leaving the own king in check.
pub fn generate_pseudo_legal_moves(board: &Board) -> MoveList {
    let mut list = MoveList::new();
    let us = board.side_to_move();
    let targets = !board.side(us);
    let occupied = board.occupied();

    gen_pawns(board, &mut list);
    for kind in [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen, PieceKind::King] {
        for from in board.pieces_of(us, kind) {
            push_targets(&mut list, from, attacks::piece_attacks(kind, us, from, occupied) & targets);
        }
    }
    gen_castling(board, &mut list);
    list
}

/// `true` if playing the pseudo-legal `mv` leaves the mover's king safe.
#[inline]
fn keeps_king_safe(board: &Board, mv: Move) -> bool {
    let us = board.side_to_move();
    let after = board.play(mv);
    !after.is_attacked(after.king_square(us), us.flip())
}

pub fn generate_legal_moves(board: &Board) -> MoveList {
    let mut list = generate_pseudo_legal_moves(board);
    list.retain(|mv| keeps_king_safe(board, mv));
    list
}

/// `true` if `mv` is one of the legal moves of `board`. Accepts arbitrary input,
/// including moves decoded from a hash table.
pub fn is_legal(board: &Board, mv: Move) -> bool {
    !mv.is_null()
        && board.color_on(mv.from()) == Some(board.side_to_move())
        && generate_pseudo_legal_moves(board).contains(mv)
        && keeps_king_safe(board, mv)
}

/// Find the legal move written as `uci` (for example `e2e4` or `e7e8q`).
pub fn parse_uci_move(board: &Board, uci: &str) -> Option<Move> {
    generate_legal_moves(board).as_slice().iter().copied().find(|mv| mv.to_string() == uci)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::castle_rights::CastleRights;
    use crate::chess_move::MoveKind;

    fn board(fen: &str) -> Board {
        attacks::init();
        fen.parse().unwrap()
    }

    #[test]
    fn twenty_moves_from_the_start() {
        attacks::init();
        assert_eq!(generate_legal_moves(&Board::starting_position()).len(), 20);
    }

    #[test]
    fn pinned_piece_cannot_leave_the_line() {
        let b = board("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1");
        let moves = generate_legal_moves(&b);
        assert!(moves.as_slice().iter().all(|mv| mv.from() != Square::E2));
    }

    #[test]
    fn castling_requires_safe_passage() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let moves = generate_legal_moves(&b);
        assert!(moves.contains(Move::new_castle(Square::E1, Square::G1)));
        assert!(moves.contains(Move::new_castle(Square::E1, Square::C1)));

        // A rook on f8 covers f1.
        let b = board("r3kr2/8/8/8/8/8/8/R3K2R w KQq - 0 1");
        let moves = generate_legal_moves(&b);
        assert!(!moves.contains(Move::new_castle(Square::E1, Square::G1)));
        assert!(moves.contains(Move::new_castle(Square::E1, Square::C1)));
    }

    #[test]
    fn castling_skipped_when_pieces_left_home() {
        attacks::init();
        let mut b = Board::empty();
        b.put(Color::White, PieceKind::King, Square::D1);
        b.put(Color::Black, PieceKind::King, Square::E8);
        b.put(Color::White, PieceKind::Rook, Square::H1);
        b.set_state(Color::White, CastleRights::WHITE_KING, 0, 1);
        b.refresh_key();

        let moves = generate_legal_moves(&b);
        assert!(moves.as_slice().iter().all(|mv| mv.kind() != MoveKind::Castling));
        // Five king moves, ten rook moves.
        assert_eq!(moves.len(), 15);
    }

    #[test]
    fn promotions_generate_four_moves() {
        let b = board("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1");
        let promos = generate_legal_moves(&b)
            .as_slice()
            .iter()
            .filter(|mv| mv.promotion().is_some())
            .count();
        assert_eq!(promos, 4);
    }

    #[test]
    fn legality_check_rejects_garbage() {
        attacks::init();
        let b = Board::starting_position();
        assert!(is_legal(&b, Move::new(Square::G1, Square::F3)));
        assert!(!is_legal(&b, Move::NULL));
        assert!(!is_legal(&b, Move::new(Square::G8, Square::F6)));
        assert!(!is_legal(&b, Move::new(Square::E2, Square::E5)));
        assert!(!is_legal(&b, Move::new_castle(Square::E1, Square::G1)));
        assert!(!is_legal(&b, Move::from_bits(0xFFFF)));
    }

    #[test]
    fn uci_lookup() {
        attacks::init();
        let b = Board::starting_position();
        assert_eq!(parse_uci_move(&b, "e2e4"), Some(Move::new(Square::E2, Square::E4)));
        assert_eq!(parse_uci_move(&b, "e2e5"), None);
    }
}
