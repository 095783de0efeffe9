//! The chess board: piece placement, side to move, castling, en passant, move
//! counters and the incrementally maintained Zobrist key.

use std::fmt;

use crate::attacks;
use crate::bitboard::Bitboard;
use crate::castle_rights::{CastleRights, CastleSide};
use crate::chess_move::{Move, MoveKind};
use crate::color::Color;
use crate::error::BoardError;
use crate::piece_kind::PieceKind;
use crate::square::Square;
use crate::zobrist;

/// Complete position state. Boards are small and `Copy`; playing a move yields a new
/// board (copy-make).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Board {
    pieces: [Bitboard; PieceKind::COUNT],
    sides: [Bitboard; Color::COUNT],
    side_to_move: Color,
    castling: CastleRights,
    /// Only set when a pawn of the side to move can actually capture onto it.
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
    key: u64,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    /// A board with no pieces, White to move, no rights.
    pub(crate) fn empty() -> Board {
        Board {
            pieces: [Bitboard::EMPTY; PieceKind::COUNT],
            sides: [Bitboard::EMPTY; Color::COUNT],
            side_to_move: Color::White,
            castling: CastleRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            key: 0,
        }
    }

    pub fn starting_position() -> Board {
        let mut board = Board::empty();
        for (file, kind) in BACK_RANK.into_iter().enumerate() {
            let file = file as u8;
            for (color, back, pawns) in [(Color::White, 0, 1), (Color::Black, 7, 6)] {
                board.put(color, kind, Square::from_index_unchecked(back * 8 + file));
                board.put(color, PieceKind::Pawn, Square::from_index_unchecked(pawns * 8 + file));
            }
        }
        board.castling = CastleRights::ALL;
        board.key = board.compute_key();
        board
    }

    /// Add or remove a piece, keeping the key in step.
    #[inline]
    fn toggle(&mut self, color: Color, kind: PieceKind, sq: Square) {
        self.pieces[kind.index()] = self.pieces[kind.index()].toggle(sq);
        self.sides[color.index()] = self.sides[color.index()].toggle(sq);
        self.key ^= zobrist::piece_key(color, kind, sq);
    }

    /// Place a piece during setup. The key is recomputed by the caller.
    pub(crate) fn put(&mut self, color: Color, kind: PieceKind, sq: Square) {
        self.pieces[kind.index()].set(sq);
        self.sides[color.index()].set(sq);
    }

    pub(crate) fn set_state(
        &mut self,
        side_to_move: Color,
        castling: CastleRights,
        halfmove_clock: u16,
        fullmove_number: u16,
    ) {
        self.side_to_move = side_to_move;
        self.castling = castling;
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
    }

    /// Record an en-passant target if, and only if, a capture onto it is available.
    pub(crate) fn set_en_passant_if_capturable(&mut self, target: Square) {
        if let Some(old) = self.en_passant.take() {
            self.key ^= zobrist::en_passant_key(old);
        }
        let us = self.side_to_move;
        let capturers = attacks::pawn_attacks(us.flip(), target) & self.pieces_of(us, PieceKind::Pawn);
        if capturers.is_nonempty() {
            self.en_passant = Some(target);
            self.key ^= zobrist::en_passant_key(target);
        }
    }

    /// Recompute the key from scratch; equals [`Board::key`] on every reachable board.
    pub fn compute_key(&self) -> u64 {
        let mut key = 0;
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                for sq in self.pieces_of(color, kind) {
                    key ^= zobrist::piece_key(color, kind, sq);
                }
            }
        }
        if self.side_to_move == Color::Black {
            key ^= zobrist::turn_key();
        }
        if let Some(sq) = self.en_passant {
            key ^= zobrist::en_passant_key(sq);
        }
        key ^ zobrist::castling_key(self.castling)
    }

    pub(crate) fn refresh_key(&mut self) {
        self.key = self.compute_key();
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    #[inline]
    pub fn side(&self, color: Color) -> Bitboard {
        self.sides[color.index()]
    }

    #[inline]
    pub fn pieces_of(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()] & self.sides[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.sides[0] | self.sides[1]
    }

    pub fn piece_on(&self, sq: Square) -> Option<PieceKind> {
        PieceKind::ALL.into_iter().find(|&kind| self.pieces[kind.index()].contains(sq))
    }

    pub fn color_on(&self, sq: Square) -> Option<Color> {
        Color::ALL.into_iter().find(|&color| self.sides[color.index()].contains(sq))
    }

    /// Square of `color`'s king. Boards built through FEN or play always have one.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        let kings = self.pieces_of(color, PieceKind::King);
        debug_assert!(kings.count() == 1, "board without a {color:?} king");
        Square::from_index_unchecked(kings.inner().trailing_zeros() as u8 & 63)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Pieces of both colours attacking `sq` through `occupied`.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let diagonal = self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen);
        let straight = self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        (attacks::pawn_attacks(Color::White, sq) & self.pieces_of(Color::Black, PieceKind::Pawn))
            | (attacks::pawn_attacks(Color::Black, sq) & self.pieces_of(Color::White, PieceKind::Pawn))
            | (attacks::knight_attacks(sq) & self.pieces(PieceKind::Knight))
            | (attacks::king_attacks(sq) & self.pieces(PieceKind::King))
            | (attacks::bishop_attacks(sq, occupied) & diagonal)
            | (attacks::rook_attacks(sq, occupied) & straight)
    }

    #[inline]
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        (self.attackers_to(sq, self.occupied()) & self.side(by)).is_nonempty()
    }

    /// Enemy pieces giving check to the side to move.
    #[inline]
    pub fn checkers(&self) -> Bitboard {
        let us = self.side_to_move;
        self.attackers_to(self.king_square(us), self.occupied()) & self.side(us.flip())
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        self.checkers().is_nonempty()
    }

    /// Neither side has pawns, rooks or queens, and at most one minor piece is left.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.pieces(PieceKind::Pawn) | self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        let minors = self.pieces(PieceKind::Knight) | self.pieces(PieceKind::Bishop);
        heavy.is_empty() && !minors.several()
    }

    /// Play `mv`, which must be pseudo-legal for this board, and return the result.
    pub fn play(&self, mv: Move) -> Board {
        let mut next = *self;
        let us = self.side_to_move;
        let them = us.flip();
        let (from, to) = (mv.from(), mv.to());

        debug_assert!(self.piece_on(from).is_some(), "no piece on {from} for {mv}");
        let Some(moving) = self.piece_on(from) else {
            return next;
        };

        next.key ^= zobrist::castling_key(self.castling);
        if let Some(ep) = next.en_passant.take() {
            next.key ^= zobrist::en_passant_key(ep);
        }
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);

        match mv.kind() {
            MoveKind::Castling => {
                let (rook_from, rook_to) = CastleSide::from_king_dest(to).rook_squares(us);
                next.toggle(us, PieceKind::King, from);
                next.toggle(us, PieceKind::King, to);
                next.toggle(us, PieceKind::Rook, rook_from);
                next.toggle(us, PieceKind::Rook, rook_to);
            }
            MoveKind::EnPassant => {
                let captured = Square::from_index_unchecked((to.index() as i8 - us.push_offset()) as u8);
                next.toggle(them, PieceKind::Pawn, captured);
                next.toggle(us, PieceKind::Pawn, from);
                next.toggle(us, PieceKind::Pawn, to);
                next.halfmove_clock = 0;
            }
            MoveKind::Normal | MoveKind::Promotion => {
                if let Some(captured) = self.piece_on(to) {
                    next.toggle(them, captured, to);
                    next.halfmove_clock = 0;
                }
                next.toggle(us, moving, from);
                next.toggle(us, mv.promotion().unwrap_or(moving), to);
            }
        }

        if moving == PieceKind::Pawn {
            next.halfmove_clock = 0;
        }

        next.castling = self.castling.remove(CastleRights::revoked_by(from) | CastleRights::revoked_by(to));
        next.key ^= zobrist::castling_key(next.castling);

        next.side_to_move = them;
        next.key ^= zobrist::turn_key();
        if us == Color::Black {
            next.fullmove_number = next.fullmove_number.saturating_add(1);
        }

        if moving == PieceKind::Pawn && from.distance(to) == 2 && from.file() == to.file() {
            next.set_en_passant_if_capturable(from.forward(us));
        }

        next
    }

    /// King and rook of `color` stand on their home squares for castling to `side`.
    pub fn can_castle_with_pieces(&self, color: Color, side: CastleSide) -> bool {
        let (king_from, _) = side.king_squares(color);
        let (rook_from, _) = side.rook_squares(color);
        self.pieces_of(color, PieceKind::King).contains(king_from)
            && self.pieces_of(color, PieceKind::Rook).contains(rook_from)
    }

    /// Structural checks on a freshly built board.
    pub fn validate(&self) -> Result<(), BoardError> {
        for color in Color::ALL {
            let count = self.pieces_of(color, PieceKind::King).count();
            if count != 1 {
                return Err(BoardError::InvalidKingCount { color, count });
            }
        }

        if (self.pieces(PieceKind::Pawn) & (Bitboard::RANK_1 | Bitboard::RANK_8)).is_nonempty() {
            return Err(BoardError::PawnsOnBackRank);
        }

        let mut seen = Bitboard::EMPTY;
        for bb in self.pieces {
            if (seen & bb).is_nonempty() {
                return Err(BoardError::OverlappingPieces);
            }
            seen |= bb;
        }

        if (self.sides[0] & self.sides[1]).is_nonempty() {
            return Err(BoardError::InconsistentSides);
        }

        for color in Color::ALL {
            for side in CastleSide::ALL {
                if self.castling.has(color, side) && !self.can_castle_with_pieces(color, side) {
                    return Err(BoardError::CastlingWithoutPieces { color, side });
                }
            }
        }

        let them = self.side_to_move.flip();
        if self.is_attacked(self.king_square(them), self.side_to_move) {
            return Err(BoardError::OpponentInCheck);
        }

        Ok(())
    }

    /// An 8x8 diagram of the board.
    pub fn pretty(&self) -> PrettyBoard<'_> {
        PrettyBoard(self)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board(\"{self}\")")
    }
}

/// Diagram view returned by [`Board::pretty`].
pub struct PrettyBoard<'a>(&'a Board);

impl fmt::Display for PrettyBoard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let board = self.0;
        for rank in (0u8..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0u8..8 {
                let sq = Square::from_index_unchecked(rank * 8 + file);
                let c = match (board.piece_on(sq), board.color_on(sq)) {
                    (Some(kind), Some(Color::White)) => kind.fen_char().to_ascii_uppercase(),
                    (Some(kind), Some(Color::Black)) => kind.fen_char(),
                    _ => '.',
                };
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}
