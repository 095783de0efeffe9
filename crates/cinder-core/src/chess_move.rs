//! Moves packed into 16 bits.

use std::fmt;

use crate::piece_kind::PieceKind;
use crate::square::Square;

const DEST_SHIFT: u32 = 6;
const PROMO_SHIFT: u32 = 12;
const KIND_SHIFT: u32 = 14;
const SQUARE_MASK: u16 = 0x3F;

/// How a move is applied to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveKind {
    Normal = 0,
    Promotion = 1,
    EnPassant = 2,
    Castling = 3,
}

/// A move in 16 bits:
///
/// ```text
/// bits  0-5   origin square
/// bits  6-11  destination square
/// bits 12-13  promotion piece (knight, bishop, rook, queen)
/// bits 14-15  MoveKind
/// ```
///
/// Castling is encoded as the king's two-square move. The all-zero value is
/// [`Move::NULL`], which no legal move can equal since origin and destination differ.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(u16);

impl Move {
    pub const NULL: Move = Move(0);

    #[inline]
    const fn pack(from: Square, to: Square, kind: MoveKind) -> Move {
        Move(from.index() as u16 | (to.index() as u16) << DEST_SHIFT | (kind as u16) << KIND_SHIFT)
    }

    #[inline]
    pub const fn new(from: Square, to: Square) -> Move {
        Move::pack(from, to, MoveKind::Normal)
    }

    /// `promo` must be a knight, bishop, rook or queen.
    #[inline]
    pub const fn new_promotion(from: Square, to: Square, promo: PieceKind) -> Move {
        debug_assert!(matches!(
            promo,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        ));
        let base = Move::pack(from, to, MoveKind::Promotion).0;
        Move(base | ((promo as u16 - PieceKind::Knight as u16) << PROMO_SHIFT))
    }

    #[inline]
    pub const fn new_en_passant(from: Square, to: Square) -> Move {
        Move::pack(from, to, MoveKind::EnPassant)
    }

    #[inline]
    pub const fn new_castle(king_from: Square, king_to: Square) -> Move {
        Move::pack(king_from, king_to, MoveKind::Castling)
    }

    /// Rebuild a move from its 16-bit encoding.
    #[inline]
    pub const fn from_bits(bits: u16) -> Move {
        Move(bits)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_index_unchecked((self.0 & SQUARE_MASK) as u8)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index_unchecked((self.0 >> DEST_SHIFT & SQUARE_MASK) as u8)
    }

    #[inline]
    pub const fn kind(self) -> MoveKind {
        match self.0 >> KIND_SHIFT {
            0 => MoveKind::Normal,
            1 => MoveKind::Promotion,
            2 => MoveKind::EnPassant,
            _ => MoveKind::Castling,
        }
    }

    /// The promoted piece, for promotions only.
    #[inline]
    pub const fn promotion(self) -> Option<PieceKind> {
        if !matches!(self.kind(), MoveKind::Promotion) {
            return None;
        }
        Some(match self.0 >> PROMO_SHIFT & 0b11 {
            0 => PieceKind::Knight,
            1 => PieceKind::Bishop,
            2 => PieceKind::Rook,
            _ => PieceKind::Queen,
        })
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Long algebraic (UCI) notation; the null move prints as `0000`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("0000");
        }
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(promo) = self.promotion() {
            write!(f, "{}", promo.fen_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self}, {:?})", self.kind())
    }
}
